/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时默认 info，`verbose` 为 true 时为 debug。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `total`: 待查询的 RUC 数量
/// - `portal_url`: 查询入口
pub fn log_startup(total: usize, portal_url: &str) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 RUC 查询启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📋 待查询: {} 个 RUC", total);
    info!("🌐 查询入口: {}", portal_url);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `found`: 查询成功数量
/// - `not_found`: 无结果数量
/// - `rejected`: RUC 校验未通过数量
pub fn print_final_stats(found: usize, not_found: usize, rejected: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 查询完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", found);
    info!("⚠️ 无结果: {}", not_found);
    info!("❌ RUC 无效: {}", rejected);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
