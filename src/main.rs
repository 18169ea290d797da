use anyhow::Result;
use sunat_ruc_query::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 命令行参数：一个或多个 RUC
    let rucs: Vec<String> = std::env::args().skip(1).collect();
    if rucs.is_empty() {
        eprintln!("用法: sunat_ruc_query <RUC>...");
        std::process::exit(2);
    }

    // 加载配置
    let config = Config::load()?;

    let mut app = App::initialize(config).await?;
    app.run(&rucs).await?;

    Ok(())
}
