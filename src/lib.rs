//! # SUNAT RUC Query
//!
//! 通过 SUNAT 网站查询秘鲁纳税人（RUC）信息的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 和截图
//! - `CdpDriver` - 基于 `JsExecutor` 实现 `BrowserDriver`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ruc_validator` - RUC 校验位
//! - `CaptchaSolver` - 截图裁剪 + OCR
//! - `FormSubmitter` - 填写并提交查询表单
//! - `ResultExtractor` - 解析结果页，合并 CIIU
//! - `ExtendedInfoClient` - HTTP 查询欠款和申报遗漏
//!
//! ### ③ 流程层（Workflow）
//! - `QuerySession` - 一次查询独占的浏览器会话
//! - `QueryFlow` - 一个 RUC 的完整查询流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/query_processor` - 校验、会话管理和错误兜底
//! - `orchestrator/batch_processor` - 批量查询，管理浏览器资源

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{QueryError, Result};
pub use infrastructure::{CdpDriver, JsExecutor};
pub use models::{TaxpayerId, TaxpayerRecord};
pub use orchestrator::{App, QueryProcessor};
pub use workflow::{QueryFlow, QuerySession};
