//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量查询
//! - 管理应用生命周期（初始化、运行）
//! - 持有浏览器资源（Browser、CdpDriver）
//! - 逐个查询 RUC 并输出全局统计
//!
//! ### `query_processor` - 单个 RUC 查询
//! - 校验 RUC
//! - 为每次尝试创建 `QuerySession`
//! - 错误兜底：记录日志后返回无结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<RUC>)
//!     ↓
//! query_processor (处理单个 RUC)
//!     ↓
//! workflow::QueryFlow (一次完整查询)
//!     ↓
//! services (能力层：captcha / form / extract / extended)
//!     ↓
//! infrastructure (基础设施：CdpDriver、JsExecutor)
//! ```

pub mod batch_processor;
pub mod query_processor;

pub use batch_processor::App;
pub use query_processor::QueryProcessor;
