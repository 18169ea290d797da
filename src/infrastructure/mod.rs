pub mod cdp_driver;
pub mod js_executor;

pub use cdp_driver::{CdpDriver, CdpElement};
pub use js_executor::JsExecutor;
