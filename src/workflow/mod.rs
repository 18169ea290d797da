pub mod query_flow;
pub mod query_session;

pub use query_flow::{QueryFlow, RESULT_FRAME_XPATH};
pub use query_session::QuerySession;
