pub mod captcha_solver;
pub mod extended_info;
pub mod form_submitter;
pub mod result_extractor;
pub mod ruc_validator;

pub use captcha_solver::CaptchaSolver;
pub use extended_info::{parse_extended_page, ExtendedInfoClient};
pub use form_submitter::{find_search_frame, FormSubmitter, QueryMode};
pub use result_extractor::ResultExtractor;
