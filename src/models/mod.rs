pub mod ciiu;
pub mod extended;
pub mod taxpayer;

pub use ciiu::{reconcile_codes, ClassificationCode};
pub use extended::{DebtRecord, ExtendedAction, ExtendedInfo, ExtendedRecord, OmissionRecord};
pub use taxpayer::{BasicRecord, TaxpayerId, TaxpayerRecord};
