pub mod ocr_client;
pub mod portal_client;

pub use ocr_client::{OcrEngine, TesseractOcr};
pub use portal_client::{HttpFetcher, PortalHttpClient};
