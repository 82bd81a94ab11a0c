pub mod extractors;
pub mod scanner;

pub use extractors::extract_all;
pub use scanner::{scan_repository, ScanResult};
