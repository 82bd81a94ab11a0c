pub mod ports;
pub mod runner;
pub mod service;

pub use ports::{InMemoryStore, PersistenceStore, StoreError};
pub use service::{AnalysisService, StartOutcome};
