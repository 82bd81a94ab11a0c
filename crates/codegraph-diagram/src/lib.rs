pub mod repairer;
pub mod subgraph;
pub mod validator;

pub use repairer::repair;
pub use subgraph::{correct_diagram, produce_diagram, DiagramOutcome, DiagramState};
pub use validator::{has_errors, validate, Finding, FindingKind, Severity};
