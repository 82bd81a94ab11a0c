pub mod builder;
pub mod classifier;
pub mod folders;

pub use builder::{build_graph, top_n};
pub use classifier::classify;
pub use folders::folder_diagram;
