pub mod catalog;
pub mod detect;
pub mod driver;
pub mod flow;
pub mod provider;
pub mod report;
pub mod runner;
pub mod utils;
pub mod verify;

// Re-export common items
pub use catalog::ScenarioCatalog;
pub use report::generate_report;
pub use runner::{RunOptions, Runner, SuiteKind};
