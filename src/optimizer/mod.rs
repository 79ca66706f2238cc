pub mod monitor;
mod optimizer;
mod worker;

pub use monitor::{Monitor, NullMonitor};
pub use optimizer::{AllSolutionsRow, OptimizerConfig, RunSummary, MAX_SHUTDOWN_WAIT};
pub use optimizer::Optimizer;
