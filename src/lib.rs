pub mod commands;
pub mod modules;

pub use modules::blocker::{BlockReason, EvaluatedRule};
pub use modules::catalog::Catalog;
pub use modules::cleaner::models::{CleanItemResult, CleanReport, CleanStatus};
pub use modules::common::config::EngineConfig;
pub use modules::common::error::SweepError;
pub use modules::common::utils;
pub use modules::engine::{CommandError, Engine, ScanCache};
pub use modules::platform::{Platform, ProcessSnapshot, SystemPlatform};
pub use modules::reporter::models::{CleanSummary, SummaryBucket};
pub use modules::scanner::models::{ScanResult, ScanStatus};
