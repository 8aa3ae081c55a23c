pub mod catalog;
pub mod config;
pub mod dupes;
pub mod engine;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod plan;
pub mod reporter;
pub mod sanitize;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{AppConfig, OutputFormat};
pub use engine::{PlanMode, PlanResult, RenameEngine};
pub use error::{Error, OperationError, SanitizationError};
pub use executor::{ExecuteOptions, ExecutionSummary, OperationResult};
pub use plan::{PlanOptions, PlannedOperation, RenamePlan};
pub use reporter::{Reporter, SilentReporter, TracingReporter};
