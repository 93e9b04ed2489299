//! Vigil Actions
//!
//! The orchestration layer. [`ValidationActions`] ties the validation
//! catalog, the execution logs and a [`vigil_runner::ValidationRunner`]
//! together:
//!
//! - listing and showing validations, groups and parameters
//! - running validations: select, apply the skip list, execute each
//!   playbook in order, then read the results back from the logs
//! - history and task status queries over past executions
//!
//! Run progress is reported through a [`RunNotifier`].

mod actions;
mod error;
mod events;
mod rows;
mod run;
mod skip;

pub use actions::{ActionsConfig, ParameterFormat, ValidationActions};
pub use error::{RunError, ShowError};
pub use events::{ChannelNotifier, NoopNotifier, RunEvent, RunNotifier};
pub use rows::{GroupInfoRow, ValidationDetails, ValidationParameters, ValidationRow};
pub use run::{ExecutionRecord, RunOptions, RunReport};
pub use skip::{SkipDecision, skip_playbook};
