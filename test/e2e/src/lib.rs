//! # roast-e2e
//!
//! Compute lifecycle scenarios.
//!
//! Scenarios are plain async functions over a [`roast_testing::SuiteContext`];
//! [`catalog`] lists them with their tags and [`run`] executes a selection
//! sequentially, one suite at a time.
//!
//! | suite | scenario | type | net |
//! |---|---|---|---|
//! | pause | `pause_unpause_server` | smoke | no |
//! | suspend | `suspend_resume_server` | smoke | yes |
//! | suspend-negative | `suspend_reboot_hard_server` | smoke | yes |
//! | stacktach | `launch_entry_on_create_server_response` and three more | smoke | no |

mod catalog;
mod error;
mod runner;

pub mod pause;
pub mod stacktach;
pub mod suspend;

pub use catalog::{catalog, find, select, Scenario, ScenarioFn};
pub use error::ScenarioError;
pub use runner::{run, Outcome, RunOptions, RunReport};
