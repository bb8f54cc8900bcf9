//! # roast-testing
//!
//! Support code for running lifecycle scenarios:
//!
//! - [`RoastConfig`]: run configuration from `ROAST_*` variables and an
//!   optional TOML file
//! - [`SuiteContext`]: what one suite's scenarios share (clients, waits,
//!   the suite server, cleanup)
//! - [`ResourceRegistry`]: deletes created resources at teardown
//! - [`TestMeta`] / [`TagFilter`]: the scenario table and tag selection
//! - [`SimulatedCompute`]: an in-memory control plane for running scenarios
//!   without a deployment
//! - [`init_tracing`]: subscriber setup

mod config;
mod context;
mod logging;
mod meta;
mod registry;
mod simulated;

pub use config::{ConfigError, RoastConfig, CONFIG_PATH_ENV, ENV_PREFIX};
pub use context::{DynProbe, Services, SetupError, SuiteContext};
pub use logging::{init_test_tracing, init_tracing};
pub use meta::{Category, NetworkRequirement, TagError, TagFilter, TestMeta};
pub use registry::{CleanupReport, ResourceRegistry};
pub use simulated::{SimulatedCompute, DEFAULT_SETTLE};
