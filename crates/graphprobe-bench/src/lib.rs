//! Directory propagation benchmark.
//!
//! Creates an administrative unit and two groups in a Microsoft Graph tenant
//! and measures, for each group, how long the directory takes to serve it
//! from a read-after-write lookup.
//!
//! ```no_run
//! use graphprobe_bench::{BenchContext, BenchmarkRun, RunPlan};
//! use graphprobe_core::config::GraphEndpointConfig;
//! use graphprobe_directory::GraphClient;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = GraphClient::builder(GraphEndpointConfig::new("contoso.onmicrosoft.com")?)
//!     .with_access_token("eyJ0eXAi...")
//!     .build()?;
//! let ctx = BenchContext::new(Arc::new(client));
//! let report = BenchmarkRun::new(&ctx, RunPlan::default()).execute().await?;
//! for m in &report.measurements {
//!     println!("{}: {:?}", m.scenario, m.visibility_latency);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod probe;
pub mod provisioner;
pub mod scenario;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{BenchConfig, ConfigError, CredentialSource};
pub use context::BenchContext;
pub use error::{Operation, ProbeError, ProvisionError, RunError};
pub use probe::{ConsistencyProbe, ProbeOutcome, Visibility};
pub use provisioner::{GroupSpec, Provisioned, Provisioner};
pub use scenario::{BenchmarkRun, Measurement, RunPlan, RunReport, Scenario};
