//! Federation core for fedadmin
//!
//! Responsibilities:
//! - Hold the configured set of backend clusters
//! - Fan one logical request out across clusters (and keyspaces within them)
//! - Merge partial results, or fail the whole request with every cause
//! - Resolve tablets across clusters and assemble explain-plan inputs

pub mod api;
pub mod client;
pub mod cluster;
pub mod context;
pub mod error;
pub mod explain;
pub mod fanout;
pub mod fixture;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use api::{Api, ApiOptions};
pub use client::{ClientError, ControlClient, DiscoveryClient};
pub use cluster::Cluster;
pub use context::RequestContext;
pub use error::{AdminError, AggregateError, ErrorKind, Result};
pub use explain::{
    ExplainEngine, ExplainError, ExplainOptions, ExplainRequest, ExplainSession, Plan,
    ReplicationMode, ScatterExplainEngine,
};
pub use fanout::{ErrorRecorder, FailurePolicy, FanOut};
pub use fixture::{FixtureClient, Topology};
pub use metrics::ApiMetrics;
pub use registry::ClusterSet;
