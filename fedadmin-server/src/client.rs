//! Remote cluster client traits
//!
//! Every cluster exposes two endpoints: a discovery service that knows about
//! query gateways, and a control-plane service that knows about keyspaces,
//! shards, tablets and schemas. Transport is not this crate's concern; any
//! implementation of these traits can back a [`Cluster`](crate::Cluster).

use crate::context::RequestContext;
use async_trait::async_trait;
use fedadmin_common::{Gate, KeyspaceInfo, SchemaDefinition, Shard, SrvVSchema, Tablet, TabletAlias};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("dial failed: {0}")]
    Dial(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{code}: {message}")]
    Remote { code: String, message: String },
}

impl ClientError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    /// List gates, restricted to `cells` unless it is empty
    async fn discover_gates(
        &self,
        ctx: &RequestContext,
        cells: &[String],
    ) -> Result<Vec<Gate>, ClientError>;
}

#[async_trait]
pub trait ControlClient: Send + Sync {
    /// Establish (or confirm) the connection; cheap when already connected
    async fn dial(&self, ctx: &RequestContext) -> Result<(), ClientError>;

    async fn get_keyspaces(&self, ctx: &RequestContext) -> Result<Vec<KeyspaceInfo>, ClientError>;

    async fn find_all_shards_in_keyspace(
        &self,
        ctx: &RequestContext,
        keyspace: &str,
    ) -> Result<Vec<Shard>, ClientError>;

    /// `None` when the tablet reports no schema at all
    async fn get_schema(
        &self,
        ctx: &RequestContext,
        alias: &TabletAlias,
    ) -> Result<Option<SchemaDefinition>, ClientError>;

    async fn get_srv_vschema(
        &self,
        ctx: &RequestContext,
        cell: &str,
    ) -> Result<SrvVSchema, ClientError>;

    async fn get_tablets(&self, ctx: &RequestContext) -> Result<Vec<Tablet>, ClientError>;
}
