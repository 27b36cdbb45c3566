use crate::client::{ClientError, ControlClient, DiscoveryClient};
use crate::context::RequestContext;
use crate::error::{AdminError, Result};
use fedadmin_common::{
    ClusterRef, Gate, KeyspaceInfo, SchemaDefinition, Shard, SrvVSchema, Tablet, TabletAlias,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// One backend cluster: its identity plus the clients used to reach it
///
/// Immutable once built. Every remote call goes through the methods here so
/// that failures are tagged with the cluster and operation, and so that the
/// request's cancellation scope wraps the call even if the client ignores it.
pub struct Cluster {
    pub id: String,
    pub name: String,
    discovery: Arc<dyn DiscoveryClient>,
    vtctld: Arc<dyn ControlClient>,
}

impl Cluster {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        discovery: Arc<dyn DiscoveryClient>,
        vtctld: Arc<dyn ControlClient>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            discovery,
            vtctld,
        }
    }

    pub fn to_ref(&self) -> ClusterRef {
        ClusterRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    async fn call<T, F>(&self, ctx: &RequestContext, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ClientError>>,
    {
        debug!(cluster = %self.id, op, "remote call");

        ctx.run(async {
            fut.await.map_err(|source| AdminError::Remote {
                cluster: self.id.clone(),
                op,
                source,
            })
        })
        .await
    }

    pub async fn dial(&self, ctx: &RequestContext) -> Result<()> {
        self.call(ctx, "dial", self.vtctld.dial(ctx)).await
    }

    /// Gates stamped with this cluster's identity
    pub async fn discover_gates(&self, ctx: &RequestContext, cells: &[String]) -> Result<Vec<Gate>> {
        let mut gates = self
            .call(ctx, "discover_gates", self.discovery.discover_gates(ctx, cells))
            .await?;

        let cluster = self.to_ref();
        for gate in &mut gates {
            gate.cluster = cluster.clone();
        }

        Ok(gates)
    }

    pub async fn get_keyspaces(&self, ctx: &RequestContext) -> Result<Vec<KeyspaceInfo>> {
        self.call(ctx, "get_keyspaces", self.vtctld.get_keyspaces(ctx))
            .await
    }

    pub async fn find_all_shards_in_keyspace(
        &self,
        ctx: &RequestContext,
        keyspace: &str,
    ) -> Result<Vec<Shard>> {
        self.call(
            ctx,
            "find_all_shards_in_keyspace",
            self.vtctld.find_all_shards_in_keyspace(ctx, keyspace),
        )
        .await
    }

    pub async fn get_schema(
        &self,
        ctx: &RequestContext,
        alias: &TabletAlias,
    ) -> Result<Option<SchemaDefinition>> {
        self.call(ctx, "get_schema", self.vtctld.get_schema(ctx, alias))
            .await
    }

    pub async fn get_srv_vschema(&self, ctx: &RequestContext, cell: &str) -> Result<SrvVSchema> {
        self.call(ctx, "get_srv_vschema", self.vtctld.get_srv_vschema(ctx, cell))
            .await
    }

    /// All tablets of the cluster, stamped with this cluster's identity
    ///
    /// Dials first, since tablets come from the control plane.
    pub async fn get_tablets(&self, ctx: &RequestContext) -> Result<Vec<Tablet>> {
        self.dial(ctx).await?;

        let mut tablets = self
            .call(ctx, "get_tablets", self.vtctld.get_tablets(ctx))
            .await?;

        let cluster = self.to_ref();
        for tablet in &mut tablets {
            tablet.cluster = cluster.clone();
        }

        Ok(tablets)
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
