//! In-memory cluster backend
//!
//! Serves a fixed [`Topology`], typically loaded from a YAML file, through both
//! client traits. Operations can be made to fail or to take a while, and every
//! call is counted, which makes it the backend of choice for tests and for
//! running the CLI without live clusters.

use crate::client::{ClientError, ControlClient, DiscoveryClient};
use crate::cluster::Cluster;
use crate::context::RequestContext;
use async_trait::async_trait;
use fedadmin_common::{
    Gate, KeyspaceInfo, SchemaDefinition, Shard, SrvVSchema, Tablet, TabletAlias,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything one cluster knows about itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub gates: Vec<Gate>,
    pub keyspaces: Vec<KeyspaceInfo>,
    pub shards: Vec<Shard>,
    pub tablets: Vec<Tablet>,
    /// Keyed by tablet alias in `cell-uid` form.
    pub schemas: BTreeMap<String, SchemaDefinition>,
    /// Keyed by cell.
    pub srv_vschemas: BTreeMap<String, SrvVSchema>,
    /// Operation names that fail with a transport error.
    pub fail: BTreeSet<String>,
    /// Delay added to every call.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct Counters {
    started: BTreeMap<&'static str, usize>,
    completed: BTreeMap<&'static str, usize>,
}

#[derive(Debug)]
pub struct FixtureClient {
    topology: Topology,
    counters: Mutex<Counters>,
}

impl FixtureClient {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// A cluster backed solely by this client
    pub fn into_cluster(self, id: impl Into<String>, name: impl Into<String>) -> Cluster {
        Arc::new(self).shared_cluster(id, name)
    }

    /// A cluster backed by this client, keeping the handle for inspection
    pub fn shared_cluster(self: &Arc<Self>, id: impl Into<String>, name: impl Into<String>) -> Cluster {
        Cluster::new(id, name, self.clone(), self.clone())
    }

    /// Calls to `op` that have started
    pub fn calls(&self, op: &str) -> usize {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.started.get(op).copied().unwrap_or(0)
    }

    /// Calls to `op` that ran to the end, successfully or not
    pub fn completed(&self, op: &str) -> usize {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.completed.get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.started.values().sum()
    }

    async fn enter(&self, op: &'static str) -> Result<(), ClientError> {
        {
            let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
            *counters.started.entry(op).or_default() += 1;
        }

        if self.topology.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.topology.latency_ms)).await;
        }

        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        *counters.completed.entry(op).or_default() += 1;

        if self.topology.fail.contains(op) {
            return Err(ClientError::Transport(format!("{op}: injected failure")));
        }

        Ok(())
    }
}

#[async_trait]
impl DiscoveryClient for FixtureClient {
    async fn discover_gates(
        &self,
        _ctx: &RequestContext,
        cells: &[String],
    ) -> Result<Vec<Gate>, ClientError> {
        self.enter("discover_gates").await?;

        Ok(self
            .topology
            .gates
            .iter()
            .filter(|g| cells.is_empty() || cells.contains(&g.cell))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ControlClient for FixtureClient {
    async fn dial(&self, _ctx: &RequestContext) -> Result<(), ClientError> {
        self.enter("dial").await
    }

    async fn get_keyspaces(&self, _ctx: &RequestContext) -> Result<Vec<KeyspaceInfo>, ClientError> {
        self.enter("get_keyspaces").await?;
        Ok(self.topology.keyspaces.clone())
    }

    async fn find_all_shards_in_keyspace(
        &self,
        _ctx: &RequestContext,
        keyspace: &str,
    ) -> Result<Vec<Shard>, ClientError> {
        self.enter("find_all_shards_in_keyspace").await?;

        Ok(self
            .topology
            .shards
            .iter()
            .filter(|s| s.keyspace == keyspace)
            .cloned()
            .collect())
    }

    async fn get_schema(
        &self,
        _ctx: &RequestContext,
        alias: &TabletAlias,
    ) -> Result<Option<SchemaDefinition>, ClientError> {
        self.enter("get_schema").await?;
        Ok(self.topology.schemas.get(&alias.to_string()).cloned())
    }

    async fn get_srv_vschema(
        &self,
        _ctx: &RequestContext,
        cell: &str,
    ) -> Result<SrvVSchema, ClientError> {
        self.enter("get_srv_vschema").await?;

        self.topology
            .srv_vschemas
            .get(cell)
            .cloned()
            .ok_or_else(|| ClientError::remote("NOT_FOUND", format!("no SrvVSchema for cell {cell}")))
    }

    async fn get_tablets(&self, _ctx: &RequestContext) -> Result<Vec<Tablet>, ClientError> {
        self.enter("get_tablets").await?;
        Ok(self.topology.tablets.clone())
    }
}
