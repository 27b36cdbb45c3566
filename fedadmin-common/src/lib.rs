//! Shared topology types for fedadmin
//!
//! This crate defines the data that crosses every boundary of the system:
//! - what remote cluster clients return (gates, keyspaces, shards, tablets, schemas)
//! - what the federation core hands back to callers, stamped with the owning cluster
//!
//! Aggregated values carry a detached [`ClusterRef`] rather than a handle to the
//! cluster itself, so a response outlives the tasks that produced it.

mod tablet;

pub use tablet::{ParseError, ServingState, TabletAlias, TabletType};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identity of a cluster, copied into every aggregated value
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterRef {
    pub id: String,
    pub name: String,
}

/// A query gateway reported by a cluster's discovery endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gate {
    pub cell: String,
    pub hostname: String,
    pub keyspaces: Vec<String>,
    pub pool: String,
    /// Left empty by discovery clients; filled in during aggregation.
    pub cluster: ClusterRef,
}

/// Keyspace descriptor as returned by a control-plane client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyspaceInfo {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sharding_column_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sharding_column_type: String,
}

/// Half-open keyspace-id range covered by a shard, hex encoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

/// Topology record for one shard; this is what the shard map serializes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardRecord {
    pub primary_alias: Option<TabletAlias>,
    pub key_range: Option<KeyRange>,
    pub is_primary_serving: bool,
}

/// A shard within a keyspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shard {
    pub keyspace: String,
    pub name: String,
    pub shard: ShardRecord,
}

impl Shard {
    pub fn keyspace_shard(&self) -> KeyspaceShard {
        KeyspaceShard {
            keyspace: self.keyspace.clone(),
            shard: self.name.clone(),
        }
    }
}

/// A keyspace together with its shards, owned by one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    pub cluster: ClusterRef,
    pub keyspace: KeyspaceInfo,
    pub shards: Vec<Shard>,
}

/// A tablet as seen by the control plane
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tablet {
    /// Left empty by control-plane clients; filled in during aggregation.
    pub cluster: ClusterRef,
    pub alias: TabletAlias,
    pub hostname: String,
    pub keyspace: String,
    pub shard: String,
    pub tablet_type: TabletType,
    pub state: ServingState,
}

impl Tablet {
    pub fn is_serving(&self) -> bool {
        self.state == ServingState::Serving
    }
}

/// One table's definition within a tablet schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDefinition {
    pub name: String,
    /// The CREATE statement for the table.
    pub schema: String,
    pub columns: Vec<String>,
    pub primary_key_columns: Vec<String>,
    #[serde(rename = "type")]
    pub table_type: String,
    pub data_length: u64,
    pub row_count: u64,
}

/// Full schema reported by a single tablet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    pub database_schema: String,
    pub table_definitions: Vec<TableDefinition>,
}

/// Aggregated schema for one keyspace of one cluster
///
/// Only built when the keyspace has at least one table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub cluster: ClusterRef,
    pub keyspace: String,
    pub table_definitions: Vec<TableDefinition>,
}

/// Serving-graph vschema for one cell
///
/// Per-keyspace vschemas are kept as raw JSON: the core never interprets them,
/// it only re-serializes one keyspace for the explain engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrvVSchema {
    pub keyspaces: BTreeMap<String, serde_json::Value>,
}

/// `<keyspace>/<shard>` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyspaceShard {
    pub keyspace: String,
    pub shard: String,
}

impl fmt::Display for KeyspaceShard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.keyspace, self.shard)
    }
}

impl FromStr for KeyspaceShard {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((keyspace, shard))
                if !keyspace.is_empty() && !shard.is_empty() && !shard.contains('/') =>
            {
                Ok(Self {
                    keyspace: keyspace.to_string(),
                    shard: shard.to_string(),
                })
            }
            _ => Err(ParseError::KeyspaceShard(s.to_string())),
        }
    }
}
