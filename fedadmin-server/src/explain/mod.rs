//! Explain-request assembly
//!
//! The explain engine needs three artifacts about one keyspace: the table DDL
//! from a serving replica, the keyspace's serving vschema and its shard map.
//! They come from three independent remote calls, run concurrently, each into
//! its own slot, and the engine only starts once all three have landed.

mod scatter;

pub use scatter::ScatterExplainEngine;

use crate::cluster::Cluster;
use crate::context::RequestContext;
use crate::error::{AdminError, Result};
use crate::fanout::{ErrorRecorder, FailurePolicy, FanOut};
use fedadmin_common::{KeyspaceShard, Shard, SrvVSchema, TableDefinition, Tablet, TabletAlias};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("invalid vschema: {0}")]
    VSchema(String),

    #[error("invalid shard map: {0}")]
    ShardMap(String),

    #[error("keyspace {0} has no shards")]
    NoShards(String),

    #[error("no SQL statements to explain")]
    EmptySql,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplicationMode {
    #[default]
    Row,
    Statement,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainOptions {
    pub replication_mode: ReplicationMode,
}

/// One query as it would be sent to one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardQuery {
    pub target: KeyspaceShard,
    pub sql: String,
}

/// The routing plan for one input statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub sql: String,
    pub queries: Vec<ShardQuery>,
}

/// A query planner that can be primed with one keyspace's metadata
pub trait ExplainEngine: Send + Sync {
    fn init(
        &self,
        vschema: &str,
        schema: &str,
        shard_map: &str,
        options: &ExplainOptions,
    ) -> std::result::Result<Box<dyn ExplainSession>, ExplainError>;
}

pub trait ExplainSession: Send {
    fn run(&mut self, sql: &str) -> std::result::Result<Vec<Plan>, ExplainError>;

    fn render(&self, plans: &[Plan]) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub cluster: String,
    pub keyspace: String,
    pub sql: String,
}

impl ExplainRequest {
    pub fn new(
        cluster: impl Into<String>,
        keyspace: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            keyspace: keyspace.into(),
            sql: sql.into(),
        }
    }

    /// Reports each missing field as its own failure
    pub fn validate(&self) -> Result<()> {
        let errors = ErrorRecorder::new();

        if self.cluster.trim().is_empty() {
            errors.record(AdminError::InvalidRequest("cluster ID is required".to_string()));
        }
        if self.keyspace.trim().is_empty() {
            errors.record(AdminError::InvalidRequest("keyspace name is required".to_string()));
        }
        if self.sql.trim().is_empty() {
            errors.record(AdminError::InvalidRequest("SQL query is required".to_string()));
        }

        errors.finish()
    }
}

/// Serialized engine inputs for one keyspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainInputs {
    pub vschema: String,
    pub schema: String,
    pub shard_map: String,
}

/// Table DDL in the order given, joined by `;`
pub fn schema_text(table_definitions: &[TableDefinition]) -> String {
    table_definitions
        .iter()
        .map(|td| td.schema.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

/// `{"<keyspace>": <vschema>}` for the one keyspace
pub fn keyspace_vschema_json(keyspace: &str, srv: &SrvVSchema) -> Result<String> {
    let vschema = srv
        .keyspaces
        .get(keyspace)
        .ok_or_else(|| AdminError::NoSrvVSchema {
            keyspace: keyspace.to_string(),
        })?;

    wrap_keyspace(keyspace, &serde_json::to_string(vschema)?)
}

/// `{"<keyspace>": {"<shard>": <shard record>, ...}}`
pub fn shard_map_json(keyspace: &str, shards: &[Shard]) -> Result<String> {
    let by_name: BTreeMap<&str, _> = shards
        .iter()
        .map(|s| (s.name.as_str(), &s.shard))
        .collect();

    wrap_keyspace(keyspace, &serde_json::to_string(&by_name)?)
}

fn wrap_keyspace(keyspace: &str, body: &str) -> Result<String> {
    Ok(format!("{{{}: {}}}", serde_json::to_string(keyspace)?, body))
}

async fn fetch_schema_text(
    ctx: &RequestContext,
    cluster: &Cluster,
    alias: &TabletAlias,
) -> Result<String> {
    let schema = cluster.get_schema(ctx, alias).await?;
    Ok(schema
        .map(|s| schema_text(&s.table_definitions))
        .unwrap_or_default())
}

async fn fetch_vschema(
    ctx: &RequestContext,
    cluster: &Cluster,
    cell: &str,
    keyspace: &str,
) -> Result<String> {
    let srv = cluster.get_srv_vschema(ctx, cell).await?;
    keyspace_vschema_json(keyspace, &srv)
}

async fn fetch_shard_map(ctx: &RequestContext, cluster: &Cluster, keyspace: &str) -> Result<String> {
    let shards = cluster.find_all_shards_in_keyspace(ctx, keyspace).await?;
    shard_map_json(keyspace, &shards)
}

/// Fetch the three engine inputs for `keyspace`, reading through `tablet`
///
/// All three fetches run to completion (or to cancellation, under
/// [`FailurePolicy::FailFast`]) before any failure is reported.
pub async fn fetch_inputs(
    ctx: &RequestContext,
    policy: FailurePolicy,
    cluster: &Cluster,
    tablet: &Tablet,
    keyspace: &str,
) -> Result<ExplainInputs> {
    cluster.dial(ctx).await?;

    let fan = FanOut::new(ctx, policy);
    let scope = fan.context().clone();

    let (schema, vschema, shard_map) = tokio::join!(
        fan.branch(fetch_schema_text(&scope, cluster, &tablet.alias)),
        fan.branch(fetch_vschema(&scope, cluster, &tablet.alias.cell, keyspace)),
        fan.branch(fetch_shard_map(&scope, cluster, keyspace)),
    );

    fan.finish()?;

    match (schema, vschema, shard_map) {
        (Some(schema), Some(vschema), Some(shard_map)) => Ok(ExplainInputs {
            vschema,
            schema,
            shard_map,
        }),
        _ => Err(AdminError::Task(
            "explain inputs incomplete without a recorded failure".to_string(),
        )),
    }
}

/// Prime `engine` with `inputs`, plan `sql` and render the plans as text
pub fn explain(
    engine: &dyn ExplainEngine,
    inputs: &ExplainInputs,
    sql: &str,
    options: &ExplainOptions,
) -> Result<String> {
    let mut session = engine.init(&inputs.vschema, &inputs.schema, &inputs.shard_map, options)?;
    let plans = session.run(sql)?;
    Ok(session.render(&plans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use fedadmin_common::{ShardRecord, TabletAlias};
    use serde_json::json;

    #[test]
    fn test_validate_reports_each_missing_field() {
        let err = ExplainRequest::new("c1", "commerce", "").validate().unwrap_err();
        assert!(matches!(err, AdminError::InvalidRequest(ref m) if m == "SQL query is required"));

        let err = ExplainRequest::new("", "", "select 1").validate().unwrap_err();
        match err {
            AdminError::Aggregate(agg) => {
                assert_eq!(agg.len(), 2);
                assert_eq!(agg.kind(), ErrorKind::InvalidRequest);
                assert!(agg.to_string().contains("cluster ID is required"));
                assert!(agg.to_string().contains("keyspace name is required"));
            }
            other => panic!("expected one failure per field, got {other:?}"),
        }

        assert!(ExplainRequest::new("c1", "commerce", "select 1").validate().is_ok());
    }

    #[test]
    fn test_schema_text_joins_in_order() {
        let defs = vec![
            TableDefinition {
                name: "b".to_string(),
                schema: "CREATE TABLE b (id INT)".to_string(),
                ..Default::default()
            },
            TableDefinition {
                name: "a".to_string(),
                schema: "CREATE TABLE a (id INT)".to_string(),
                ..Default::default()
            },
        ];

        assert_eq!(
            schema_text(&defs),
            "CREATE TABLE b (id INT);CREATE TABLE a (id INT)"
        );
        assert_eq!(schema_text(&[]), "");
    }

    #[test]
    fn test_vschema_wrapped_under_keyspace() {
        let mut srv = SrvVSchema::default();
        srv.keyspaces
            .insert("commerce".to_string(), json!({"sharded": true}));

        let out = keyspace_vschema_json("commerce", &srv).expect("present");
        assert_eq!(out, r#"{"commerce": {"sharded":true}}"#);

        let err = keyspace_vschema_json("customer", &srv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArtifact);
        assert!(err.to_string().contains("customer"));
    }

    #[test]
    fn test_shard_map_keyed_by_shard_name() {
        let shards = vec![
            Shard {
                keyspace: "commerce".to_string(),
                name: "80-".to_string(),
                shard: ShardRecord {
                    is_primary_serving: true,
                    ..Default::default()
                },
            },
            Shard {
                keyspace: "commerce".to_string(),
                name: "-80".to_string(),
                shard: ShardRecord {
                    primary_alias: Some(TabletAlias::new("zone1", 100)),
                    ..Default::default()
                },
            },
        ];

        let out = shard_map_json("commerce", &shards).expect("serializes");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("valid json");

        assert_eq!(parsed["commerce"]["80-"]["is_primary_serving"], true);
        assert_eq!(parsed["commerce"]["-80"]["primary_alias"]["uid"], 100);
        assert!(out.starts_with(r#"{"commerce": {"-80":"#));
    }
}
