//! Built-in explain engine
//!
//! Plans by shard routing alone: in a sharded keyspace every statement
//! scatters to all shards, otherwise it goes to the keyspace's single shard.
//! Output follows the familiar vtexplain layout, one block per statement.

use super::{ExplainEngine, ExplainError, ExplainOptions, ExplainSession, Plan, ShardQuery};
use fedadmin_common::KeyspaceShard;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterExplainEngine;

impl ScatterExplainEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ExplainEngine for ScatterExplainEngine {
    fn init(
        &self,
        vschema: &str,
        schema: &str,
        shard_map: &str,
        options: &ExplainOptions,
    ) -> Result<Box<dyn ExplainSession>, ExplainError> {
        let vschemas: BTreeMap<String, Value> =
            serde_json::from_str(vschema).map_err(|e| ExplainError::VSchema(e.to_string()))?;
        let shard_maps: BTreeMap<String, BTreeMap<String, Value>> =
            serde_json::from_str(shard_map).map_err(|e| ExplainError::ShardMap(e.to_string()))?;

        let (keyspace, keyspace_vschema) = vschemas
            .into_iter()
            .next()
            .ok_or_else(|| ExplainError::VSchema("no keyspace".to_string()))?;

        let sharded = keyspace_vschema
            .get("sharded")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let shards: Vec<String> = shard_maps
            .get(&keyspace)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        if shards.is_empty() {
            return Err(ExplainError::NoShards(keyspace));
        }

        let tables = schema
            .split(';')
            .filter(|ddl| !ddl.trim().is_empty())
            .count();

        debug!(
            %keyspace,
            sharded,
            shards = shards.len(),
            tables,
            replication_mode = ?options.replication_mode,
            "explain session ready"
        );

        Ok(Box::new(ScatterSession {
            keyspace,
            sharded,
            shards,
        }))
    }
}

struct ScatterSession {
    keyspace: String,
    sharded: bool,
    /// Ordered by name, which for hex key ranges is key order.
    shards: Vec<String>,
}

impl ScatterSession {
    fn targets(&self) -> &[String] {
        if self.sharded {
            &self.shards
        } else {
            &self.shards[..1]
        }
    }
}

impl ExplainSession for ScatterSession {
    fn run(&mut self, sql: &str) -> Result<Vec<Plan>, ExplainError> {
        let plans: Vec<Plan> = sql
            .split(';')
            .map(str::trim)
            .filter(|stmt| !stmt.is_empty())
            .map(|stmt| Plan {
                sql: stmt.to_string(),
                queries: self
                    .targets()
                    .iter()
                    .map(|shard| ShardQuery {
                        target: KeyspaceShard {
                            keyspace: self.keyspace.clone(),
                            shard: shard.clone(),
                        },
                        sql: stmt.to_string(),
                    })
                    .collect(),
            })
            .collect();

        if plans.is_empty() {
            return Err(ExplainError::EmptySql);
        }

        Ok(plans)
    }

    fn render(&self, plans: &[Plan]) -> String {
        let separator = "-".repeat(80);
        let mut out = String::new();

        for plan in plans {
            out.push_str(&separator);
            out.push('\n');
            out.push_str(&plan.sql);
            out.push_str("\n\n");
            for query in &plan.queries {
                out.push_str(&format!("1 {}: {}\n", query.target, query.sql));
            }
            out.push('\n');
        }
        out.push_str(&separator);
        out.push('\n');

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARD_MAP: &str = r#"{"commerce": {"-80": {}, "80-": {}}}"#;

    fn session(vschema: &str) -> Box<dyn ExplainSession> {
        ScatterExplainEngine::new()
            .init(vschema, "CREATE TABLE t (id INT)", SHARD_MAP, &ExplainOptions::default())
            .expect("session")
    }

    #[test]
    fn test_sharded_keyspace_scatters() {
        let mut session = session(r#"{"commerce": {"sharded": true}}"#);

        let plans = session.run("select * from t").expect("plans");
        assert_eq!(plans.len(), 1);

        let shards: Vec<String> = plans[0].queries.iter().map(|q| q.target.to_string()).collect();
        assert_eq!(shards, vec!["commerce/-80", "commerce/80-"]);
    }

    #[test]
    fn test_unsharded_keyspace_routes_to_one_shard() {
        let mut session = session(r#"{"commerce": {}}"#);

        let plans = session.run("select 1; select 2;").expect("plans");
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.queries.len() == 1));
        assert_eq!(plans[1].sql, "select 2");
    }

    #[test]
    fn test_render_layout() {
        let mut session = session(r#"{"commerce": {}}"#);
        let plans = session.run("select 1").expect("plans");
        let text = session.render(&plans);

        assert!(text.starts_with(&"-".repeat(80)));
        assert!(text.contains("select 1\n\n1 commerce/-80: select 1\n"));
        assert!(text.ends_with(&format!("{}\n", "-".repeat(80))));
    }

    #[test]
    fn test_empty_sql_rejected() {
        let mut session = session(r#"{"commerce": {}}"#);
        assert!(matches!(session.run(" ; ;"), Err(ExplainError::EmptySql)));
    }

    #[test]
    fn test_bad_inputs_rejected() {
        let engine = ScatterExplainEngine::new();
        let opts = ExplainOptions::default();

        assert!(matches!(
            engine.init("not json", "", SHARD_MAP, &opts),
            Err(ExplainError::VSchema(_))
        ));
        assert!(matches!(
            engine.init(r#"{"commerce": {}}"#, "", "[]", &opts),
            Err(ExplainError::ShardMap(_))
        ));
        assert!(matches!(
            engine.init(r#"{"customer": {}}"#, "", SHARD_MAP, &opts),
            Err(ExplainError::NoShards(ref ks)) if ks == "customer"
        ));
    }
}
