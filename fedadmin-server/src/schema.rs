//! Per-cluster schema discovery
//!
//! Lists a cluster's keyspaces, then fetches each keyspace's schema from one
//! of its serving tablets, in parallel. Keyspaces without a serving tablet and
//! keyspaces whose schema has no tables are left out of the result.

use crate::cluster::Cluster;
use crate::context::RequestContext;
use crate::error::Result;
use crate::fanout::{FailurePolicy, FanOut};
use fedadmin_common::{KeyspaceInfo, Schema, Tablet};
use std::sync::Arc;
use tracing::debug;

/// The serving tablet to read a keyspace's schema from
///
/// When several tablets qualify, the last one in `tablets` wins.
pub fn select_serving_tablet<'a>(tablets: &'a [Tablet], keyspace: &str) -> Option<&'a Tablet> {
    tablets
        .iter()
        .rev()
        .find(|t| t.keyspace == keyspace && t.is_serving())
}

/// All non-empty keyspace schemas of one cluster
///
/// `tablets` is the cluster's tablet list, fetched once by the caller and
/// shared by every keyspace branch.
pub async fn get_schemas(
    ctx: &RequestContext,
    policy: FailurePolicy,
    cluster: Arc<Cluster>,
    tablets: Arc<Vec<Tablet>>,
) -> Result<Vec<Schema>> {
    cluster.dial(ctx).await?;
    let keyspaces = cluster.get_keyspaces(ctx).await?;

    debug!(cluster = %cluster.id, keyspaces = keyspaces.len(), "fetching keyspace schemas");

    FanOut::new(ctx, policy)
        .run(keyspaces, move |keyspace, ctx| {
            let cluster = cluster.clone();
            let tablets = tablets.clone();
            async move {
                let schema = get_schema_for_keyspace(&ctx, &cluster, &keyspace, &tablets).await?;
                Ok(schema.into_iter().collect())
            }
        })
        .await
}

/// `Ok(None)` when the keyspace has nothing to report
pub async fn get_schema_for_keyspace(
    ctx: &RequestContext,
    cluster: &Cluster,
    keyspace: &KeyspaceInfo,
    tablets: &[Tablet],
) -> Result<Option<Schema>> {
    let Some(tablet) = select_serving_tablet(tablets, &keyspace.name) else {
        debug!(cluster = %cluster.id, keyspace = %keyspace.name, "no serving tablet, skipping");
        return Ok(None);
    };

    cluster.dial(ctx).await?;

    let table_definitions = match cluster.get_schema(ctx, &tablet.alias).await? {
        Some(schema) if !schema.table_definitions.is_empty() => schema.table_definitions,
        _ => {
            debug!(cluster = %cluster.id, keyspace = %keyspace.name, "empty schema, skipping");
            return Ok(None);
        }
    };

    Ok(Some(Schema {
        cluster: cluster.to_ref(),
        keyspace: keyspace.name.clone(),
        table_definitions,
    }))
}
