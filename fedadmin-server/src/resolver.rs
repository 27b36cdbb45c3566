//! Tablet lookup across clusters
//!
//! Scans every tablet of the selected clusters (one branch per cluster, a
//! plain sequential scan within each) and collects the matches. Lookups that
//! need a single answer then tell "nothing matched" apart from "too many
//! matched".

use crate::cluster::Cluster;
use crate::context::RequestContext;
use crate::error::{AdminError, Result};
use crate::fanout::{FailurePolicy, FanOut};
use fedadmin_common::{Tablet, TabletType};
use std::sync::Arc;

/// Every tablet across `clusters` for which `predicate` holds
pub async fn find_tablets<P>(
    ctx: &RequestContext,
    policy: FailurePolicy,
    clusters: Vec<Arc<Cluster>>,
    predicate: P,
) -> Result<Vec<Tablet>>
where
    P: Fn(&Tablet) -> bool + Send + Sync + 'static,
{
    let predicate = Arc::new(predicate);

    FanOut::new(ctx, policy)
        .run(clusters, move |cluster, ctx| {
            let predicate = predicate.clone();
            async move {
                let tablets = cluster.get_tablets(&ctx).await?;
                Ok(tablets.into_iter().filter(|t| (*predicate)(t)).collect())
            }
        })
        .await
}

/// Exactly one match, or a not-found / ambiguous failure naming the search scope
pub fn resolve_unique(mut matches: Vec<Tablet>, target: &str, searched: &[String]) -> Result<Tablet> {
    match matches.len() {
        0 => Err(AdminError::NoTablet {
            target: target.to_string(),
            searched: searched.to_vec(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(AdminError::AmbiguousTablet {
            target: target.to_string(),
            matches: n,
            searched: searched.to_vec(),
        }),
    }
}

/// Any one match, for lookups where every match is equally good
pub fn resolve_any(matches: Vec<Tablet>, target: &str, searched: &[String]) -> Result<Tablet> {
    matches.into_iter().next().ok_or_else(|| AdminError::NoTablet {
        target: target.to_string(),
        searched: searched.to_vec(),
    })
}

/// The unique tablet matching `predicate` across `clusters`
pub async fn find_tablet<P>(
    ctx: &RequestContext,
    policy: FailurePolicy,
    clusters: Vec<Arc<Cluster>>,
    searched: &[String],
    target: &str,
    predicate: P,
) -> Result<Tablet>
where
    P: Fn(&Tablet) -> bool + Send + Sync + 'static,
{
    let matches = find_tablets(ctx, policy, clusters, predicate).await?;
    resolve_unique(matches, target, searched)
}

pub fn by_hostname(hostname: &str) -> impl Fn(&Tablet) -> bool + Send + Sync + 'static {
    let hostname = hostname.to_string();
    move |t: &Tablet| t.hostname == hostname
}

/// A serving, non-primary tablet of `keyspace` that is in the serving graph
pub fn serving_replica_of(keyspace: &str) -> impl Fn(&Tablet) -> bool + Send + Sync + 'static {
    let keyspace = keyspace.to_string();
    move |t: &Tablet| {
        t.keyspace == keyspace
            && t.tablet_type.is_in_serving_graph()
            && t.tablet_type != TabletType::Primary
            && t.is_serving()
    }
}
