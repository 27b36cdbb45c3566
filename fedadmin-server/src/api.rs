//! The aggregation API
//!
//! Every operation takes an optional cluster-id filter, fans out across the
//! selected clusters and returns either the merged result or one error.

use crate::cluster::Cluster;
use crate::context::RequestContext;
use crate::error::{AdminError, Result};
use crate::explain::{self, ExplainEngine, ExplainOptions, ExplainRequest};
use crate::fanout::{FailurePolicy, FanOut};
use crate::metrics::ApiMetrics;
use crate::registry::ClusterSet;
use crate::resolver;
use crate::schema;
use fedadmin_common::{ClusterRef, Gate, Keyspace, KeyspaceInfo, Schema, Tablet};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    pub failure_policy: FailurePolicy,
    pub explain: ExplainOptions,
}

pub struct Api {
    clusters: Arc<ClusterSet>,
    explain: Arc<dyn ExplainEngine>,
    options: ApiOptions,
    metrics: ApiMetrics,
}

impl Api {
    pub fn new(
        clusters: ClusterSet,
        explain: Arc<dyn ExplainEngine>,
        options: ApiOptions,
    ) -> Result<Self> {
        Ok(Self {
            clusters: Arc::new(clusters),
            explain,
            options,
            metrics: ApiMetrics::new()?,
        })
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    pub fn options(&self) -> &ApiOptions {
        &self.options
    }

    pub fn metrics(&self) -> &ApiMetrics {
        &self.metrics
    }

    async fn observed<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let result = fut.await;
        self.metrics.observe(operation, started.elapsed(), &result);

        match &result {
            Ok(_) => debug!(operation, elapsed = ?started.elapsed(), "request complete"),
            Err(err) => info!(operation, kind = %err.kind(), error = %err, "request failed"),
        }

        result
    }

    fn fan_out(&self, ctx: &RequestContext) -> FanOut {
        FanOut::new(ctx, self.options.failure_policy)
    }

    /// Every configured cluster, ordered by id
    pub fn get_clusters(&self) -> Vec<ClusterRef> {
        let started = Instant::now();
        let clusters = self.clusters.refs();
        self.metrics
            .observe("get_clusters", started.elapsed(), &Ok::<_, AdminError>(()));
        clusters
    }

    #[instrument(skip(self, ctx))]
    pub async fn get_gates(&self, ctx: &RequestContext, cluster_ids: &[String]) -> Result<Vec<Gate>> {
        let (clusters, _) = self.clusters.resolve(cluster_ids);

        self.observed(
            "get_gates",
            self.fan_out(ctx).run(clusters, |cluster, ctx| async move {
                cluster.discover_gates(&ctx, &[]).await
            }),
        )
        .await
    }

    /// Keyspaces with their shards, one nested fan-out per cluster
    #[instrument(skip(self, ctx))]
    pub async fn get_keyspaces(
        &self,
        ctx: &RequestContext,
        cluster_ids: &[String],
    ) -> Result<Vec<Keyspace>> {
        let (clusters, _) = self.clusters.resolve(cluster_ids);
        let policy = self.options.failure_policy;

        self.observed(
            "get_keyspaces",
            self.fan_out(ctx).run(clusters, move |cluster, ctx| async move {
                get_cluster_keyspaces(&ctx, policy, cluster).await
            }),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn get_schemas(&self, ctx: &RequestContext, cluster_ids: &[String]) -> Result<Vec<Schema>> {
        let (clusters, _) = self.clusters.resolve(cluster_ids);
        let policy = self.options.failure_policy;

        self.observed(
            "get_schemas",
            self.fan_out(ctx).run(clusters, move |cluster, ctx| async move {
                let tablets = cluster.get_tablets(&ctx).await?;
                schema::get_schemas(&ctx, policy, cluster, Arc::new(tablets)).await
            }),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn get_tablets(&self, ctx: &RequestContext, cluster_ids: &[String]) -> Result<Vec<Tablet>> {
        let (clusters, _) = self.clusters.resolve(cluster_ids);

        self.observed(
            "get_tablets",
            self.fan_out(ctx).run(clusters, |cluster, ctx| async move {
                cluster.get_tablets(&ctx).await
            }),
        )
        .await
    }

    /// The one tablet with `hostname`, which must be unique across the
    /// selected clusters
    #[instrument(skip(self, ctx))]
    pub async fn get_tablet(
        &self,
        ctx: &RequestContext,
        hostname: &str,
        cluster_ids: &[String],
    ) -> Result<Tablet> {
        let (clusters, searched) = self.clusters.resolve(cluster_ids);

        self.observed(
            "get_tablet",
            resolver::find_tablet(
                ctx,
                self.options.failure_policy,
                clusters,
                &searched,
                hostname,
                resolver::by_hostname(hostname),
            ),
        )
        .await
    }

    /// Plan `request.sql` against one keyspace of one cluster
    #[instrument(skip(self, ctx, request), fields(cluster = %request.cluster, keyspace = %request.keyspace))]
    pub async fn vtexplain(&self, ctx: &RequestContext, request: &ExplainRequest) -> Result<String> {
        self.observed("vtexplain", self.explain_request(ctx, request))
            .await
    }

    async fn explain_request(&self, ctx: &RequestContext, request: &ExplainRequest) -> Result<String> {
        request.validate()?;

        let cluster = self
            .clusters
            .get(&request.cluster)
            .cloned()
            .ok_or_else(|| AdminError::UnsupportedCluster(request.cluster.clone()))?;

        let searched = vec![cluster.id.clone()];
        let matches = resolver::find_tablets(
            ctx,
            self.options.failure_policy,
            vec![cluster.clone()],
            resolver::serving_replica_of(&request.keyspace),
        )
        .await?;
        let tablet = resolver::resolve_any(matches, &request.keyspace, &searched)?;

        debug!(tablet = %tablet.alias, "reading explain inputs");

        let inputs = explain::fetch_inputs(
            ctx,
            self.options.failure_policy,
            &cluster,
            &tablet,
            &request.keyspace,
        )
        .await?;

        explain::explain(
            self.explain.as_ref(),
            &inputs,
            &request.sql,
            &self.options.explain,
        )
    }
}

async fn get_cluster_keyspaces(
    ctx: &RequestContext,
    policy: FailurePolicy,
    cluster: Arc<Cluster>,
) -> Result<Vec<Keyspace>> {
    cluster.dial(ctx).await?;
    let keyspaces = cluster.get_keyspaces(ctx).await?;

    debug!(cluster = %cluster.id, keyspaces = keyspaces.len(), "fetching shards");

    FanOut::new(ctx, policy)
        .run(keyspaces, move |keyspace: KeyspaceInfo, ctx| {
            let cluster = cluster.clone();
            async move {
                let shards = cluster
                    .find_all_shards_in_keyspace(&ctx, &keyspace.name)
                    .await?;

                Ok(vec![Keyspace {
                    cluster: cluster.to_ref(),
                    keyspace,
                    shards,
                }])
            }
        })
        .await
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("clusters", &self.clusters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
