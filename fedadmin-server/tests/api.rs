use fedadmin_server::{
    AdminError, Api, ApiOptions, ClusterSet, ErrorKind, ExplainRequest, FailurePolicy,
    FixtureClient, RequestContext, ScatterExplainEngine, Topology,
};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    api: Api,
    fixtures: Vec<(String, Arc<FixtureClient>)>,
}

impl Harness {
    fn new(clusters: Vec<(&str, Topology)>) -> Self {
        Self::with_policy(clusters, FailurePolicy::RunToCompletion)
    }

    fn with_policy(clusters: Vec<(&str, Topology)>, failure_policy: FailurePolicy) -> Self {
        let fixtures: Vec<(String, Arc<FixtureClient>)> = clusters
            .into_iter()
            .map(|(id, topology)| (id.to_string(), Arc::new(FixtureClient::new(topology))))
            .collect();

        let set = ClusterSet::new(
            fixtures
                .iter()
                .map(|(id, fixture)| fixture.shared_cluster(id.clone(), format!("{id}-name")))
                .collect(),
        )
        .expect("unique ids");

        let options = ApiOptions {
            failure_policy,
            ..Default::default()
        };
        let api = Api::new(set, Arc::new(ScatterExplainEngine::new()), options).expect("api");

        Self { api, fixtures }
    }

    fn fixture(&self, id: &str) -> &FixtureClient {
        self.fixtures
            .iter()
            .find(|(fid, _)| fid == id)
            .map(|(_, f)| f.as_ref())
            .expect("known fixture")
    }

    fn total_calls(&self) -> usize {
        self.fixtures.iter().map(|(_, f)| f.total_calls()).sum()
    }
}

fn topology(value: serde_json::Value) -> Topology {
    serde_json::from_value(value).expect("valid topology")
}

/// One keyspace with two tables, a sharded vschema and a serving replica
fn commerce() -> Topology {
    topology(json!({
        "keyspaces": [{"name": "commerce"}],
        "shards": [
            {"keyspace": "commerce", "name": "-80", "shard": {"is_primary_serving": true}},
            {"keyspace": "commerce", "name": "80-", "shard": {"is_primary_serving": true}}
        ],
        "tablets": [
            {
                "alias": {"cell": "zone1", "uid": 100},
                "hostname": "commerce-primary",
                "keyspace": "commerce",
                "shard": "-80",
                "tablet_type": "PRIMARY",
                "state": "SERVING"
            },
            {
                "alias": {"cell": "zone1", "uid": 101},
                "hostname": "commerce-replica",
                "keyspace": "commerce",
                "shard": "-80",
                "tablet_type": "REPLICA",
                "state": "SERVING"
            }
        ],
        "schemas": {
            "zone1-0000000100": {
                "table_definitions": [
                    {"name": "customer", "schema": "CREATE TABLE customer (id BIGINT)"},
                    {"name": "corder", "schema": "CREATE TABLE corder (id BIGINT)"}
                ]
            },
            "zone1-0000000101": {
                "table_definitions": [
                    {"name": "customer", "schema": "CREATE TABLE customer (id BIGINT)"},
                    {"name": "corder", "schema": "CREATE TABLE corder (id BIGINT)"}
                ]
            }
        },
        "srv_vschemas": {
            "zone1": {"keyspaces": {"commerce": {"sharded": true}}}
        },
        "gates": [{"cell": "zone1", "hostname": "gate-a"}]
    }))
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_schemas_and_keyspaces_skip_empty_cluster() {
    let harness = Harness::new(vec![("a", commerce()), ("b", Topology::default())]);
    let ctx = RequestContext::new();

    let schemas = harness.api.get_schemas(&ctx, &[]).await.expect("schemas");
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].cluster.id, "a");
    assert_eq!(schemas[0].keyspace, "commerce");
    assert_eq!(schemas[0].table_definitions.len(), 2);

    let keyspaces = harness.api.get_keyspaces(&ctx, &[]).await.expect("keyspaces");
    assert_eq!(keyspaces.len(), 1);
    assert_eq!(keyspaces[0].cluster.id, "a");
    assert_eq!(keyspaces[0].keyspace.name, "commerce");
    assert_eq!(keyspaces[0].shards.len(), 2);
}

#[tokio::test]
async fn test_unknown_cluster_ids_make_no_calls() {
    let harness = Harness::new(vec![("a", commerce()), ("b", commerce())]);
    let ctx = RequestContext::new();
    let filter = ids(&["x", "y"]);

    assert!(harness.api.get_gates(&ctx, &filter).await.expect("gates").is_empty());
    assert!(harness.api.get_tablets(&ctx, &filter).await.expect("tablets").is_empty());
    assert!(harness.api.get_schemas(&ctx, &filter).await.expect("schemas").is_empty());
    assert!(harness.api.get_keyspaces(&ctx, &filter).await.expect("keyspaces").is_empty());
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn test_cluster_filter_selects_subset() {
    let harness = Harness::new(vec![("a", commerce()), ("b", commerce())]);

    let gates = harness
        .api
        .get_gates(&RequestContext::new(), &ids(&["b", "nope"]))
        .await
        .expect("gates");

    assert_eq!(gates.len(), 1);
    assert_eq!(gates[0].cluster.id, "b");
    assert_eq!(gates[0].cluster.name, "b-name");
    assert_eq!(harness.fixture("a").total_calls(), 0);
}

#[tokio::test]
async fn test_one_branch_failure_discards_everything() {
    let mut broken = commerce();
    broken.fail.insert("get_tablets".to_string());

    let harness = Harness::new(vec![("a", commerce()), ("b", broken)]);
    let err = harness
        .api
        .get_tablets(&RequestContext::new(), &[])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(matches!(err, AdminError::Remote { ref cluster, .. } if cluster == "b"));
    // The healthy cluster still ran to completion.
    assert_eq!(harness.fixture("a").completed("get_tablets"), 1);
}

#[tokio::test]
async fn test_every_failure_reported() {
    let mut broken_a = commerce();
    broken_a.fail.insert("discover_gates".to_string());
    let mut broken_b = commerce();
    broken_b.fail.insert("discover_gates".to_string());

    let harness = Harness::new(vec![("a", broken_a), ("b", broken_b)]);
    let err = harness
        .api
        .get_gates(&RequestContext::new(), &[])
        .await
        .unwrap_err();

    match err {
        AdminError::Aggregate(agg) => {
            assert_eq!(agg.len(), 2);
            assert_eq!(agg.kind(), ErrorKind::Remote);
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
    assert_eq!(harness.api.metrics().failures("get_gates", "remote"), 1);
}

#[tokio::test]
async fn test_repeated_reads_are_set_equal() {
    let harness = Harness::new(vec![("a", commerce()), ("b", commerce())]);
    let ctx = RequestContext::new();

    let sorted = |mut tablets: Vec<fedadmin_common::Tablet>| {
        tablets.sort_by(|x, y| (&x.cluster.id, &x.alias).cmp(&(&y.cluster.id, &y.alias)));
        tablets
    };

    let first = sorted(harness.api.get_tablets(&ctx, &[]).await.expect("tablets"));
    let second = sorted(harness.api.get_tablets(&ctx, &[]).await.expect("tablets"));

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert_eq!(harness.api.metrics().requests("get_tablets"), 2);
}

#[tokio::test]
async fn test_get_tablet_by_hostname() {
    let harness = Harness::new(vec![("a", commerce()), ("b", commerce())]);
    let ctx = RequestContext::new();

    let tablet = harness
        .api
        .get_tablet(&ctx, "commerce-replica", &ids(&["b"]))
        .await
        .expect("unique in b");
    assert_eq!(tablet.cluster.id, "b");
    assert_eq!(tablet.alias.uid, 101);

    let err = harness
        .api
        .get_tablet(&ctx, "commerce-replica", &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ambiguous);

    let err = harness
        .api
        .get_tablet(&ctx, "nowhere", &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains(r#"searched clusters = ["a", "b"]"#));
}

#[tokio::test]
async fn test_explain_plans_against_serving_replica() {
    let harness = Harness::new(vec![("a", commerce())]);

    let plan = harness
        .api
        .vtexplain(
            &RequestContext::new(),
            &ExplainRequest::new("a", "commerce", "select * from customer"),
        )
        .await
        .expect("plan");

    assert!(plan.contains("1 commerce/-80: select * from customer"));
    assert!(plan.contains("1 commerce/80-: select * from customer"));

    let fixture = harness.fixture("a");
    assert_eq!(fixture.calls("get_schema"), 1);
    assert_eq!(fixture.calls("get_srv_vschema"), 1);
    assert_eq!(fixture.calls("find_all_shards_in_keyspace"), 1);
}

#[tokio::test]
async fn test_explain_empty_sql_makes_no_calls() {
    let harness = Harness::new(vec![("a", commerce())]);

    let err = harness
        .api
        .vtexplain(&RequestContext::new(), &ExplainRequest::new("a", "commerce", ""))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.to_string().contains("SQL query is required"));
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn test_explain_unknown_cluster() {
    let harness = Harness::new(vec![("a", commerce())]);

    let err = harness
        .api
        .vtexplain(&RequestContext::new(), &ExplainRequest::new("z", "commerce", "select 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::UnsupportedCluster(ref id) if id == "z"));
    assert_eq!(harness.total_calls(), 0);
}

#[tokio::test]
async fn test_explain_without_serving_replica() {
    let harness = Harness::new(vec![("a", commerce())]);

    let err = harness
        .api
        .vtexplain(&RequestContext::new(), &ExplainRequest::new("a", "customer", "select 1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(harness.fixture("a").calls("get_schema"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_explain_missing_vschema_waits_for_siblings() {
    let mut topology = commerce();
    topology.srv_vschemas = serde_json::from_value(json!({
        "zone1": {"keyspaces": {"customer": {}}}
    }))
    .expect("valid srv vschemas");
    topology.latency_ms = 50;

    let harness = Harness::new(vec![("a", topology)]);
    let err = harness
        .api
        .vtexplain(&RequestContext::new(), &ExplainRequest::new("a", "commerce", "select 1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingArtifact);
    assert!(err.to_string().contains("commerce"));

    let fixture = harness.fixture("a");
    assert_eq!(fixture.completed("get_schema"), 1);
    assert_eq!(fixture.completed("find_all_shards_in_keyspace"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fail_fast_stops_slow_siblings() {
    let mut broken = commerce();
    broken.fail.insert("get_tablets".to_string());
    let mut slow = commerce();
    slow.latency_ms = 60_000;

    let harness = Harness::with_policy(
        vec![("a", broken), ("b", slow)],
        FailurePolicy::FailFast,
    );
    let err = harness
        .api
        .get_tablets(&RequestContext::new(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::Remote { ref cluster, .. } if cluster == "a"));
    assert_eq!(harness.fixture("b").completed("get_tablets"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_reaches_remote_calls() {
    let mut slow = commerce();
    slow.latency_ms = 60_000;

    let harness = Harness::new(vec![("a", slow)]);
    let ctx = RequestContext::with_timeout(std::time::Duration::from_secs(1));

    let err = harness.api.get_gates(&ctx, &[]).await.unwrap_err();
    assert!(matches!(err, AdminError::DeadlineExceeded));
}

#[test]
fn test_clusters_listed_in_id_order() {
    let harness = Harness::new(vec![("b", Topology::default()), ("a", Topology::default())]);

    let clusters = harness.api.get_clusters();
    let ids: Vec<&str> = clusters.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}
