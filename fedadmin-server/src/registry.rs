//! The configured set of clusters
//!
//! Built once at startup and never mutated, so it is shared by plain `Arc`
//! across every request without locking.

use crate::cluster::Cluster;
use crate::error::{AdminError, Result};
use fedadmin_common::ClusterRef;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct ClusterSet {
    /// Sorted by id.
    clusters: Vec<Arc<Cluster>>,
    by_id: HashMap<String, Arc<Cluster>>,
}

impl ClusterSet {
    /// Fails if two clusters share an id
    pub fn new(clusters: Vec<Cluster>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(clusters.len());
        let mut sorted = Vec::with_capacity(clusters.len());

        for cluster in clusters {
            let cluster = Arc::new(cluster);
            if by_id.insert(cluster.id.clone(), cluster.clone()).is_some() {
                return Err(AdminError::DuplicateCluster(cluster.id.clone()));
            }
            sorted.push(cluster);
        }

        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            clusters: sorted,
            by_id,
        })
    }

    pub fn clusters(&self) -> &[Arc<Cluster>] {
        &self.clusters
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Cluster>> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn refs(&self) -> Vec<ClusterRef> {
        self.clusters.iter().map(|c| c.to_ref()).collect()
    }

    /// Working set for a request's cluster filter
    ///
    /// An empty filter selects every cluster. Otherwise clusters come back in
    /// the order requested and unknown ids are dropped. The returned ids are
    /// the search scope to report in diagnostics: every known id for an empty
    /// filter, the filter itself otherwise.
    pub fn resolve(&self, ids: &[String]) -> (Vec<Arc<Cluster>>, Vec<String>) {
        if ids.is_empty() {
            let all_ids = self.clusters.iter().map(|c| c.id.clone()).collect();
            return (self.clusters.clone(), all_ids);
        }

        let clusters = ids
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect();

        (clusters, ids.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureClient, Topology};

    fn cluster(id: &str) -> Cluster {
        FixtureClient::new(Topology::default()).into_cluster(id, format!("{id}-name"))
    }

    fn ids(clusters: &[Arc<Cluster>]) -> Vec<&str> {
        clusters.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_id() {
        let set = ClusterSet::new(vec![cluster("c3"), cluster("c1"), cluster("c2")])
            .expect("unique ids");

        assert_eq!(ids(set.clusters()), vec!["c1", "c2", "c3"]);
        assert_eq!(set.refs()[0].name, "c1-name");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = ClusterSet::new(vec![cluster("c1"), cluster("c1")]).unwrap_err();
        assert!(matches!(err, AdminError::DuplicateCluster(id) if id == "c1"));
    }

    #[test]
    fn test_resolve_empty_filter_selects_all() {
        let set = ClusterSet::new(vec![cluster("b"), cluster("a")]).expect("unique ids");

        let (clusters, scope) = set.resolve(&[]);
        assert_eq!(ids(&clusters), vec!["a", "b"]);
        assert_eq!(scope, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_resolve_preserves_request_order_and_drops_unknown() {
        let set =
            ClusterSet::new(vec![cluster("a"), cluster("b"), cluster("c")]).expect("unique ids");

        let filter = vec!["c".to_string(), "nope".to_string(), "a".to_string()];
        let (clusters, scope) = set.resolve(&filter);

        assert_eq!(ids(&clusters), vec!["c", "a"]);
        assert_eq!(scope, filter);
    }

    #[test]
    fn test_resolve_only_unknown_ids_is_empty() {
        let set = ClusterSet::new(vec![cluster("a")]).expect("unique ids");

        let (clusters, scope) = set.resolve(&["x".to_string(), "y".to_string()]);
        assert!(clusters.is_empty());
        assert_eq!(scope.len(), 2);
    }
}
