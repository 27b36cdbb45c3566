use crate::client::ClientError;
use crate::explain::ExplainError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported cluster: {0}")]
    UnsupportedCluster(String),

    #[error("no tablet found: {target}, searched clusters = {searched:?}")]
    NoTablet {
        target: String,
        searched: Vec<String>,
    },

    #[error("multiple tablets found: {target} ({matches} matches), searched clusters = {searched:?}")]
    AmbiguousTablet {
        target: String,
        matches: usize,
        searched: Vec<String>,
    },

    #[error("no serving vschema found: keyspace {keyspace}")]
    NoSrvVSchema { keyspace: String },

    #[error("cluster {cluster}: {op} failed: {source}")]
    Remote {
        cluster: String,
        op: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("{0}")]
    Aggregate(AggregateError),

    #[error("explain failed: {0}")]
    Explain(#[from] ExplainError),

    #[error("duplicate cluster id: {0}")]
    DuplicateCluster(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("task failed: {0}")]
    Task(String),
}

/// Coarse classification of an [`AdminError`], for callers that branch on the
/// failure rather than its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    UnsupportedCluster,
    NotFound,
    Ambiguous,
    MissingArtifact,
    Remote,
    Cancelled,
    /// Several failures of different kinds
    Aggregate,
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::UnsupportedCluster => "unsupported_cluster",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Ambiguous => "ambiguous",
            ErrorKind::MissingArtifact => "missing_artifact",
            ErrorKind::Remote => "remote",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Aggregate => "aggregate",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            AdminError::UnsupportedCluster(_) => ErrorKind::UnsupportedCluster,
            AdminError::NoTablet { .. } => ErrorKind::NotFound,
            AdminError::AmbiguousTablet { .. } => ErrorKind::Ambiguous,
            AdminError::NoSrvVSchema { .. } => ErrorKind::MissingArtifact,
            AdminError::Remote { .. } => ErrorKind::Remote,
            AdminError::Aggregate(agg) => agg.kind(),
            AdminError::Cancelled | AdminError::DeadlineExceeded => ErrorKind::Cancelled,
            AdminError::Explain(_)
            | AdminError::DuplicateCluster(_)
            | AdminError::Serialization(_)
            | AdminError::Metrics(_)
            | AdminError::Task(_) => ErrorKind::Internal,
        }
    }
}

/// Every failure collected from the branches of one fan-out, in the order recorded
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<AdminError>,
}

impl AggregateError {
    pub fn new(errors: Vec<AdminError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[AdminError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<AdminError> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The shared kind when every cause agrees, otherwise [`ErrorKind::Aggregate`]
    pub fn kind(&self) -> ErrorKind {
        let mut kinds = self.errors.iter().map(AdminError::kind);
        match kinds.next() {
            Some(first) if kinds.all(|k| k == first) => first,
            _ => ErrorKind::Aggregate,
        }
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

pub type Result<T> = std::result::Result<T, AdminError>;
