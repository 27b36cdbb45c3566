//! Tablet identity and state

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid tablet alias {0:?}, expected <cell>-<uid>")]
    TabletAlias(String),

    #[error("invalid keyspace/shard {0:?}, expected <keyspace>/<shard>")]
    KeyspaceShard(String),
}

/// Globally unique tablet name: the cell it lives in plus a numeric id
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabletAlias {
    pub cell: String,
    pub uid: u32,
}

impl TabletAlias {
    pub fn new(cell: impl Into<String>, uid: u32) -> Self {
        Self {
            cell: cell.into(),
            uid,
        }
    }
}

impl fmt::Display for TabletAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:010}", self.cell, self.uid)
    }
}

impl FromStr for TabletAlias {
    type Err = ParseError;

    /// Cells may themselves contain dashes, so the uid is whatever follows the last one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cell, uid) = s
            .rsplit_once('-')
            .ok_or_else(|| ParseError::TabletAlias(s.to_string()))?;

        if cell.is_empty() {
            return Err(ParseError::TabletAlias(s.to_string()));
        }

        let uid = uid
            .parse::<u32>()
            .map_err(|_| ParseError::TabletAlias(s.to_string()))?;

        Ok(Self::new(cell, uid))
    }
}

/// Role a tablet plays in its shard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TabletType {
    #[default]
    Unknown,
    Primary,
    Replica,
    Rdonly,
    Spare,
    Experimental,
    Backup,
    Restore,
    Drained,
}

impl TabletType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TabletType::Unknown => "UNKNOWN",
            TabletType::Primary => "PRIMARY",
            TabletType::Replica => "REPLICA",
            TabletType::Rdonly => "RDONLY",
            TabletType::Spare => "SPARE",
            TabletType::Experimental => "EXPERIMENTAL",
            TabletType::Backup => "BACKUP",
            TabletType::Restore => "RESTORE",
            TabletType::Drained => "DRAINED",
        }
    }

    /// Whether tablets of this type receive query traffic
    pub const fn is_in_serving_graph(&self) -> bool {
        matches!(
            self,
            TabletType::Primary | TabletType::Replica | TabletType::Rdonly
        )
    }
}

impl fmt::Display for TabletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serving state as reported alongside a tablet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingState {
    #[default]
    Unknown,
    Serving,
    NotServing,
}

impl ServingState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServingState::Unknown => "UNKNOWN",
            ServingState::Serving => "SERVING",
            ServingState::NotServing => "NOT_SERVING",
        }
    }
}

impl fmt::Display for ServingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
