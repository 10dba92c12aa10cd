//! Core domain types and service traits for solrwatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the agent.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Block name under which the OS/JVM system statistics are stored.
pub const SYSTEM_BLOCK: &str = "solr";

/// The recognized Solr component kinds whose statistics are worth sampling.
///
/// The admin payload enumerates many internal components; only request
/// handlers and caches carry meaningful monitoring data, so everything
/// outside this closed set is dropped before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    SearchHandler,
    XmlUpdateHandler,
    DirectUpdateHandler,
    LruCache,
    FastLruCache,
}

impl ComponentKind {
    /// Maps a remote-supplied Java class name onto a recognized component
    /// kind. Returns `None` for every class outside the allow-list.
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        match class_name.trim() {
            "org.apache.solr.handler.component.SearchHandler" => Some(Self::SearchHandler),
            "org.apache.solr.handler.XmlUpdateRequestHandler" => Some(Self::XmlUpdateHandler),
            "org.apache.solr.update.DirectUpdateHandler2" => Some(Self::DirectUpdateHandler),
            "org.apache.solr.search.LRUCache" => Some(Self::LruCache),
            "org.apache.solr.search.FastLRUCache" => Some(Self::FastLruCache),
            _ => None,
        }
    }
}

/// A named group of related counters and gauges: one cache, one request
/// handler, or the OS/JVM environment. Created fresh on every parse and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticBlock {
    pub name: String,
    values: HashMap<String, f64>,
}

impl StatisticBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One immutable, complete sample of all statistic blocks taken at one
/// instant. At most one block per name; on a name collision the last
/// parsed block wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    blocks: HashMap<String, StatisticBlock>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a block under its own name, replacing any earlier block of
    /// the same name within this snapshot.
    pub fn insert(&mut self, block: StatisticBlock) {
        self.blocks.insert(block.name.clone(), block);
    }

    pub fn block(&self, name: &str) -> Option<&StatisticBlock> {
        self.blocks.get(name)
    }

    /// Looks up a single named value, reporting which lookup missed.
    pub fn lookup(&self, block: &str, key: &str, generation: Generation) -> Result<f64, AgentError> {
        let stat = self.blocks.get(block).ok_or_else(|| AgentError::MissingBlock {
            block: block.to_string(),
            generation,
        })?;
        stat.value(key).ok_or_else(|| AgentError::MissingValue {
            block: block.to_string(),
            key: key.to_string(),
            generation,
        })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Identifies which of the two cached snapshot generations a lookup
/// targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Previous,
    Current,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Previous => write!(f, "previous"),
            Generation::Current => write!(f, "current"),
        }
    }
}

/// Error taxonomy for sampling and metric evaluation.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Connection refused, DNS failure, timeout. Not retried internally;
    /// the next evaluation retries naturally because the refresh time is
    /// not advanced on failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The primary statistics payload could not be decoded.
    #[error("failed to decode statistics payload: {0}")]
    Decode(#[from] quick_xml::DeError),

    /// A top-level `system` counter carried non-numeric text. Unlike
    /// handler stats and JVM sub-values, these are mandatory.
    #[error("malformed system counter {key:?}: {value:?}")]
    MalformedCounter { key: String, value: String },

    /// The cache has never completed a successful refresh.
    #[error("sampling cache holds no snapshot yet")]
    NoSnapshot,

    #[error("statistic block {block:?} not present in {generation} snapshot")]
    MissingBlock { block: String, generation: Generation },

    #[error("value {key:?} not present in block {block:?} of {generation} snapshot")]
    MissingValue {
        block: String,
        key: String,
        generation: Generation,
    },
}

/// Produces a full statistics snapshot from the monitored server.
///
/// The sampling cache depends on this seam rather than on the concrete
/// HTTP client so tests can drive it with scripted snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches and assembles one snapshot. A temporarily unreachable admin
    /// endpoint (non-2xx on the primary query) yields an empty snapshot,
    /// not an error; transport and primary decode failures are errors.
    async fn fetch(&self) -> Result<Snapshot, AgentError>;
}
