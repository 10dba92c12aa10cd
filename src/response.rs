//! Wire format of the Solr admin interface and the payload parsers
//!
//! Two structurally different XML payloads are normalized here into
//! `StatisticBlock`s: the per-handler statistics from `admin/stats.jsp`
//! and the OS/JVM system information from `admin/system/`. Parsing is
//! pure; no I/O happens in this module.

use crate::core::{AgentError, ComponentKind, StatisticBlock, SYSTEM_BLOCK};
use serde::Deserialize;

/// Top-level shape of the `admin/stats.jsp` payload.
#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    #[serde(rename = "solr-info")]
    pub solr_info: SolrInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct SolrInfo {
    #[serde(rename = "QUERYHANDLER", default)]
    pub query_handler: HandlerGroup,
    #[serde(rename = "UPDATEHANDLER", default)]
    pub update_handler: HandlerGroup,
    #[serde(rename = "CACHE", default)]
    pub cache: HandlerGroup,
}

impl SolrInfo {
    /// All handler entries across the three groups, in document order.
    pub fn entries(&self) -> impl Iterator<Item = &HandlerEntry> {
        self.query_handler
            .entries
            .iter()
            .chain(self.update_handler.entries.iter())
            .chain(self.cache.entries.iter())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HandlerGroup {
    #[serde(rename = "entry", default)]
    pub entries: Vec<HandlerEntry>,
}

/// One `<entry>` record: a handler or cache component with its stat list.
#[derive(Debug, Default, Deserialize)]
pub struct HandlerEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub stats: StatList,
}

impl HandlerEntry {
    /// The recognized component kind of this entry, or `None` if the
    /// entry should be dropped before parsing.
    pub fn kind(&self) -> Option<ComponentKind> {
        ComponentKind::from_class_name(&self.class_name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatList {
    #[serde(rename = "stat", default)]
    pub stats: Vec<NamedValue>,
}

/// A `name` attribute paired with element text, shared by both payloads.
#[derive(Debug, Default, Deserialize)]
pub struct NamedValue {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Top-level shape of the `admin/system/` payload.
#[derive(Debug, Deserialize)]
pub struct SystemResponse {
    #[serde(rename = "lst", default)]
    pub sections: Vec<SystemSection>,
}

/// One top-level `<lst>` group, identified by its `name` attribute
/// (`"jvm"` and `"system"` are the ones we read).
#[derive(Debug, Default, Deserialize)]
pub struct SystemSection {
    #[serde(rename = "@name", default)]
    pub name: String,
    /// Plain numeric counters (`<long name="...">` children).
    #[serde(rename = "long", default)]
    pub counters: Vec<NamedValue>,
    /// Nested lists holding unit-suffixed memory entries
    /// (`<lst><str name="...">` children).
    #[serde(rename = "lst", default)]
    pub nested: Vec<NestedValues>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NestedValues {
    #[serde(rename = "str", default)]
    pub values: Vec<NamedValue>,
}

/// Converts one handler/cache entry into a statistic block.
///
/// Individual stat entries whose text does not parse as a number are
/// silently skipped; a malformed counter must not poison the rest of
/// the block.
pub fn parse_handler_block(entry: &HandlerEntry) -> StatisticBlock {
    let mut block = StatisticBlock::new(entry.name.trim());
    for stat in &entry.stats.stats {
        if let Ok(value) = stat.value.trim().parse::<f64>() {
            block.insert(stat.name.trim(), value);
        }
    }
    block
}

/// Converts the system-info payload into the `"solr"` statistic block.
///
/// JVM memory entries carry an optional `KB`/`MB`/`GB` suffix and are
/// normalized to bytes under `jvm_memory_<entry>`; entries that fail to
/// parse are skipped. Top-level `system` counters are mandatory: a parse
/// failure there fails the whole block.
pub fn parse_system_block(response: &SystemResponse) -> Result<StatisticBlock, AgentError> {
    let mut block = StatisticBlock::new(SYSTEM_BLOCK);
    for section in &response.sections {
        match section.name.trim() {
            "jvm" => {
                for entry in section.nested.iter().flat_map(|list| list.values.iter()) {
                    if let Some(bytes) = parse_memory_value(&entry.value) {
                        block.insert(format!("jvm_memory_{}", entry.name.trim()), bytes);
                    }
                }
            }
            "system" => {
                for entry in &section.counters {
                    let value = entry.value.trim().parse::<f64>().map_err(|_| {
                        AgentError::MalformedCounter {
                            key: entry.name.trim().to_string(),
                            value: entry.value.trim().to_string(),
                        }
                    })?;
                    block.insert(entry.name.trim(), value);
                }
            }
            _ => {}
        }
    }
    Ok(block)
}

/// Parses a memory value like `"512 MB"` into bytes. A missing or
/// unrecognized suffix means the number is already in bytes.
fn parse_memory_value(raw: &str) -> Option<f64> {
    let mut parts = raw.split_whitespace();
    let value: f64 = parts.next()?.parse().ok()?;
    let multiplier = match parts.next() {
        Some("KB") => 1024.0,
        Some("MB") => 1024.0 * 1024.0,
        Some("GB") => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    Some(value * multiplier)
}
