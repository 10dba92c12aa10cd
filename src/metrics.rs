//! Metric descriptors and the default metric table
//!
//! A `Metric` names one value inside a snapshot via a `(block_key,
//! value_key)` pair and a read mode. `Latest` metrics report the current
//! generation's raw value; `Incremental` metrics report the difference
//! between the current and previous generations. Descriptors are
//! declarative and immutable; they reference a shared [`SamplingCache`]
//! at evaluation time but never own it.

use crate::core::{AgentError, Generation};
use crate::sampling::SamplingCache;
use std::time::Instant;

/// How a metric reads the cached generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricMode {
    /// Report the current generation's value unmodified.
    Latest,
    /// Report current-generation value minus previous-generation value.
    /// When the upstream counter was reset between samples the delta can
    /// be negative; it is reported as-is, not clamped. Restart detection
    /// is a known limitation.
    Incremental,
}

/// Declarative description of one reported metric.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub block_key: &'static str,
    pub value_key: &'static str,
    pub name: &'static str,
    pub units: &'static str,
    pub mode: MetricMode,
}

impl Metric {
    pub const fn latest(
        block_key: &'static str,
        value_key: &'static str,
        name: &'static str,
        units: &'static str,
    ) -> Self {
        Self {
            block_key,
            value_key,
            name,
            units,
            mode: MetricMode::Latest,
        }
    }

    pub const fn incremental(
        block_key: &'static str,
        value_key: &'static str,
        name: &'static str,
        units: &'static str,
    ) -> Self {
        Self {
            block_key,
            value_key,
            name,
            units,
            mode: MetricMode::Incremental,
        }
    }

    /// Evaluates the metric against the shared cache at `now`.
    ///
    /// Refreshes the cache first if it is stale; fetch errors propagate
    /// unchanged and no value is synthesized. A key missing from the
    /// generation(s) the mode reads is a per-metric error and leaves the
    /// cache untouched for other metrics.
    pub async fn evaluate(&self, cache: &SamplingCache, now: Instant) -> Result<f64, AgentError> {
        cache.ensure_fresh(now).await?;
        let (previous, current) = cache.generations().await?;

        let last = current.lookup(self.block_key, self.value_key, Generation::Current)?;
        match self.mode {
            MetricMode::Latest => Ok(last),
            MetricMode::Incremental => {
                let prev = previous.lookup(self.block_key, self.value_key, Generation::Previous)?;
                Ok(last - prev)
            }
        }
    }
}

/// The built-in metric table, ported from the Solr monitoring setup this
/// agent replaces: memory gauges, per-handler throughput and latency,
/// cache efficiency, and the incremental counters of the update handler
/// and the four standard caches.
pub fn default_metrics() -> Vec<Metric> {
    let mut metrics = vec![
        // Solr memory gauges
        Metric::latest("solr", "jvm_memory_used", "solr/memory/JVM memory used", "bytes"),
        Metric::latest("solr", "jvm_memory_free", "solr/memory/JVM memory free", "bytes"),
        Metric::latest("solr", "jvm_memory_total", "solr/memory/JVM memory total", "bytes"),
        Metric::latest("solr", "freePhysicalMemorySize", "solr/memory/Free Physical Memory Size", "bytes"),
    ];

    // Per-handler averages exposed by Solr itself
    for handler in HANDLERS {
        metrics.push(Metric::latest(
            handler.block_key,
            "avgRequestsPerSecond",
            handler.rps_name,
            "requests/seconds",
        ));
        metrics.push(Metric::latest(
            handler.block_key,
            "avgTimePerRequest",
            handler.tpr_name,
            "seconds",
        ));
        metrics.push(Metric::incremental(
            handler.block_key,
            "errors",
            handler.errors_name,
            "errors/seconds",
        ));
        metrics.push(Metric::incremental(
            handler.block_key,
            "timeouts",
            handler.timeouts_name,
            "timeouts/seconds",
        ));
    }

    // Update handler counters
    metrics.push(Metric::incremental(
        "updateHandler",
        "errors",
        "handler/errors/DirectUpdateHandler2",
        "errors/seconds",
    ));
    metrics.push(Metric::incremental(
        "updateHandler",
        "cumulative_errors",
        "handler/errors/DirectUpdateHandler2 cumulative errors",
        "errors/seconds",
    ));
    for key in UPDATE_HANDLER_KEYS {
        metrics.push(Metric {
            block_key: "updateHandler",
            value_key: key.value_key,
            name: key.name,
            units: "requests/seconds",
            mode: MetricMode::Incremental,
        });
    }

    // Cache efficiency and traffic, for each of the four standard caches
    for cache in CACHES {
        metrics.push(Metric::latest(cache.block_key, "hitratio", cache.hitratio_name, "seconds"));
        metrics.push(Metric::latest(
            cache.block_key,
            "cumulative_hitratio",
            cache.cumulative_hitratio_name,
            "seconds",
        ));
        metrics.push(Metric::latest(cache.block_key, "size", cache.size_name, "seconds"));
        for counter in cache.counters {
            metrics.push(Metric {
                block_key: cache.block_key,
                value_key: counter.value_key,
                name: counter.name,
                units: counter.units,
                mode: MetricMode::Incremental,
            });
        }
    }

    metrics
}

struct HandlerEntry {
    block_key: &'static str,
    rps_name: &'static str,
    tpr_name: &'static str,
    errors_name: &'static str,
    timeouts_name: &'static str,
}

const HANDLERS: &[HandlerEntry] = &[
    HandlerEntry {
        block_key: "spell",
        rps_name: "handler/request_per_second/spell",
        tpr_name: "handler/time_per_request/spell",
        errors_name: "handler/errors/spell",
        timeouts_name: "handler/timeouts/spell",
    },
    HandlerEntry {
        block_key: "/update",
        rps_name: "handler/request_per_second/update",
        tpr_name: "handler/time_per_request/update",
        errors_name: "handler/errors/update",
        timeouts_name: "handler/timeouts/update",
    },
    HandlerEntry {
        block_key: "org.apache.solr.handler.XmlUpdateRequestHandler",
        rps_name: "handler/request_per_second/org.apache.solr.handler.XmlUpdateRequestHandler",
        tpr_name: "handler/time_per_request/org.apache.solr.handler.XmlUpdateRequestHandler",
        errors_name: "handler/errors/org.apache.solr.handler.XmlUpdateRequestHandler",
        timeouts_name: "handler/timeouts/org.apache.solr.handler.XmlUpdateRequestHandler",
    },
    HandlerEntry {
        block_key: "standard",
        rps_name: "handler/request_per_second/standard",
        tpr_name: "handler/time_per_request/standard",
        errors_name: "handler/errors/standard",
        timeouts_name: "handler/timeouts/standard",
    },
    HandlerEntry {
        block_key: "/suggest",
        rps_name: "handler/request_per_second/suggest",
        tpr_name: "handler/time_per_request/suggest",
        errors_name: "handler/errors/suggest",
        timeouts_name: "handler/timeouts/suggest",
    },
];

struct NamedKey {
    value_key: &'static str,
    name: &'static str,
}

const UPDATE_HANDLER_KEYS: &[NamedKey] = &[
    NamedKey { value_key: "commits", name: "DirectUpdateHandler2/commits" },
    NamedKey { value_key: "autocommits", name: "DirectUpdateHandler2/autocommits" },
    NamedKey { value_key: "optimizes", name: "DirectUpdateHandler2/optimizes" },
    NamedKey { value_key: "rollbacks", name: "DirectUpdateHandler2/rollbacks" },
    NamedKey { value_key: "expungeDeletes", name: "DirectUpdateHandler2/expungeDeletes" },
    NamedKey { value_key: "adds", name: "DirectUpdateHandler2/adds" },
    NamedKey { value_key: "deletesById", name: "DirectUpdateHandler2/deletesById" },
    NamedKey { value_key: "deletesByQuery", name: "DirectUpdateHandler2/deletesByQuery" },
    NamedKey { value_key: "cumulative_adds", name: "DirectUpdateHandler2/cumulative_adds" },
    NamedKey { value_key: "cumulative_deletesById", name: "DirectUpdateHandler2/cumulative_deletesById" },
    NamedKey { value_key: "cumulative_deletesByQuery", name: "DirectUpdateHandler2/cumulative_deletesByQuery" },
];

struct CounterKey {
    value_key: &'static str,
    name: &'static str,
    units: &'static str,
}

struct CacheEntry {
    block_key: &'static str,
    hitratio_name: &'static str,
    cumulative_hitratio_name: &'static str,
    size_name: &'static str,
    counters: &'static [CounterKey],
}

macro_rules! cache_counters {
    ($cache:literal) => {
        &[
            CounterKey {
                value_key: "lookups",
                name: concat!("handler/cache/", $cache, "/lookups"),
                units: "request/seconds",
            },
            CounterKey {
                value_key: "hits",
                name: concat!("handler/cache/", $cache, "/hits"),
                units: "hits/seconds",
            },
            CounterKey {
                value_key: "inserts",
                name: concat!("handler/cache/", $cache, "/inserts"),
                units: "inserts/seconds",
            },
            CounterKey {
                value_key: "evictions",
                name: concat!("handler/cache/", $cache, "/evictions"),
                units: "evictions/seconds",
            },
            CounterKey {
                value_key: "cumulative_lookups",
                name: concat!("handler/cache/", $cache, "/cumulative_lookups"),
                units: "request/seconds",
            },
            CounterKey {
                value_key: "cumulative_hits",
                name: concat!("handler/cache/", $cache, "/cumulative_hits"),
                units: "hits/seconds",
            },
            CounterKey {
                value_key: "cumulative_inserts",
                name: concat!("handler/cache/", $cache, "/cumulative_inserts"),
                units: "inserts/seconds",
            },
            CounterKey {
                value_key: "cumulative_evictions",
                name: concat!("handler/cache/", $cache, "/cumulative_evictions"),
                units: "evictions/seconds",
            },
        ]
    };
}

macro_rules! cache_entry {
    ($cache:literal) => {
        CacheEntry {
            block_key: $cache,
            hitratio_name: concat!("handler/cache/hitrates/", $cache),
            cumulative_hitratio_name: concat!("handler/cache/hitrates_cumulative/", $cache),
            size_name: concat!("handler/cache/size/", $cache),
            counters: cache_counters!($cache),
        }
    };
}

const CACHES: &[CacheEntry] = &[
    cache_entry!("queryResultCache"),
    cache_entry!("documentCache"),
    cache_entry!("fieldValueCache"),
    cache_entry!("filterCache"),
];
