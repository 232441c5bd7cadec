//! Metrics definitions for the upstream API client.

use shared::metrics_defs::{MetricDef, MetricType};

pub const UPSTREAM_REQUESTS: MetricDef = MetricDef {
    name: "upstream.requests",
    metric_type: MetricType::Counter,
    description: "Logical upstream requests after retries. Tagged with endpoint, outcome.",
};

pub const UPSTREAM_RETRIES: MetricDef = MetricDef {
    name: "upstream.retries",
    metric_type: MetricType::Counter,
    description: "Retry attempts issued after a retryable failure. Tagged with endpoint.",
};

pub const UPSTREAM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "upstream.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent on a logical upstream request in seconds, including backoff. Tagged with endpoint.",
};

pub const CACHE_HIT: MetricDef = MetricDef {
    name: "response_cache.hit",
    metric_type: MetricType::Counter,
    description: "Lookups served from a response cache. Tagged with cache.",
};

pub const CACHE_MISS: MetricDef = MetricDef {
    name: "response_cache.miss",
    metric_type: MetricType::Counter,
    description: "Lookups that ran the upstream producer. Tagged with cache.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    UPSTREAM_REQUESTS,
    UPSTREAM_RETRIES,
    UPSTREAM_REQUEST_DURATION,
    CACHE_HIT,
    CACHE_MISS,
];
