//! Metrics definitions for profile aggregation.

use shared::metrics_defs::{MetricDef, MetricType};

pub const PROFILES_BUILT: MetricDef = MetricDef {
    name: "profile.built",
    metric_type: MetricType::Counter,
    description: "Profiles assembled. Tagged with outcome (complete, partial, not_found, failed).",
};

pub const PROFILE_BUILD_DURATION: MetricDef = MetricDef {
    name: "profile.build.duration",
    metric_type: MetricType::Histogram,
    description: "Time taken to assemble a profile in seconds.",
};

pub const MATCH_DETAILS_DROPPED: MetricDef = MetricDef {
    name: "fanout.match_details.dropped",
    metric_type: MetricType::Counter,
    description: "Match details omitted from a history. Tagged with reason.",
};

pub const LP_CORRELATION: MetricDef = MetricDef {
    name: "lp_delta.correlation",
    metric_type: MetricType::Counter,
    description: "Per-match LP correlation outcomes. Tagged with outcome.",
};

pub const SNAPSHOTS_WRITTEN: MetricDef = MetricDef {
    name: "snapshots.written",
    metric_type: MetricType::Counter,
    description: "LP snapshots persisted.",
};

pub const SNAPSHOT_WRITE_FAILURES: MetricDef = MetricDef {
    name: "snapshots.write_failures",
    metric_type: MetricType::Counter,
    description: "Batches of LP snapshots that failed to persist.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    PROFILES_BUILT,
    PROFILE_BUILD_DURATION,
    MATCH_DETAILS_DROPPED,
    LP_CORRELATION,
    SNAPSHOTS_WRITTEN,
    SNAPSHOT_WRITE_FAILURES,
];
