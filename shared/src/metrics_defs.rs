//! Common types for metrics definitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Registers the description of every metric with the installed recorder.
/// Call once after the recorder is installed.
pub fn describe_all(defs: &[MetricDef]) {
    for def in defs {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}

#[macro_export]
macro_rules! counter {
    ($def:expr $(, $label:expr => $value:expr)* $(,)?) => {
        metrics::counter!($def.name $(, $label => $value)*)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr $(, $label:expr => $value:expr)* $(,)?) => {
        metrics::histogram!($def.name $(, $label => $value)*)
    };
}
