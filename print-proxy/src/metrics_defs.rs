use shared::metrics_defs::{MetricDef, MetricType};

pub const PRINT_REQUESTS: MetricDef = MetricDef {
    name: "print.requests",
    metric_type: MetricType::Counter,
    description: "Print requests served. Tagged with status.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "print.duration",
    metric_type: MetricType::Histogram,
    description: "Print request duration in seconds, including the backend round trip",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "print.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of print requests currently being processed",
};

pub const ALL_METRICS: &[MetricDef] = &[PRINT_REQUESTS, REQUEST_DURATION, REQUESTS_INFLIGHT];
