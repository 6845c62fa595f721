use shared::metrics_defs::{MetricDef, MetricType};

pub const EXTERNAL_LAYERS: MetricDef = MetricDef {
    name: "external_layers.rewritten",
    metric_type: MetricType::Counter,
    description: "External layers rewritten for the backend. Tagged with kind, protocol.",
};

pub const DROPPED_LAYERS: MetricDef = MetricDef {
    name: "external_layers.dropped",
    metric_type: MetricType::Counter,
    description: "External WFS layers dropped because the backend cannot render them",
};

pub const PROBE_FAILURES: MetricDef = MetricDef {
    name: "describe_feature_type.failures",
    metric_type: MetricType::Counter,
    description: "Failed DescribeFeatureType requests, resolved to automatic styling",
};

pub const ALL_METRICS: &[MetricDef] = &[EXTERNAL_LAYERS, DROPPED_LAYERS, PROBE_FAILURES];
