//! Telemetry: structured logging with redaction, and Prometheus metrics.

pub mod logging;
pub mod metrics;

pub use logging::{
    init_logging, LogFormat, LoggingConfig, RedactionConfig, RedactionPattern,
    SensitiveFieldRedactor,
};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry};
