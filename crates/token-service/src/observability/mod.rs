//! Observability for the Token Service: Prometheus metrics.

pub mod metrics;
