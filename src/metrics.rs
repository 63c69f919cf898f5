use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub markers_created: IntCounter,
    pub markers_removed: IntCounter,
    pub keywords_searched: IntCounter,
    pub keywords_without_match: IntCounter,
    registry: Arc<Registry>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn counter(name: &str, help: &str) -> IntCounter {
    IntCounter::with_opts(Opts::new(name, help)).unwrap()
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let markers_created = counter("markers_created", "Number of marker elements inserted");
        let markers_removed = counter("markers_removed", "Number of marker elements removed");
        let keywords_searched = counter("keywords_searched", "Number of keywords searched");
        let keywords_without_match = counter(
            "keywords_without_match",
            "Number of keywords or expressions that matched nothing",
        );

        registry.register(Box::new(markers_created.clone())).ok();
        registry.register(Box::new(markers_removed.clone())).ok();
        registry.register(Box::new(keywords_searched.clone())).ok();
        registry.register(Box::new(keywords_without_match.clone())).ok();

        Metrics {
            markers_created,
            markers_removed,
            keywords_searched,
            keywords_without_match,
            registry: Arc::new(registry),
        }
    }

    pub fn gather(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
