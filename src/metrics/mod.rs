use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters describing navigation activity since the controller was created.
#[derive(Debug, Default, Clone)]
pub struct NavigationMetrics {
    pushes: u64,
    pops: u64,
    selects: u64,
    home_fallbacks: u64,
    restores: u64,
    restore_fallbacks: u64,
}

impl NavigationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_push(&mut self) {
        self.pushes = self.pushes.saturating_add(1);
    }

    pub fn record_pop(&mut self) {
        self.pops = self.pops.saturating_add(1);
    }

    pub fn record_select(&mut self) {
        self.selects = self.selects.saturating_add(1);
    }

    pub fn record_home_fallback(&mut self) {
        self.home_fallbacks = self.home_fallbacks.saturating_add(1);
    }

    pub fn record_restore(&mut self, fallbacks: usize) {
        self.restores = self.restores.saturating_add(1);
        self.restore_fallbacks = self.restore_fallbacks.saturating_add(fallbacks as u64);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            pushes: self.pushes,
            pops: self.pops,
            selects: self.selects,
            home_fallbacks: self.home_fallbacks,
            restores: self.restores,
            restore_fallbacks: self.restore_fallbacks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub pushes: u64,
    pub pops: u64,
    pub selects: u64,
    pub home_fallbacks: u64,
    pub restores: u64,
    pub restore_fallbacks: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "navigation_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("pushes".to_string(), json!(self.pushes));
        map.insert("pops".to_string(), json!(self.pops));
        map.insert("selects".to_string(), json!(self.selects));
        map.insert("home_fallbacks".to_string(), json!(self.home_fallbacks));
        map.insert("restores".to_string(), json!(self.restores));
        map.insert("restore_fallbacks".to_string(), json!(self.restore_fallbacks));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let mut metrics = NavigationMetrics::new();
        metrics.record_push();
        metrics.record_push();
        metrics.record_pop();
        metrics.record_restore(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pushes, 2);
        assert_eq!(snapshot.pops, 1);
        assert_eq!(snapshot.restores, 1);
        assert_eq!(snapshot.restore_fallbacks, 2);

        let event = snapshot.to_log_event("tabnav::metrics");
        assert_eq!(event.message, "navigation_metrics");
        assert_eq!(event.field("pushes"), Some(&json!(2)));
    }
}
