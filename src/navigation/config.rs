use std::sync::{Arc, Mutex};

use crate::logging::{LogLevel, Logger, event_with_fields};
use crate::metrics::NavigationMetrics;

use super::audit::{NavigationAudit, NullNavigationAudit};

pub const DEFAULT_LOG_TARGET: &str = "tabnav::navigation";

/// Configuration knobs for the navigation manager.
#[derive(Clone)]
pub struct NavigationConfig {
    /// Optional structured logger used by the manager and its stacks.
    pub logger: Option<Logger>,
    /// Counters updated on every navigation operation.
    pub metrics: Option<Arc<Mutex<NavigationMetrics>>>,
    pub audit: Arc<dyn NavigationAudit>,
    /// Target used for manager log events. Stacks log under `<target>.stack`.
    pub log_target: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: Arc::new(NullNavigationAudit),
            log_target: DEFAULT_LOG_TARGET.to_string(),
        }
    }
}

impl NavigationConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit<A>(mut self, audit: A) -> Self
    where
        A: NavigationAudit + 'static,
    {
        self.audit = Arc::new(audit);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(NavigationMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<NavigationMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }

    pub(crate) fn stack_target(&self) -> String {
        format!("{}.stack", self.log_target)
    }

    pub(crate) fn emit<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, &self.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut NavigationMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut guard);
            }
        }
    }
}
