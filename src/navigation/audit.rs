//! Navigation lifecycle audit hooks.
//!
//! The manager reports each major transition as a [`NavigationAuditEvent`]
//! carrying a stage plus structured details, so callers can buffer or display
//! the navigation history without touching the controller itself.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde_json::Value;

/// Checkpoints emitted by `NavigationManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAuditStage {
    /// Stacks were created from the tab specs.
    Initialized,
    /// Stacks were rebuilt from persisted state.
    Restored,
    /// A tab restore fell back to a fresh root stack.
    RestoreFallback,
    TabSelected,
    ScreenPushed,
    StackPopped,
    /// Back navigation left an exhausted tab for the home tab.
    HomeFallback,
    StateSaved,
}

#[derive(Debug, Clone)]
pub struct NavigationAuditEvent {
    pub timestamp: SystemTime,
    pub stage: NavigationAuditStage,
    pub details: Vec<(String, Value)>,
}

impl NavigationAuditEvent {
    pub fn new(stage: NavigationAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub trait NavigationAudit: Send + Sync {
    fn record(&self, event: NavigationAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullNavigationAudit;

impl NavigationAudit for NullNavigationAudit {
    fn record(&self, _event: NavigationAuditEvent) {}
}

/// Collects every event. Clones share one buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferedAudit {
    events: Arc<Mutex<Vec<NavigationAuditEvent>>>,
}

impl BufferedAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NavigationAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<NavigationAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl NavigationAudit for BufferedAudit {
    fn record(&self, event: NavigationAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
