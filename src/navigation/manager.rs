use std::collections::HashSet;

use serde_json::json;

use crate::host::{CommitMode, ContainerId, HostScope, ScreenHost, Transaction};
use crate::logging::{LogLevel, json_kv};
use crate::metrics::MetricSnapshot;
use crate::{NavError, Result};

use super::audit::{NavigationAuditEvent, NavigationAuditStage};
use super::config::NavigationConfig;
use super::stack::Stack;
use super::state::{NavigationState, StateBag};
use super::tag::{ScreenTag, TagSource, UuidTagSource};

/// Factory producing a tab's root screen.
pub type ScreenFactory<S> = Box<dyn Fn() -> S>;

/// Tab registration consumed by [`NavigationManager::init`]. The first
/// registered tab becomes the home tab.
pub struct TabSpec<S> {
    name: String,
    root: ScreenFactory<S>,
}

impl<S> TabSpec<S> {
    pub fn new(name: impl Into<String>, root: impl Fn() -> S + 'static) -> Self {
        Self {
            name: name.into(),
            root: Box::new(root),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Tabs {
    home: String,
    selected: String,
    stacks: Vec<Stack>,
}

impl Tabs {
    fn stack(&self, tab: &str) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.tab() == tab)
    }

    fn contains(&self, tab: &str) -> bool {
        self.stack(tab).is_some()
    }

    fn selected_stack_mut(&mut self) -> Result<&mut Stack> {
        let selected = self.selected.as_str();
        self.stacks
            .iter_mut()
            .find(|stack| stack.tab() == selected)
            .ok_or_else(|| NavError::StackNotFound(selected.to_string()))
    }
}

enum NavState {
    Uninitialized,
    Initialized(Tabs),
}

/// Owns one [`Stack`] per tab and decides which of them is visible.
///
/// Lifecycle: construct with a host, call [`init`](Self::init) exactly once,
/// then route `select`/`push`/`pop_back` through it. Everything except `init`
/// and the read accessors fails with [`NavError::NotInitialized`] before that.
pub struct NavigationManager<H: ScreenHost> {
    host: H,
    tag_source: Box<dyn TagSource>,
    config: NavigationConfig,
    state: NavState,
}

impl<H: ScreenHost> NavigationManager<H> {
    pub fn new(host: H) -> Self {
        Self::with_tag_source(host, UuidTagSource)
    }

    pub fn with_tag_source<T>(host: H, tag_source: T) -> Self
    where
        T: TagSource + 'static,
    {
        Self {
            host,
            tag_source: Box::new(tag_source),
            config: NavigationConfig::default(),
            state: NavState::Uninitialized,
        }
    }

    pub fn with_config(mut self, config: NavigationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Create or restore one stack per tab, then select the persisted tab
    /// (or the home tab).
    pub fn init(
        &mut self,
        specs: Vec<TabSpec<H::Screen>>,
        persisted: Option<&NavigationState>,
    ) -> Result<()> {
        let Some(home) = specs.first().map(|spec| spec.name.clone()) else {
            return Ok(());
        };
        if self.is_initialized() {
            return Err(NavError::AlreadyInitialized);
        }
        if specs.iter().any(|spec| spec.name.is_empty()) {
            return Err(NavError::InvalidState("tab name must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = specs.iter().find(|spec| !seen.insert(spec.name.as_str())) {
            return Err(NavError::InvalidState(format!(
                "tab `{}` registered twice",
                duplicate.name
            )));
        }

        let mut stacks = Vec::with_capacity(specs.len());
        let mut fallbacks = 0usize;
        for spec in &specs {
            let stack = match persisted {
                None => self.fresh_stack(spec)?,
                Some(state) => {
                    let (stack, fell_back) = self.restore_stack(spec, state)?;
                    if fell_back {
                        fallbacks += 1;
                    }
                    stack
                }
            };
            stacks.push(stack.with_logger(self.config.logger.clone(), self.config.stack_target()));
        }

        let target = match persisted.and_then(NavigationState::selected) {
            Some(tab) if stacks.iter().any(|stack| stack.tab() == tab) => tab.to_string(),
            Some(tab) => {
                self.config.emit(
                    LogLevel::Warn,
                    "unknown_selected_tab",
                    [json_kv("tab", tab), json_kv("home", home.as_str())],
                );
                home.clone()
            }
            None => home.clone(),
        };

        let tabs = Tabs {
            home,
            selected: target,
            stacks,
        };
        apply_selection(&mut self.host, &tabs, &tabs.selected)?;

        let stage = if persisted.is_some() {
            self.config.record(|metrics| metrics.record_restore(fallbacks));
            NavigationAuditStage::Restored
        } else {
            NavigationAuditStage::Initialized
        };
        self.config.audit.record(
            NavigationAuditEvent::new(stage)
                .detail("tabs", json!(specs.len()))
                .detail("selected", tabs.selected.as_str())
                .detail("fallbacks", json!(fallbacks)),
        );
        self.config.emit(
            LogLevel::Info,
            "navigation_initialized",
            [
                json_kv("tabs", json!(specs.len())),
                json_kv("home", tabs.home.as_str()),
                json_kv("selected", tabs.selected.as_str()),
                json_kv("restored", persisted.is_some()),
                json_kv("fallbacks", json!(fallbacks)),
            ],
        );

        self.state = NavState::Initialized(tabs);
        Ok(())
    }

    fn fresh_stack(&mut self, spec: &TabSpec<H::Screen>) -> Result<Stack> {
        let container = self.host.attach_container(&spec.name)?;
        self.fresh_stack_in(spec, container)
    }

    fn fresh_stack_in(
        &mut self,
        spec: &TabSpec<H::Screen>,
        container: ContainerId,
    ) -> Result<Stack> {
        Stack::fresh(
            &mut self.host,
            &mut *self.tag_source,
            &spec.name,
            container,
            (spec.root)(),
        )
    }

    /// Rebuild one tab's stack. The flag reports a fallback to a fresh root.
    fn restore_stack(
        &mut self,
        spec: &TabSpec<H::Screen>,
        state: &NavigationState,
    ) -> Result<(Stack, bool)> {
        let Some(container) = self.host.find_container(&spec.name) else {
            self.restore_fallback(&spec.name, "host has no container for tab");
            return Ok((self.fresh_stack(spec)?, true));
        };

        let tags = match state.tags(&spec.name) {
            Some(tags) if !tags.is_empty() => tags.to_vec(),
            _ => {
                self.restore_fallback(&spec.name, "no persisted tags for tab");
                return Ok((self.fresh_stack_in(spec, container)?, true));
            }
        };

        match Stack::restore(&mut self.host, &spec.name, container, tags) {
            Ok(stack) => {
                let levels = self.host.back_level_count(container);
                if levels + 1 != stack.depth() {
                    self.config.emit(
                        LogLevel::Warn,
                        "back_levels_out_of_step",
                        [
                            json_kv("tab", spec.name.as_str()),
                            json_kv("depth", json!(stack.depth())),
                            json_kv("host_levels", json!(levels)),
                        ],
                    );
                }
                Ok((stack, false))
            }
            Err(err) if err.is_recoverable() => {
                self.restore_fallback(&spec.name, &err.to_string());
                hide_all(&mut self.host, container)?;
                Ok((self.fresh_stack_in(spec, container)?, true))
            }
            Err(err) => Err(err),
        }
    }

    fn restore_fallback(&self, tab: &str, reason: &str) {
        self.config.emit(
            LogLevel::Warn,
            "restore_inconsistency",
            [json_kv("tab", tab), json_kv("reason", reason)],
        );
        self.config.audit.record(
            NavigationAuditEvent::new(NavigationAuditStage::RestoreFallback)
                .detail("tab", tab)
                .detail("reason", reason),
        );
    }

    /// Show `tab`'s container and hide every other one. Stack histories are
    /// left untouched.
    pub fn select(&mut self, tab: &str) -> Result<()> {
        let Self {
            host,
            config,
            state,
            ..
        } = self;
        let NavState::Initialized(tabs) = state else {
            return Err(NavError::NotInitialized);
        };
        if !tabs.contains(tab) {
            return Err(NavError::StackNotFound(tab.to_string()));
        }
        if tabs.selected == tab {
            return Ok(());
        }

        apply_selection(host, tabs, tab)?;
        let previous = std::mem::replace(&mut tabs.selected, tab.to_string());

        config.record(|metrics| metrics.record_select());
        config.audit.record(
            NavigationAuditEvent::new(NavigationAuditStage::TabSelected)
                .detail("from", previous.as_str())
                .detail("to", tab),
        );
        config.emit(
            LogLevel::Debug,
            "tab_selected",
            [json_kv("from", previous), json_kv("to", tab)],
        );
        Ok(())
    }

    /// Push `screen` on the selected tab as a poppable level.
    pub fn push(&mut self, screen: H::Screen) -> Result<ScreenTag> {
        self.push_with(screen, true)
    }

    pub fn push_with(&mut self, screen: H::Screen, add_to_back_stack: bool) -> Result<ScreenTag> {
        let Self {
            host,
            tag_source,
            config,
            state,
        } = self;
        let NavState::Initialized(tabs) = state else {
            return Err(NavError::NotInitialized);
        };
        let stack = tabs.selected_stack_mut()?;
        let tag = stack.push(host, &mut **tag_source, screen, add_to_back_stack)?;

        config.record(|metrics| metrics.record_push());
        config.audit.record(
            NavigationAuditEvent::new(NavigationAuditStage::ScreenPushed)
                .detail("tab", stack.tab())
                .detail("tag", tag.as_str())
                .detail("depth", json!(stack.depth())),
        );
        Ok(tag)
    }

    /// Unwind the selected tab, falling back to the home tab once it is
    /// exhausted. `false` means no in-app navigation is left.
    pub fn pop_back(&mut self) -> Result<bool> {
        let Self {
            host,
            config,
            state,
            ..
        } = self;
        let NavState::Initialized(tabs) = state else {
            return Err(NavError::NotInitialized);
        };

        let stack = tabs.selected_stack_mut()?;
        if stack.pop_back(host)? {
            config.record(|metrics| metrics.record_pop());
            config.audit.record(
                NavigationAuditEvent::new(NavigationAuditStage::StackPopped)
                    .detail("tab", stack.tab())
                    .detail("depth", json!(stack.depth())),
            );
            return Ok(true);
        }

        if tabs.selected == tabs.home {
            config.emit(
                LogLevel::Debug,
                "back_unhandled",
                [json_kv("tab", tabs.home.as_str())],
            );
            return Ok(false);
        }

        let home = tabs.home.clone();
        apply_selection(host, tabs, &home)?;
        let previous = std::mem::replace(&mut tabs.selected, home);

        config.record(|metrics| {
            metrics.record_select();
            metrics.record_home_fallback();
        });
        config.audit.record(
            NavigationAuditEvent::new(NavigationAuditStage::HomeFallback)
                .detail("from", previous.as_str())
                .detail("to", tabs.home.as_str()),
        );
        config.emit(
            LogLevel::Debug,
            "home_fallback",
            [
                json_kv("from", previous),
                json_kv("to", tabs.home.as_str()),
            ],
        );
        Ok(true)
    }

    /// Selected tab plus every stack's tags.
    pub fn serialize_state(&self) -> Result<NavigationState> {
        let tabs = self.tabs()?;
        let mut state = NavigationState::new().with_selected(tabs.selected.as_str());
        for stack in &tabs.stacks {
            state.insert_tab(stack.tab(), stack.serialize());
        }
        self.config.audit.record(
            NavigationAuditEvent::new(NavigationAuditStage::StateSaved)
                .detail("selected", tabs.selected.as_str())
                .detail("tabs", json!(tabs.stacks.len())),
        );
        Ok(state)
    }

    /// Write the serialized state into a host-owned bag.
    pub fn save_into<B: StateBag + ?Sized>(&self, bag: &mut B) -> Result<()> {
        self.serialize_state()?.write_to(bag);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, NavState::Initialized(_))
    }

    pub fn selected_tab(&self) -> Option<&str> {
        self.tabs().ok().map(|tabs| tabs.selected.as_str())
    }

    pub fn home_tab(&self) -> Option<&str> {
        self.tabs().ok().map(|tabs| tabs.home.as_str())
    }

    /// Registered tabs in registration order.
    pub fn tab_names(&self) -> Vec<&str> {
        self.tabs()
            .map(|tabs| tabs.stacks.iter().map(Stack::tab).collect())
            .unwrap_or_default()
    }

    pub fn stack(&self, tab: &str) -> Option<&Stack> {
        self.tabs().ok()?.stack(tab)
    }

    /// Top tag of the selected tab, i.e. the screen the user sees.
    pub fn visible_tag(&self) -> Option<&ScreenTag> {
        let tabs = self.tabs().ok()?;
        tabs.stack(&tabs.selected)?.top()
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        metrics.lock().ok().map(|guard| guard.snapshot())
    }

    /// Emit the current metrics snapshot through the configured logger.
    pub fn log_metrics(&self) {
        if let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let target = format!("{}.metrics", self.config.log_target);
            let _ = logger.log_event(snapshot.to_log_event(&target));
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn tabs(&self) -> Result<&Tabs> {
        match &self.state {
            NavState::Initialized(tabs) => Ok(tabs),
            NavState::Uninitialized => Err(NavError::NotInitialized),
        }
    }
}

fn apply_selection<H: ScreenHost>(host: &mut H, tabs: &Tabs, tab: &str) -> Result<()> {
    let mut transaction = Transaction::new();
    for stack in tabs.stacks.iter().filter(|stack| stack.tab() != tab) {
        transaction.hide(stack.tab());
    }
    transaction.show(tab);
    host.commit(HostScope::Root, transaction, CommitMode::Immediate)
}

fn hide_all<H: ScreenHost>(host: &mut H, container: ContainerId) -> Result<()> {
    let mut transaction = Transaction::new();
    for tag in host.screen_tags(container) {
        transaction.hide(tag);
    }
    if transaction.is_empty() {
        return Ok(());
    }
    host.commit(HostScope::Container(container), transaction, CommitMode::Deferred)
}
