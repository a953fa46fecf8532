//! In-memory screen host.
//!
//! Keeps containers, attached screens and back levels in plain vectors so the
//! navigation core can run without a platform runtime. Every call is appended
//! to a journal that tests inspect.

use std::collections::HashSet;

use crate::{NavError, Result};

use super::{CommitMode, ContainerId, HostOp, HostScope, Screen, ScreenHost, Transaction};

const DEFAULT_JOURNAL_LIMIT: usize = 1024;

/// One operation as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpRecord {
    Attach(String),
    Hide(String),
    Show(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    AttachContainer {
        tab: String,
        container: ContainerId,
    },
    Commit {
        scope: HostScope,
        mode: CommitMode,
        ops: Vec<OpRecord>,
        back_level: bool,
    },
    PopBackLevel {
        container: ContainerId,
        popped: bool,
    },
}


#[derive(Debug, Clone, PartialEq, Eq)]
enum Revert {
    Detach(String),
    Show(String),
    Hide(String),
}

#[derive(Debug, Clone)]
struct BackLevel {
    reverts: Vec<Revert>,
}

#[derive(Debug, Clone)]
struct AttachedScreen<S> {
    tag: String,
    screen: S,
    visible: bool,
}

#[derive(Debug, Clone)]
struct ContainerSlot<S> {
    id: ContainerId,
    tab: String,
    visible: bool,
    screens: Vec<AttachedScreen<S>>,
    back_levels: Vec<BackLevel>,
}

impl<S> ContainerSlot<S> {
    fn screen_mut(&mut self, tag: &str) -> Option<&mut AttachedScreen<S>> {
        self.screens.iter_mut().find(|entry| entry.tag == tag)
    }

    fn set_visible(&mut self, tag: &str, visible: bool) {
        if let Some(entry) = self.screen_mut(tag) {
            entry.visible = visible;
        }
    }

    fn detach(&mut self, tag: &str) {
        self.screens.retain(|entry| entry.tag != tag);
    }
}

/// Reference [`ScreenHost`] backed by memory.
#[derive(Debug, Clone)]
pub struct MemoryScreenHost<S> {
    containers: Vec<ContainerSlot<S>>,
    pending: Vec<(HostScope, Transaction<S>)>,
    journal: Vec<HostCall>,
    journal_limit: usize,
    next_container: u32,
}

impl<S> Default for MemoryScreenHost<S> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            pending: Vec::new(),
            journal: Vec::new(),
            journal_limit: DEFAULT_JOURNAL_LIMIT,
            next_container: 1,
        }
    }
}

impl<S: Screen> MemoryScreenHost<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` journal entries, dropping the oldest first.
    pub fn with_journal_limit(mut self, limit: usize) -> Self {
        self.journal_limit = limit;
        self.trim_journal();
        self
    }

    /// Simulate the host being torn down and rebuilt from its own saved state.
    ///
    /// Containers, screens and back levels survive; visibility flags do not,
    /// so every container and screen comes back visible.
    pub fn recreate(mut self) -> Self {
        self.flush();
        for slot in &mut self.containers {
            slot.visible = true;
            for entry in &mut slot.screens {
                entry.visible = true;
            }
        }
        self.journal.clear();
        self
    }

    /// Apply queued deferred transactions.
    pub fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for (scope, transaction) in pending {
            self.apply(scope, transaction);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn journal(&self) -> &[HostCall] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.journal)
    }

    /// Tabs whose container is currently visible.
    pub fn visible_tabs(&mut self) -> Vec<String> {
        self.flush();
        self.containers
            .iter()
            .filter(|slot| slot.visible)
            .map(|slot| slot.tab.clone())
            .collect()
    }

    /// Visible screen tags inside `tab`'s container, in attach order.
    pub fn visible_tags(&mut self, tab: &str) -> Vec<String> {
        self.flush();
        self.slot_by_tab(tab)
            .map(|slot| {
                slot.screens
                    .iter()
                    .filter(|entry| entry.visible)
                    .map(|entry| entry.tag.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every screen tag attached inside `tab`'s container.
    pub fn attached_tags(&mut self, tab: &str) -> Vec<String> {
        self.flush();
        self.slot_by_tab(tab)
            .map(|slot| slot.screens.iter().map(|entry| entry.tag.clone()).collect())
            .unwrap_or_default()
    }

    /// Screen attached under `tag` inside `tab`'s container.
    pub fn screen(&mut self, tab: &str, tag: &str) -> Option<&S> {
        self.flush();
        self.slot_by_tab(tab)?
            .screens
            .iter()
            .find(|entry| entry.tag == tag)
            .map(|entry| &entry.screen)
    }

    /// The single screen the user sees: top visible screen of the visible container.
    pub fn displayed(&mut self) -> Option<(&str, &S)> {
        self.flush();
        let slot = self.containers.iter().find(|slot| slot.visible)?;
        slot.screens
            .iter()
            .rev()
            .find(|entry| entry.visible)
            .map(|entry| (entry.tag.as_str(), &entry.screen))
    }

    fn slot_by_tab(&self, tab: &str) -> Option<&ContainerSlot<S>> {
        self.containers.iter().find(|slot| slot.tab == tab)
    }

    fn slot(&self, id: ContainerId) -> Result<&ContainerSlot<S>> {
        self.containers
            .iter()
            .find(|slot| slot.id == id)
            .ok_or_else(|| NavError::Host(format!("unknown container {}", id.raw())))
    }

    fn slot_mut(&mut self, id: ContainerId) -> Option<&mut ContainerSlot<S>> {
        self.containers.iter_mut().find(|slot| slot.id == id)
    }

    fn validate(&self, scope: HostScope, transaction: &Transaction<S>) -> Result<()> {
        let mut known: HashSet<&str> = match scope {
            HostScope::Root => {
                if transaction.adds_back_level() {
                    return Err(NavError::Host(
                        "root scope has no back stack".to_string(),
                    ));
                }
                self.containers.iter().map(|slot| slot.tab.as_str()).collect()
            }
            HostScope::Container(id) => self
                .slot(id)?
                .screens
                .iter()
                .map(|entry| entry.tag.as_str())
                .collect(),
        };

        for op in transaction.ops() {
            match op {
                HostOp::Attach { tag, .. } => {
                    if scope == HostScope::Root {
                        return Err(NavError::Host(
                            "containers are attached with attach_container".to_string(),
                        ));
                    }
                    if !known.insert(tag.as_str()) {
                        return Err(NavError::Host(format!("tag `{tag}` already attached")));
                    }
                }
                HostOp::Hide(tag) | HostOp::Show(tag) => {
                    if !known.contains(tag.as_str()) {
                        return Err(NavError::Host(format!("tag `{tag}` not found")));
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, scope: HostScope, transaction: Transaction<S>) {
        let (ops, back_level) = transaction.into_parts();
        match scope {
            HostScope::Root => {
                for op in ops {
                    match op {
                        HostOp::Hide(tab) => self.set_container_visible(&tab, false),
                        HostOp::Show(tab) => self.set_container_visible(&tab, true),
                        HostOp::Attach { .. } => {}
                    }
                }
            }
            HostScope::Container(id) => {
                let Some(slot) = self.slot_mut(id) else {
                    return;
                };
                let mut reverts = Vec::new();
                for op in ops {
                    match op {
                        HostOp::Attach { screen, tag } => {
                            reverts.push(Revert::Detach(tag.clone()));
                            slot.screens.push(AttachedScreen {
                                tag,
                                screen,
                                visible: true,
                            });
                        }
                        HostOp::Hide(tag) => {
                            slot.set_visible(&tag, false);
                            reverts.push(Revert::Show(tag));
                        }
                        HostOp::Show(tag) => {
                            slot.set_visible(&tag, true);
                            reverts.push(Revert::Hide(tag));
                        }
                    }
                }
                if back_level {
                    slot.back_levels.push(BackLevel { reverts });
                }
            }
        }
    }

    fn record(&mut self, call: HostCall) {
        self.journal.push(call);
        self.trim_journal();
    }

    fn trim_journal(&mut self) {
        if self.journal.len() > self.journal_limit {
            let excess = self.journal.len() - self.journal_limit;
            self.journal.drain(..excess);
        }
    }

    fn set_container_visible(&mut self, tab: &str, visible: bool) {
        if let Some(slot) = self.containers.iter_mut().find(|slot| slot.tab == tab) {
            slot.visible = visible;
        }
    }
}

fn record_ops<S>(transaction: &Transaction<S>) -> Vec<OpRecord> {
    transaction
        .ops()
        .iter()
        .map(|op| match op {
            HostOp::Attach { tag, .. } => OpRecord::Attach(tag.clone()),
            HostOp::Hide(tag) => OpRecord::Hide(tag.clone()),
            HostOp::Show(tag) => OpRecord::Show(tag.clone()),
        })
        .collect()
}

impl<S: Screen> ScreenHost for MemoryScreenHost<S> {
    type Screen = S;

    fn attach_container(&mut self, tab: &str) -> Result<ContainerId> {
        self.flush();
        if self.slot_by_tab(tab).is_some() {
            return Err(NavError::Host(format!("container `{tab}` already attached")));
        }
        let id = ContainerId::new(self.next_container);
        self.next_container += 1;
        self.containers.push(ContainerSlot {
            id,
            tab: tab.to_string(),
            visible: true,
            screens: Vec::new(),
            back_levels: Vec::new(),
        });
        self.record(HostCall::AttachContainer {
            tab: tab.to_string(),
            container: id,
        });
        Ok(id)
    }

    fn find_container(&mut self, tab: &str) -> Option<ContainerId> {
        self.flush();
        self.slot_by_tab(tab).map(|slot| slot.id)
    }

    fn commit(
        &mut self,
        scope: HostScope,
        transaction: Transaction<S>,
        mode: CommitMode,
    ) -> Result<()> {
        self.flush();
        self.validate(scope, &transaction)?;
        self.record(HostCall::Commit {
            scope,
            mode,
            ops: record_ops(&transaction),
            back_level: transaction.adds_back_level(),
        });
        match mode {
            CommitMode::Immediate => self.apply(scope, transaction),
            CommitMode::Deferred => self.pending.push((scope, transaction)),
        }
        Ok(())
    }

    fn find_by_tag(&mut self, scope: HostScope, tag: &str) -> bool {
        self.flush();
        match scope {
            HostScope::Root => self.slot_by_tab(tag).is_some(),
            HostScope::Container(id) => self
                .slot(id)
                .map(|slot| slot.screens.iter().any(|entry| entry.tag == tag))
                .unwrap_or(false),
        }
    }

    fn screen_tags(&mut self, container: ContainerId) -> Vec<String> {
        self.flush();
        self.slot(container)
            .map(|slot| slot.screens.iter().map(|entry| entry.tag.clone()).collect())
            .unwrap_or_default()
    }

    fn back_level_count(&mut self, container: ContainerId) -> usize {
        self.flush();
        self.slot(container)
            .map(|slot| slot.back_levels.len())
            .unwrap_or(0)
    }

    fn pop_back_level(&mut self, container: ContainerId) -> Result<bool> {
        self.flush();
        let slot = self
            .slot_mut(container)
            .ok_or_else(|| NavError::Host(format!("unknown container {}", container.raw())))?;
        let popped = match slot.back_levels.pop() {
            Some(level) => {
                for revert in level.reverts.into_iter().rev() {
                    match revert {
                        Revert::Detach(tag) => slot.detach(&tag),
                        Revert::Show(tag) => slot.set_visible(&tag, true),
                        Revert::Hide(tag) => slot.set_visible(&tag, false),
                    }
                }
                true
            }
            None => false,
        };
        self.record(HostCall::PopBackLevel { container, popped });
        Ok(popped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Page(&'static str);

    impl Screen for Page {
        fn kind(&self) -> &str {
            self.0
        }
    }

    fn host_with_root() -> (MemoryScreenHost<Page>, ContainerId) {
        let mut host = MemoryScreenHost::new();
        let id = host.attach_container("main").unwrap();
        let mut tx = Transaction::new();
        tx.attach(Page("home"), "home:1");
        host.commit(HostScope::Container(id), tx, CommitMode::Immediate)
            .unwrap();
        (host, id)
    }

    #[test]
    fn deferred_commit_applies_before_queries() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.hide("home:1").attach(Page("profile"), "profile:2");
        host.commit(HostScope::Container(id), tx, CommitMode::Deferred)
            .unwrap();
        assert_eq!(host.pending_len(), 1);
        assert!(host.find_by_tag(HostScope::Container(id), "profile:2"));
        assert_eq!(host.pending_len(), 0);
        assert_eq!(host.visible_tags("main"), vec!["profile:2"]);
    }

    #[test]
    fn pop_back_level_reverts_transaction() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.hide("home:1")
            .attach(Page("profile"), "profile:2")
            .add_to_back_stack();
        host.commit(HostScope::Container(id), tx, CommitMode::Immediate)
            .unwrap();
        assert_eq!(host.back_level_count(id), 1);

        assert!(host.pop_back_level(id).unwrap());
        assert_eq!(host.back_level_count(id), 0);
        assert_eq!(host.attached_tags("main"), vec!["home:1"]);
        assert_eq!(host.visible_tags("main"), vec!["home:1"]);
        assert!(!host.pop_back_level(id).unwrap());
    }

    #[test]
    fn invalid_transaction_is_rejected_whole() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.hide("home:1").show("missing:9");
        let err = host
            .commit(HostScope::Container(id), tx, CommitMode::Immediate)
            .unwrap_err();
        assert!(matches!(err, NavError::Host(_)));
        assert_eq!(host.visible_tags("main"), vec!["home:1"]);
    }

    #[test]
    fn duplicate_attach_is_rejected() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.attach(Page("home"), "home:1");
        assert!(
            host.commit(HostScope::Container(id), tx, CommitMode::Immediate)
                .is_err()
        );
    }

    #[test]
    fn root_scope_toggles_containers() {
        let (mut host, _) = host_with_root();
        host.attach_container("favorites").unwrap();
        let mut tx = Transaction::new();
        tx.hide("main").show("favorites");
        host.commit(HostScope::Root, tx, CommitMode::Immediate)
            .unwrap();
        assert_eq!(host.visible_tabs(), vec!["favorites"]);
    }

    #[test]
    fn recreate_resets_visibility_but_keeps_history() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.hide("home:1")
            .attach(Page("profile"), "profile:2")
            .add_to_back_stack();
        host.commit(HostScope::Container(id), tx, CommitMode::Deferred)
            .unwrap();

        let mut host = host.recreate();
        assert!(host.journal().is_empty());
        assert_eq!(host.find_container("main"), Some(id));
        assert_eq!(host.back_level_count(id), 1);
        assert_eq!(host.visible_tags("main"), vec!["home:1", "profile:2"]);
    }

    #[test]
    fn journal_keeps_most_recent_calls() {
        let (host, id) = host_with_root();
        let mut host = host.with_journal_limit(2);
        assert_eq!(host.journal().len(), 2);
        for tag in ["home:1", "home:1", "home:1"] {
            let mut tx = Transaction::new();
            tx.hide(tag);
            host.commit(HostScope::Container(id), tx, CommitMode::Immediate)
                .unwrap();
        }
        assert!(host.pop_back_level(id).is_ok());
        let journal = host.journal();
        assert_eq!(journal.len(), 2);
        assert_eq!(
            journal[1],
            HostCall::PopBackLevel {
                container: id,
                popped: false
            }
        );
    }

    #[test]
    fn screen_tags_list_hidden_screens_too() {
        let (mut host, id) = host_with_root();
        let mut tx = Transaction::new();
        tx.hide("home:1").attach(Page("profile"), "profile:2");
        host.commit(HostScope::Container(id), tx, CommitMode::Deferred)
            .unwrap();
        assert_eq!(host.screen_tags(id), vec!["home:1", "profile:2"]);
        assert_eq!(host.screen("main", "profile:2"), Some(&Page("profile")));
        assert!(host.screen_tags(ContainerId::new(99)).is_empty());
    }
}
