//! Screen host contract consumed by the navigation core.
//!
//! The host owns the real screen lifecycle: it creates containers, mounts
//! screens, toggles their visibility and keeps a poppable history per
//! container. The core only describes what should happen as a
//! [`Transaction`] and hands it over.

use crate::Result;

pub mod memory;

pub use memory::{HostCall, MemoryScreenHost, OpRecord};

/// Anything the host can mount. `kind` names the screen type and prefixes
/// every tag generated for it.
pub trait Screen {
    fn kind(&self) -> &str;
}

impl<T: Screen + ?Sized> Screen for Box<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }
}

/// Opaque handle to one tab's container inside the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u32);

impl ContainerId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Where a transaction applies. Tab containers live in `Root`, tagged by tab
/// name; screens live inside a `Container`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostScope {
    Root,
    Container(ContainerId),
}

/// Whether a transaction must be observable when `commit` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    Immediate,
    /// The host may queue the transaction but must apply it before answering
    /// any later query or commit.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp<S> {
    Attach { screen: S, tag: String },
    Hide(String),
    Show(String),
}

/// Batch of host operations applied as one visual update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction<S> {
    ops: Vec<HostOp<S>>,
    add_to_back_stack: bool,
}

impl<S> Default for Transaction<S> {
    fn default() -> Self {
        Self {
            ops: Vec::new(),
            add_to_back_stack: false,
        }
    }
}

impl<S> Transaction<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, screen: S, tag: impl Into<String>) -> &mut Self {
        self.ops.push(HostOp::Attach {
            screen,
            tag: tag.into(),
        });
        self
    }

    pub fn hide(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(HostOp::Hide(tag.into()));
        self
    }

    pub fn show(&mut self, tag: impl Into<String>) -> &mut Self {
        self.ops.push(HostOp::Show(tag.into()));
        self
    }

    /// Record this transaction as one poppable back level.
    pub fn add_to_back_stack(&mut self) -> &mut Self {
        self.add_to_back_stack = true;
        self
    }

    pub fn ops(&self) -> &[HostOp<S>] {
        &self.ops
    }

    pub fn adds_back_level(&self) -> bool {
        self.add_to_back_stack
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && !self.add_to_back_stack
    }

    pub fn into_parts(self) -> (Vec<HostOp<S>>, bool) {
        (self.ops, self.add_to_back_stack)
    }
}

/// Operations the navigation core issues against the hosting runtime.
///
/// Queries take `&mut self` so hosts with deferred commits can flush their
/// queue first.
pub trait ScreenHost {
    type Screen: Screen;

    /// Register a new, visible container for `tab` in the root scope.
    fn attach_container(&mut self, tab: &str) -> Result<ContainerId>;

    /// Container previously attached for `tab`, if the host still has it.
    fn find_container(&mut self, tab: &str) -> Option<ContainerId>;

    fn commit(
        &mut self,
        scope: HostScope,
        transaction: Transaction<Self::Screen>,
        mode: CommitMode,
    ) -> Result<()>;

    fn find_by_tag(&mut self, scope: HostScope, tag: &str) -> bool;

    /// Every screen tag attached inside `container`, in attach order.
    fn screen_tags(&mut self, container: ContainerId) -> Vec<String>;

    fn back_level_count(&mut self, container: ContainerId) -> usize;

    /// Revert the most recent back level. `Ok(false)` when none remain.
    fn pop_back_level(&mut self, container: ContainerId) -> Result<bool>;
}
