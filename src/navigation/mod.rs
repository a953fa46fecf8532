//! Multi-stack tab navigation.
//!
//! [`NavigationManager`] owns one [`Stack`] per tab, tracks the selected tab
//! and implements back navigation: unwind the selected stack first, then fall
//! back to the home tab. [`NavigationState`] is what survives a restart.

pub mod audit;
pub mod config;
mod manager;
mod navigator;
mod stack;
pub mod state;
pub mod tag;

#[cfg(test)]
pub(crate) mod test_support;

pub use audit::{
    BufferedAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditStage, NullNavigationAudit,
};
pub use config::NavigationConfig;
pub use manager::{NavigationManager, ScreenFactory, TabSpec};
pub use navigator::Navigator;
pub use stack::Stack;
pub use state::{NavigationState, StateBag};
pub use tag::{ScreenTag, SequentialTagSource, TagSource, UuidTagSource};
