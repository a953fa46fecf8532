//! Tab navigation controller with one independent screen stack per tab.
//!
//! The crate decides which screen is visible and why; an external
//! [`ScreenHost`] performs the actual attach/hide/show work. A reference
//! in-memory host and a small terminal demo shell ship alongside the core.

pub mod error;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod navigation;
pub mod shell;
pub mod width;

pub use error::{NavError, Result};
pub use host::{
    CommitMode, ContainerId, HostOp, HostScope, MemoryScreenHost, Screen, ScreenHost, Transaction,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, NavigationMetrics};
pub use navigation::{
    BufferedAudit, NavigationAudit, NavigationAuditEvent, NavigationAuditStage, NavigationConfig,
    NavigationManager, NavigationState, Navigator, NullNavigationAudit, ScreenFactory, ScreenTag,
    SequentialTagSource, Stack, StateBag, TabSpec, TagSource, UuidTagSource,
};
pub use shell::{DemoScreen, DemoShell, ShellOutcome};
pub use width::display_width;
