//! Shared fixtures for navigation tests.

use crate::host::{MemoryScreenHost, Screen};

use super::manager::{NavigationManager, TabSpec};
use super::tag::SequentialTagSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Page {
    kind: String,
}

impl Page {
    pub(crate) fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
        }
    }
}

impl Screen for Page {
    fn kind(&self) -> &str {
        &self.kind
    }
}

pub(crate) type TestHost = MemoryScreenHost<Page>;
pub(crate) type TestManager = NavigationManager<TestHost>;

pub(crate) const TABS: [&str; 3] = ["main", "favorites", "basket"];

pub(crate) fn tab_specs() -> Vec<TabSpec<Page>> {
    TABS.into_iter()
        .map(|tab| TabSpec::new(tab, move || Page::new(&format!("{tab}-root"))))
        .collect()
}

pub(crate) fn manager() -> TestManager {
    NavigationManager::with_tag_source(TestHost::new(), SequentialTagSource::new())
}

pub(crate) fn initialized() -> TestManager {
    let mut nav = manager();
    nav.init(tab_specs(), None).expect("init");
    nav
}
