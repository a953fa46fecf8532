use serde_json::json;

use crate::host::{CommitMode, ContainerId, HostScope, Screen, ScreenHost, Transaction};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::{NavError, Result};

use super::config::DEFAULT_LOG_TARGET;
use super::tag::{ScreenTag, TagSource};

/// Navigation history of one tab, bottom to top.
///
/// The last tag is the only visible screen in the tab's container. The list
/// is never empty once constructed.
#[derive(Clone)]
pub struct Stack {
    tab: String,
    container: ContainerId,
    tags: Vec<ScreenTag>,
    logger: Option<Logger>,
    log_target: String,
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("tab", &self.tab)
            .field("container", &self.container)
            .field("tags", &self.tags)
            .finish()
    }
}

impl Stack {
    /// Build a stack from persisted tags when present and non-empty,
    /// otherwise from a freshly created root screen.
    pub fn new<H: ScreenHost>(
        host: &mut H,
        source: &mut dyn TagSource,
        tab: &str,
        container: ContainerId,
        root: &dyn Fn() -> H::Screen,
        persisted: Option<Vec<ScreenTag>>,
    ) -> Result<Self> {
        match persisted {
            Some(tags) if !tags.is_empty() => Self::restore(host, tab, container, tags),
            _ => Self::fresh(host, source, tab, container, root()),
        }
    }

    /// Attach `root` as the bottom of a new stack. The root never gets a back
    /// level, so it can only be left by switching tabs.
    pub fn fresh<H: ScreenHost>(
        host: &mut H,
        source: &mut dyn TagSource,
        tab: &str,
        container: ContainerId,
        root: H::Screen,
    ) -> Result<Self> {
        let mut stack = Self::empty(tab, container);
        stack.push(host, source, root, false)?;
        Ok(stack)
    }

    /// Adopt persisted tags whose screens the host already recreated, and
    /// hide every screen in the container except the top.
    pub fn restore<H: ScreenHost>(
        host: &mut H,
        tab: &str,
        container: ContainerId,
        tags: Vec<ScreenTag>,
    ) -> Result<Self> {
        let Some(top) = tags.last() else {
            return Err(NavError::RestoreInconsistency {
                tab: tab.to_string(),
                reason: "no persisted tags".to_string(),
            });
        };

        let scope = HostScope::Container(container);
        for (index, tag) in tags.iter().enumerate() {
            if tags[..index].contains(tag) {
                return Err(NavError::RestoreInconsistency {
                    tab: tab.to_string(),
                    reason: format!("tag `{tag}` persisted twice"),
                });
            }
            if !host.find_by_tag(scope, tag.as_str()) {
                return Err(NavError::RestoreInconsistency {
                    tab: tab.to_string(),
                    reason: format!("host has no screen tagged `{tag}`"),
                });
            }
        }

        // The host may have lost visibility flags while it was recreated, and
        // may still hold screens pushed after the state was saved.
        let mut transaction = Transaction::new();
        for tag in host.screen_tags(container) {
            if tag != top.as_str() {
                transaction.hide(tag);
            }
        }
        transaction.show(top.as_str());
        host.commit(scope, transaction, CommitMode::Deferred)?;

        let mut stack = Self::empty(tab, container);
        stack.tags = tags;
        Ok(stack)
    }

    fn empty(tab: &str, container: ContainerId) -> Self {
        Self {
            tab: tab.to_string(),
            container,
            tags: Vec::new(),
            logger: None,
            log_target: format!("{DEFAULT_LOG_TARGET}.stack"),
        }
    }

    pub fn with_logger(mut self, logger: Option<Logger>, target: impl Into<String>) -> Self {
        self.logger = logger;
        self.log_target = target.into();
        self
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn tags(&self) -> &[ScreenTag] {
        &self.tags
    }

    pub fn top(&self) -> Option<&ScreenTag> {
        self.tags.last()
    }

    pub fn depth(&self) -> usize {
        self.tags.len()
    }

    /// Hide the current top, attach `screen` above it and return its tag.
    pub fn push<H: ScreenHost>(
        &mut self,
        host: &mut H,
        source: &mut dyn TagSource,
        screen: H::Screen,
        add_to_back_stack: bool,
    ) -> Result<ScreenTag> {
        let scope = HostScope::Container(self.container);
        let tag = source.next_tag(screen.kind());
        if self.tags.contains(&tag) || host.find_by_tag(scope, tag.as_str()) {
            return Err(NavError::TagCollision(tag.into_inner()));
        }

        let mut transaction = Transaction::new();
        if let Some(top) = self.tags.last() {
            transaction.hide(top.as_str());
        }
        transaction.attach(screen, tag.as_str());
        if add_to_back_stack {
            transaction.add_to_back_stack();
        }
        host.commit(scope, transaction, CommitMode::Deferred)?;

        self.tags.push(tag.clone());
        self.log(
            LogLevel::Debug,
            "screen_pushed",
            [
                json_kv("tag", tag.as_str()),
                json_kv("depth", json!(self.tags.len())),
                json_kv("back_stack", add_to_back_stack),
            ],
        );
        Ok(tag)
    }

    /// Undo the most recent back level. `false` when nothing is poppable.
    pub fn pop_back<H: ScreenHost>(&mut self, host: &mut H) -> Result<bool> {
        let levels = host.back_level_count(self.container);
        if levels == 0 {
            return Ok(false);
        }
        if self.tags.len() <= 1 {
            self.log(
                LogLevel::Warn,
                "back_levels_without_tags",
                [json_kv("host_levels", json!(levels))],
            );
            return Ok(false);
        }
        if !host.pop_back_level(self.container)? {
            return Ok(false);
        }

        if let Some(tag) = self.tags.pop() {
            self.log(
                LogLevel::Debug,
                "screen_popped",
                [
                    json_kv("tag", tag.as_str()),
                    json_kv("depth", json!(self.tags.len())),
                ],
            );
        }
        Ok(true)
    }

    /// Tags to persist under this tab's key.
    pub fn serialize(&self) -> Vec<ScreenTag> {
        self.tags.clone()
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let fields = std::iter::once(json_kv("tab", self.tab.as_str())).chain(fields);
            let event = event_with_fields(level, &self.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::navigation::tag::SequentialTagSource;
    use crate::navigation::test_support::{Page, TestHost};

    struct Fixture {
        host: TestHost,
        source: SequentialTagSource,
        stack: Stack,
    }

    fn fixture() -> Fixture {
        let mut host = TestHost::new();
        let mut source = SequentialTagSource::new();
        let container = host.attach_container("main").unwrap();
        let stack = Stack::new(
            &mut host,
            &mut source,
            "main",
            container,
            &|| Page::new("home"),
            None,
        )
        .unwrap();
        Fixture {
            host,
            source,
            stack,
        }
    }

    #[test]
    fn fresh_stack_holds_only_root() {
        let mut fx = fixture();
        assert_eq!(fx.stack.depth(), 1);
        assert_eq!(fx.stack.top().unwrap().as_str(), "home:1");
        assert_eq!(fx.host.back_level_count(fx.stack.container()), 0);
        assert_eq!(fx.host.visible_tags("main"), vec!["home:1"]);
    }

    #[test]
    fn push_hides_previous_top() {
        let mut fx = fixture();
        let tag = fx
            .stack
            .push(&mut fx.host, &mut fx.source, Page::new("profile"), true)
            .unwrap();
        assert_eq!(tag.as_str(), "profile:2");
        assert_eq!(fx.stack.depth(), 2);
        assert_eq!(fx.host.visible_tags("main"), vec!["profile:2"]);
        assert_eq!(fx.host.back_level_count(fx.stack.container()), 1);
    }

    #[test]
    fn pop_reveals_previous_screen() {
        let mut fx = fixture();
        fx.stack
            .push(&mut fx.host, &mut fx.source, Page::new("profile"), true)
            .unwrap();
        assert!(fx.stack.pop_back(&mut fx.host).unwrap());
        assert_eq!(fx.stack.tags(), &[ScreenTag::from("home:1")]);
        assert_eq!(fx.host.visible_tags("main"), vec!["home:1"]);
        assert!(!fx.stack.pop_back(&mut fx.host).unwrap());
        assert_eq!(fx.stack.depth(), 1);
    }

    #[test]
    fn depth_tracks_back_stack_pushes_and_pops() {
        let mut fx = fixture();
        let script = [true, true, false, true, false, false, false, true, false];
        let mut pushes = 0usize;
        let mut pops = 0usize;
        for (step, push) in script.into_iter().enumerate() {
            if push {
                fx.stack
                    .push(&mut fx.host, &mut fx.source, Page::new(&format!("s{step}")), true)
                    .unwrap();
                pushes += 1;
            } else if fx.stack.pop_back(&mut fx.host).unwrap() {
                pops += 1;
            }
            assert_eq!(fx.stack.depth(), 1 + pushes - pops);
            assert!(fx.stack.depth() >= 1);
            assert_eq!(
                fx.host.back_level_count(fx.stack.container()),
                fx.stack.depth() - 1
            );
        }
    }

    #[test]
    fn tag_collision_is_fatal() {
        let mut fx = fixture();
        let mut replay = SequentialTagSource::new();
        let err = fx
            .stack
            .push(&mut fx.host, &mut replay, Page::new("home"), true)
            .unwrap_err();
        assert!(matches!(err, NavError::TagCollision(tag) if tag == "home:1"));
        assert_eq!(fx.stack.depth(), 1);
    }

    #[test]
    fn restore_hides_all_but_top() {
        let mut fx = fixture();
        fx.stack
            .push(&mut fx.host, &mut fx.source, Page::new("profile"), true)
            .unwrap();
        fx.stack
            .push(&mut fx.host, &mut fx.source, Page::new("detail"), true)
            .unwrap();
        let saved = fx.stack.serialize();
        let container = fx.stack.container();

        let mut host = fx.host.recreate();
        assert_eq!(host.visible_tags("main").len(), 3);

        let restored = Stack::new(
            &mut host,
            &mut fx.source,
            "main",
            container,
            &|| -> Page { panic!("root factory must not run on restore") },
            Some(saved.clone()),
        )
        .unwrap();
        assert_eq!(restored.tags(), saved.as_slice());
        assert_eq!(host.visible_tags("main"), vec!["detail:3"]);
    }

    #[test]
    fn restore_rejects_unknown_tags() {
        let mut fx = fixture();
        let container = fx.stack.container();
        let err = Stack::restore(
            &mut fx.host,
            "main",
            container,
            vec!["home:1".into(), "ghost:9".into()],
        )
        .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn empty_persisted_list_builds_fresh_root() {
        let mut host = TestHost::new();
        let mut source = SequentialTagSource::new();
        let container = host.attach_container("main").unwrap();
        let stack = Stack::new(
            &mut host,
            &mut source,
            "main",
            container,
            &|| Page::new("home"),
            Some(Vec::new()),
        )
        .unwrap();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn pop_refuses_to_drop_root_when_host_disagrees() {
        let mut fx = fixture();
        fx.stack
            .push(&mut fx.host, &mut fx.source, Page::new("profile"), true)
            .unwrap();
        let container = fx.stack.container();
        let sink = MemorySink::new();
        let mut desynced = Stack::restore(
            &mut fx.host,
            "main",
            container,
            vec!["home:1".into()],
        )
        .unwrap()
        .with_logger(Some(Logger::new(sink.clone())), "tabnav::test.stack");

        assert_eq!(fx.host.back_level_count(container), 1);
        assert!(!desynced.pop_back(&mut fx.host).unwrap());
        assert_eq!(desynced.depth(), 1);
        assert_eq!(
            sink.messages_at(LogLevel::Warn),
            vec!["back_levels_without_tags"]
        );
    }

    #[test]
    fn restore_hides_screens_missing_from_saved_tags() {
        let mut fx = fixture();
        let saved = fx.stack.serialize();
        fx.stack
            .push(&mut fx.host, &mut fx.source, Page::new("profile"), true)
            .unwrap();
        let container = fx.stack.container();

        let mut host = fx.host.recreate();
        let restored = Stack::restore(&mut host, "main", container, saved).unwrap();
        assert_eq!(host.visible_tags("main"), vec!["home:1"]);
        assert_eq!(
            host.displayed().map(|(tag, _)| tag.to_string()),
            restored.top().map(|tag| tag.as_str().to_string())
        );
    }
}
