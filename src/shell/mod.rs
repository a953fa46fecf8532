//! Demo host shell.
//!
//! Plays the part of the application screen that owns the navigator: it
//! registers the `main`, `favorites` and `basket` tabs, forwards back presses
//! and save-state requests, and can simulate a restart by recreating the host
//! from its own state and restoring navigation from the saved bag.

use serde_json::{Map, Value, json};

use crate::host::{MemoryScreenHost, Screen};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::navigation::{NavigationConfig, NavigationManager, NavigationState, Navigator, TabSpec};
use crate::width::pad_to_width;
use crate::{NavError, Result};

pub mod driver;

pub const MAIN_TAB: &str = "main";
pub const FAVORITES_TAB: &str = "favorites";
pub const BASKET_TAB: &str = "basket";
pub const TABS: [&str; 3] = [MAIN_TAB, FAVORITES_TAB, BASKET_TAB];

const SHELL_TARGET: &str = "tabnav::shell";
const TAB_LABEL_WIDTH: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoScreen {
    Home,
    Favorites,
    Basket,
    Profile,
    Detail(u32),
}

impl DemoScreen {
    pub fn title(&self) -> String {
        match self {
            DemoScreen::Home => "Home".to_string(),
            DemoScreen::Favorites => "Favorites".to_string(),
            DemoScreen::Basket => "Basket".to_string(),
            DemoScreen::Profile => "Profile".to_string(),
            DemoScreen::Detail(n) => format!("Detail #{n}"),
        }
    }
}

impl Screen for DemoScreen {
    fn kind(&self) -> &str {
        match self {
            DemoScreen::Home => "home",
            DemoScreen::Favorites => "favorites",
            DemoScreen::Basket => "basket",
            DemoScreen::Profile => "profile",
            DemoScreen::Detail(_) => "detail",
        }
    }
}

pub type DemoHost = MemoryScreenHost<DemoScreen>;

/// What the shell should do after forwarding a back press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOutcome {
    Handled,
    Exit,
}

pub fn demo_tabs() -> Vec<TabSpec<DemoScreen>> {
    vec![
        TabSpec::new(MAIN_TAB, || DemoScreen::Home),
        TabSpec::new(FAVORITES_TAB, || DemoScreen::Favorites),
        TabSpec::new(BASKET_TAB, || DemoScreen::Basket),
    ]
}

pub struct DemoShell {
    navigator: Navigator<DemoHost>,
    config: NavigationConfig,
    details_opened: u32,
}

impl DemoShell {
    /// Build the navigator over `host`, restoring from `saved` when given.
    pub fn create(
        host: DemoHost,
        config: NavigationConfig,
        saved: Option<&Map<String, Value>>,
    ) -> Result<Self> {
        Self::create_with(NavigationManager::new(host), config, saved)
    }

    pub fn create_with(
        manager: NavigationManager<DemoHost>,
        config: NavigationConfig,
        saved: Option<&Map<String, Value>>,
    ) -> Result<Self> {
        let state = saved.map(NavigationState::read_from).transpose()?;
        let navigator = Navigator::new(manager.with_config(config.clone()));
        navigator.init(demo_tabs(), state.as_ref())?;
        let details_opened = navigator.with_mut(|nav| Ok(last_detail(nav)))?;
        Ok(Self {
            navigator,
            config,
            details_opened,
        })
    }

    /// Handle for screens that need to navigate.
    pub fn navigator(&self) -> &Navigator<DemoHost> {
        &self.navigator
    }

    pub fn select(&self, tab: &str) -> Result<()> {
        self.navigator.select(tab)
    }

    pub fn open_profile(&self) -> Result<()> {
        self.navigator.push(DemoScreen::Profile).map(|_| ())
    }

    pub fn open_detail(&mut self) -> Result<()> {
        self.details_opened += 1;
        self.navigator
            .push(DemoScreen::Detail(self.details_opened))
            .map(|_| ())
    }

    pub fn back(&self) -> Result<ShellOutcome> {
        if self.navigator.pop_back()? {
            Ok(ShellOutcome::Handled)
        } else {
            self.log(LogLevel::Info, "back_exits", std::iter::empty());
            Ok(ShellOutcome::Exit)
        }
    }

    /// Saved-state bag as the platform would persist it.
    pub fn save_state(&self) -> Result<Map<String, Value>> {
        let mut bag = Map::new();
        self.navigator.with(|nav| nav.save_into(&mut bag))??;
        Ok(bag)
    }

    /// Save, tear the host down, recreate it and restore navigation.
    pub fn restart(self) -> Result<Self> {
        let bag = self.save_state()?;
        self.log(
            LogLevel::Info,
            "restart",
            [json_kv("saved_keys", json!(bag.len()))],
        );
        let config = self.config.clone();
        let manager = self
            .navigator
            .into_inner()
            .map_err(|_| NavError::Reentrant)?;
        let host = manager.into_host().recreate();
        Self::create(host, config, Some(&bag))
    }

    /// Text frame: tab bar, the visible screen and key hints.
    pub fn render(&self) -> Result<String> {
        self.navigator.with_mut(|nav| {
            let selected = nav.selected_tab().unwrap_or(MAIN_TAB).to_string();
            let depth = nav.stack(&selected).map(|stack| stack.depth()).unwrap_or(0);

            let mut bar = String::new();
            for (index, tab) in TABS.iter().enumerate() {
                let label = format!(" {} {} ", index + 1, tab);
                let label = if *tab == selected {
                    format!("\x1b[7m{label}\x1b[0m")
                } else {
                    label
                };
                bar.push_str(&pad_to_width(&label, TAB_LABEL_WIDTH));
            }

            let title = nav
                .host_mut()
                .displayed()
                .map(|(_, screen)| screen.title())
                .unwrap_or_else(|| "(nothing visible)".to_string());

            Ok([
                bar,
                String::new(),
                format!("  {title}"),
                format!("  depth {depth} in {selected}"),
                String::new(),
                "  1/2/3 tabs · p profile · d detail · Esc back · r restart · q quit"
                    .to_string(),
            ]
            .join("\n"))
        })
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, SHELL_TARGET, message, fields));
        }
    }
}

/// Highest detail number still on any restored stack.
fn last_detail(nav: &mut NavigationManager<DemoHost>) -> u32 {
    let entries: Vec<(String, String)> = TABS
        .iter()
        .filter_map(|tab| nav.stack(tab))
        .flat_map(|stack| {
            stack
                .tags()
                .iter()
                .map(move |tag| (stack.tab().to_string(), tag.as_str().to_string()))
        })
        .collect();
    let host = nav.host_mut();
    entries
        .iter()
        .filter_map(|(tab, tag)| match host.screen(tab, tag) {
            Some(DemoScreen::Detail(n)) => Some(*n),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_width;
    use crate::logging::{Logger, MemorySink};

    fn shell() -> DemoShell {
        DemoShell::create(DemoHost::new(), NavigationConfig::default(), None).unwrap()
    }

    fn displayed_title(shell: &DemoShell) -> String {
        shell
            .navigator()
            .with_mut(|nav| {
                Ok(nav
                    .host_mut()
                    .displayed()
                    .map(|(_, screen)| screen.title()))
            })
            .unwrap()
            .unwrap()
    }

    #[test]
    fn starts_on_home() {
        let shell = shell();
        assert_eq!(shell.navigator().selected_tab().as_deref(), Some(MAIN_TAB));
        assert_eq!(displayed_title(&shell), "Home");
    }

    #[test]
    fn back_exits_only_from_home_root() {
        let mut shell = shell();
        shell.select(BASKET_TAB).unwrap();
        shell.open_detail().unwrap();
        assert_eq!(displayed_title(&shell), "Detail #1");

        assert_eq!(shell.back().unwrap(), ShellOutcome::Handled);
        assert_eq!(displayed_title(&shell), "Basket");
        assert_eq!(shell.back().unwrap(), ShellOutcome::Handled);
        assert_eq!(displayed_title(&shell), "Home");
        assert_eq!(shell.back().unwrap(), ShellOutcome::Exit);
    }

    #[test]
    fn save_state_uses_flat_keys() {
        let shell = shell();
        shell.open_profile().unwrap();
        let bag = shell.save_state().unwrap();
        assert_eq!(bag.get("selected"), Some(&json!(MAIN_TAB)));
        for tab in TABS {
            assert!(bag.contains_key(&format!("{tab}_tags")), "missing {tab}");
        }
        assert_eq!(bag["main_tags"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn restart_restores_tabs_and_history() {
        let sink = MemorySink::new();
        let config = NavigationConfig::default().with_logger(Logger::new(sink.clone()));
        let mut shell = DemoShell::create(DemoHost::new(), config, None).unwrap();
        shell.select(FAVORITES_TAB).unwrap();
        shell.open_detail().unwrap();
        shell.open_profile().unwrap();
        let before = shell.save_state().unwrap();

        let shell = shell.restart().unwrap();
        assert_eq!(shell.save_state().unwrap(), before);
        assert_eq!(
            shell.navigator().selected_tab().as_deref(),
            Some(FAVORITES_TAB)
        );
        assert_eq!(displayed_title(&shell), "Profile");

        assert_eq!(shell.back().unwrap(), ShellOutcome::Handled);
        assert_eq!(displayed_title(&shell), "Detail #1");
        assert!(sink.messages_at(LogLevel::Info).contains(&"restart".to_string()));
        assert!(sink.messages_at(LogLevel::Warn).is_empty());
    }

    #[test]
    fn detail_numbers_continue_after_restart() {
        let mut shell = shell();
        shell.open_detail().unwrap();
        shell.select(BASKET_TAB).unwrap();
        shell.open_detail().unwrap();

        let mut shell = shell.restart().unwrap();
        shell.open_detail().unwrap();
        assert_eq!(displayed_title(&shell), "Detail #3");
    }

    #[test]
    fn render_highlights_selected_tab() {
        let shell = shell();
        shell.select(FAVORITES_TAB).unwrap();
        let frame = shell.render().unwrap();
        let bar = frame.lines().next().unwrap();
        assert!(bar.contains("\x1b[7m 2 favorites \x1b[0m"));
        assert_eq!(display_width(bar), TAB_LABEL_WIDTH * TABS.len());
        assert!(frame.contains("Favorites"));
        assert!(frame.contains("depth 1 in favorites"));
    }
}
