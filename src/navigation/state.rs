//! Persisted navigation state and the flat key/value bag it is stored in.
//!
//! Layout: `{ "selected": "<tab>", "<tab>_tags": ["<tag>", ...] }`. Keys that
//! match neither form belong to the host and are left alone.

use std::collections::{BTreeMap, HashMap};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{NavError, Result};

use super::tag::ScreenTag;

pub const SELECTED_KEY: &str = "selected";
pub const TAGS_SUFFIX: &str = "_tags";

/// Flat string-keyed bag supplied by the host shell.
pub trait StateBag {
    fn get_value(&self, key: &str) -> Option<&Value>;
    fn put_value(&mut self, key: String, value: Value);
    fn keys(&self) -> Vec<String>;
}

impl StateBag for Map<String, Value> {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn put_value(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }

    fn keys(&self) -> Vec<String> {
        Map::keys(self).cloned().collect()
    }
}

impl StateBag for BTreeMap<String, Value> {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn put_value(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).cloned().collect()
    }
}

impl StateBag for HashMap<String, Value> {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn put_value(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }

    fn keys(&self) -> Vec<String> {
        HashMap::keys(self).cloned().collect()
    }
}

/// Selected tab plus every tab's tag history, bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    selected: Option<String>,
    tabs: BTreeMap<String, Vec<ScreenTag>>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags_key(tab: &str) -> String {
        format!("{tab}{TAGS_SUFFIX}")
    }

    pub fn with_selected(mut self, tab: impl Into<String>) -> Self {
        self.selected = Some(tab.into());
        self
    }

    pub fn set_selected(&mut self, tab: impl Into<String>) {
        self.selected = Some(tab.into());
    }

    pub fn insert_tab(&mut self, tab: impl Into<String>, tags: Vec<ScreenTag>) {
        self.tabs.insert(tab.into(), tags);
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn tags(&self, tab: &str) -> Option<&[ScreenTag]> {
        self.tabs.get(tab).map(Vec::as_slice)
    }

    pub fn tabs(&self) -> impl Iterator<Item = (&str, &[ScreenTag])> {
        self.tabs
            .iter()
            .map(|(tab, tags)| (tab.as_str(), tags.as_slice()))
    }

    pub fn write_to<B: StateBag + ?Sized>(&self, bag: &mut B) {
        if let Some(selected) = &self.selected {
            bag.put_value(SELECTED_KEY.to_string(), Value::String(selected.clone()));
        }
        for (tab, tags) in &self.tabs {
            let values = tags
                .iter()
                .map(|tag| Value::String(tag.as_str().to_string()))
                .collect();
            bag.put_value(Self::tags_key(tab), Value::Array(values));
        }
    }

    pub fn read_from<B: StateBag + ?Sized>(bag: &B) -> Result<Self> {
        let selected = match bag.get_value(SELECTED_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(tab)) => Some(tab.clone()),
            Some(other) => {
                return Err(NavError::InvalidState(format!(
                    "`{SELECTED_KEY}` must be a string, found {other}"
                )));
            }
        };

        let mut tabs = BTreeMap::new();
        for key in bag.keys() {
            let Some(tab) = key.strip_suffix(TAGS_SUFFIX) else {
                continue;
            };
            if tab.is_empty() {
                continue;
            }
            let Some(value) = bag.get_value(&key) else {
                continue;
            };
            tabs.insert(tab.to_string(), parse_tags(&key, value)?);
        }

        Ok(Self { selected, tabs })
    }

    pub fn to_bag(&self) -> Map<String, Value> {
        let mut bag = Map::new();
        self.write_to(&mut bag);
        bag
    }

    pub fn from_bag(bag: &Map<String, Value>) -> Result<Self> {
        Self::read_from(bag)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

fn parse_tags(key: &str, value: &Value) -> Result<Vec<ScreenTag>> {
    let items = value
        .as_array()
        .ok_or_else(|| NavError::InvalidState(format!("`{key}` must be an array of tags")))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(ScreenTag::from).ok_or_else(|| {
                NavError::InvalidState(format!("`{key}` contains a non-string tag: {item}"))
            })
        })
        .collect()
}

impl Serialize for NavigationState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_bag().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NavigationState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bag = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_bag(&bag).map_err(D::Error::custom)
    }
}
