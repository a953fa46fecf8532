use std::cell::RefCell;
use std::rc::Rc;

use crate::host::ScreenHost;
use crate::{NavError, Result};

use super::manager::{NavigationManager, TabSpec};
use super::state::NavigationState;
use super::tag::ScreenTag;

/// Shared handle to one [`NavigationManager`].
///
/// The shell builds the manager once and clones this handle into every screen
/// that navigates. Each call borrows the manager for one operation; a call
/// made while another is still running fails with [`NavError::Reentrant`].
pub struct Navigator<H: ScreenHost> {
    inner: Rc<RefCell<NavigationManager<H>>>,
}

impl<H: ScreenHost> Clone for Navigator<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: ScreenHost> Navigator<H> {
    pub fn new(manager: NavigationManager<H>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(manager)),
        }
    }

    pub fn init(
        &self,
        specs: Vec<TabSpec<H::Screen>>,
        persisted: Option<&NavigationState>,
    ) -> Result<()> {
        self.with_mut(|nav| nav.init(specs, persisted))
    }

    pub fn select(&self, tab: &str) -> Result<()> {
        self.with_mut(|nav| nav.select(tab))
    }

    pub fn push(&self, screen: H::Screen) -> Result<ScreenTag> {
        self.with_mut(|nav| nav.push(screen))
    }

    pub fn push_with(&self, screen: H::Screen, add_to_back_stack: bool) -> Result<ScreenTag> {
        self.with_mut(|nav| nav.push_with(screen, add_to_back_stack))
    }

    pub fn pop_back(&self) -> Result<bool> {
        self.with_mut(|nav| nav.pop_back())
    }

    pub fn serialize_state(&self) -> Result<NavigationState> {
        self.with(|nav| nav.serialize_state())?
    }

    pub fn selected_tab(&self) -> Option<String> {
        self.with(|nav| nav.selected_tab().map(str::to_string))
            .ok()
            .flatten()
    }

    pub fn visible_tag(&self) -> Option<ScreenTag> {
        self.with(|nav| nav.visible_tag().cloned()).ok().flatten()
    }

    /// Run `f` against a shared borrow of the manager.
    pub fn with<R>(&self, f: impl FnOnce(&NavigationManager<H>) -> R) -> Result<R> {
        let guard = self.inner.try_borrow().map_err(|_| NavError::Reentrant)?;
        Ok(f(&*guard))
    }

    /// Run `f` against an exclusive borrow of the manager.
    pub fn with_mut<R>(
        &self,
        f: impl FnOnce(&mut NavigationManager<H>) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self
            .inner
            .try_borrow_mut()
            .map_err(|_| NavError::Reentrant)?;
        f(&mut *guard)
    }

    /// Give the manager back once every other handle is gone.
    pub fn into_inner(self) -> std::result::Result<NavigationManager<H>, Self> {
        Rc::try_unwrap(self.inner)
            .map(RefCell::into_inner)
            .map_err(|inner| Self { inner })
    }
}
