use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use std::sync::Arc;

use crate::client::DecorClient;
use crate::config::Config;
use crate::modal::{AddressForm, DeleteTarget, ModalStores, OtpPrompt, ProductRemoval};

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// What views need to build queries and child views.
#[derive(Clone)]
pub struct Services {
  pub client: DecorClient,
  pub config: Arc<Config>,
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the stack with the view for a route, through the guard
  Navigate(String),
}

/// A dialog the user accepted, handed back to the view that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
  Delete(DeleteTarget),
  RemoveProduct(ProductRemoval),
  Address(AddressForm),
  Otp(OtpPrompt),
}

/// Trait for view behavior
///
/// Views own their queries and mutations and poll them in `tick`. Dialogs
/// are opened through the `ModalStores` the App passes in; the App renders
/// them and reports acceptance through `on_confirm`.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll queries and mutations
  fn tick(&mut self, _modals: &mut ModalStores) {}

  fn on_confirm(&mut self, _confirmation: Confirmation, _modals: &mut ModalStores) {}

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
