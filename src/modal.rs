//! Open/closed state for the application's dialogs.
//!
//! One store per dialog kind. Stores are independent: opening one does not
//! close another.

use crate::resources::chat::Conversation;

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState<P> {
  pub is_open: bool,
  pub payload: Option<P>,
}

impl<P> Default for ModalState<P> {
  fn default() -> Self {
    Self {
      is_open: false,
      payload: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalStore<P> {
  state: ModalState<P>,
}

impl<P> Default for ModalStore<P> {
  fn default() -> Self {
    Self {
      state: ModalState::default(),
    }
  }
}

impl<P> ModalStore<P> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn open(&mut self, payload: Option<P>) {
    self.state.is_open = true;
    self.state.payload = payload;
  }

  pub fn close(&mut self) {
    self.state.is_open = false;
    self.state.payload = None;
  }

  pub fn reset(&mut self) {
    self.state = ModalState::default();
  }

  pub fn state(&self) -> &ModalState<P> {
    &self.state
  }

  pub fn is_open(&self) -> bool {
    self.state.is_open
  }

  pub fn payload(&self) -> Option<&P> {
    self.state.payload.as_ref()
  }

  pub fn payload_mut(&mut self) -> Option<&mut P> {
    self.state.payload.as_mut()
  }
}

/// What a confirmed deletion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
  Order { id: String },
  Product { id: String },
  Booking { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirm {
  pub title: String,
  pub message: String,
  pub target: DeleteTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoMessage {
  pub title: String,
  pub message: String,
  pub is_error: bool,
}

impl InfoMessage {
  pub fn error(title: &str, message: impl Into<String>) -> Self {
    Self {
      title: title.to_string(),
      message: message.into(),
      is_error: true,
    }
  }

  pub fn success(title: &str, message: impl Into<String>) -> Self {
    Self {
      title: title.to_string(),
      message: message.into(),
      is_error: false,
    }
  }
}

/// Address picker used at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
  pub address_id: String,
  pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatBox {
  pub conversation: Option<Conversation>,
  pub receiver_id: String,
  pub receiver_name: String,
  pub draft: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpPrompt {
  pub email: String,
  pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRemoval {
  pub product_id: String,
  pub product_name: String,
}

/// The application's dialog stores, passed to views explicitly.
#[derive(Debug, Default)]
pub struct ModalStores {
  pub address: ModalStore<AddressForm>,
  pub chat: ModalStore<ChatBox>,
  pub delete: ModalStore<DeleteConfirm>,
  pub info: ModalStore<InfoMessage>,
  pub otp: ModalStore<OtpPrompt>,
  pub product_remove: ModalStore<ProductRemoval>,
}

impl ModalStores {
  pub fn any_open(&self) -> bool {
    self.address.is_open()
      || self.chat.is_open()
      || self.delete.is_open()
      || self.info.is_open()
      || self.otp.is_open()
      || self.product_remove.is_open()
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_then_close_is_initial_state() {
    let mut store = ModalStore::new();
    let initial = store.clone();
    store.open(Some(InfoMessage::success("Saved", "Profile updated")));
    assert!(store.is_open());
    assert_eq!(store.payload().unwrap().title, "Saved");

    store.close();
    assert_eq!(store, initial);
  }

  #[test]
  fn test_open_without_payload() {
    let mut store: ModalStore<AddressForm> = ModalStore::new();
    store.open(None);
    assert!(store.is_open());
    assert!(store.payload().is_none());
  }

  #[test]
  fn test_stores_are_independent() {
    let mut stores = ModalStores::default();
    stores.info.open(Some(InfoMessage::error("Oops", "failed")));
    stores.delete.open(Some(DeleteConfirm {
      title: "Cancel order".into(),
      message: "Cancel ORD-1?".into(),
      target: DeleteTarget::Order { id: "1".into() },
    }));
    stores.info.close();

    assert!(stores.delete.is_open());
    assert!(stores.any_open());
    stores.reset();
    assert!(!stores.any_open());
  }

  #[test]
  fn test_reopen_replaces_payload() {
    let mut store = ModalStore::new();
    store.open(Some(OtpPrompt {
      email: "a@b.c".into(),
      code: String::new(),
    }));
    store.open(Some(OtpPrompt {
      email: "d@e.f".into(),
      code: String::new(),
    }));
    assert_eq!(store.payload().unwrap().email, "d@e.f");
  }
}
