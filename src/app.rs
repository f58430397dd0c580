use crate::commands::{self, CommandTarget};
use crate::event::{Event, EventHandler};
use crate::guard::{GuardDecision, RouteGuard};
use crate::modal::{AddressForm, ModalStores, OtpPrompt};
use crate::progress::ActivityIndicator;
use crate::routes::Route;
use crate::ui;
use crate::ui::components::{
  confirm_key, ChatPanel, CommandPalette, ConfirmEvent, FormDialog, FormEvent, KeyResult, PaletteEvent,
};
use crate::ui::view::{Confirmation, Services, View, ViewAction};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  pub(crate) view_stack: Vec<Box<dyn View>>,
  pub(crate) modals: ModalStores,
  pub(crate) palette: CommandPalette,
  pub(crate) address_form: FormDialog,
  pub(crate) otp_form: FormDialog,
  pub(crate) chat: ChatPanel,
  pub(crate) services: Services,
  guard: RouteGuard,
  pub(crate) activity: Arc<ActivityIndicator>,
  /// Tick counter, drives the spinner
  pub(crate) ticks: usize,
  /// One-line message for the footer
  pub(crate) status: Option<String>,
  should_quit: bool,
}

impl App {
  pub fn new(services: Services, guard: RouteGuard, activity: Arc<ActivityIndicator>, start: &str) -> Self {
    let chat = ChatPanel::new(services.client.clone());
    let mut app = Self {
      view_stack: Vec::new(),
      modals: ModalStores::default(),
      palette: CommandPalette::new(),
      address_form: FormDialog::new("Delivery address", &["Address id", "Note"]),
      otp_form: FormDialog::new("Verify email", &["Email", "Code"]),
      chat,
      services,
      guard,
      activity,
      ticks: 0,
      status: None,
      should_quit: false,
    };
    app.navigate(start);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(100));

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }
    Ok(())
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  /// Replace the stack with the view for `path`, after the guard.
  pub fn navigate(&mut self, path: &str) {
    let token = self.services.client.credentials().token();
    let (target, from) = match self.guard.check(path, token.as_deref()) {
      GuardDecision::Proceed => (path.to_string(), None),
      GuardDecision::Redirect(to) => {
        info!(from = path, to = %to, "navigation redirected");
        (to, Some(path.to_string()))
      }
    };
    debug!(path = %target, "navigating");

    let route = Route::parse(&target, &self.services.config.guard);
    let view = route.build(&self.services, from);
    self.modals.reset();
    self.view_stack.clear();
    self.view_stack.push(view);
    self.status = None;
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        self.modals.reset();
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.modals.reset();
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Navigate(path) => self.navigate(&path),
    }
  }

  fn confirm(&mut self, confirmation: Confirmation) {
    if let Some(view) = self.view_stack.last_mut() {
      view.on_confirm(confirmation, &mut self.modals);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Dialogs first, topmost wins
    if self.modals.info.is_open() {
      self.modals.info.close();
      return;
    }
    if self.modals.delete.is_open() {
      if let KeyResult::Event(event) = confirm_key(key) {
        let target = self.modals.delete.payload().map(|d| d.target.clone());
        self.modals.delete.close();
        if let (ConfirmEvent::Accepted, Some(target)) = (event, target) {
          self.confirm(Confirmation::Delete(target));
        }
      }
      return;
    }
    if self.modals.product_remove.is_open() {
      if let KeyResult::Event(event) = confirm_key(key) {
        let removal = self.modals.product_remove.payload().cloned();
        self.modals.product_remove.close();
        if let (ConfirmEvent::Accepted, Some(removal)) = (event, removal) {
          self.confirm(Confirmation::RemoveProduct(removal));
        }
      }
      return;
    }
    if self.address_form.is_active() {
      if let KeyResult::Event(event) = self.address_form.handle_key(key) {
        self.modals.address.close();
        if let FormEvent::Submitted(values) = event {
          let mut values = values.into_iter();
          let form = AddressForm {
            address_id: values.next().unwrap_or_default(),
            note: values.next().unwrap_or_default(),
          };
          self.confirm(Confirmation::Address(form));
        }
      }
      return;
    }
    if self.otp_form.is_active() {
      if let KeyResult::Event(event) = self.otp_form.handle_key(key) {
        self.modals.otp.close();
        if let FormEvent::Submitted(values) = event {
          let mut values = values.into_iter();
          let prompt = OtpPrompt {
            email: values.next().unwrap_or_default(),
            code: values.next().unwrap_or_default(),
          };
          self.confirm(Confirmation::Otp(prompt));
        }
      }
      return;
    }
    if self.chat.handle_key(key, &mut self.modals).is_handled() {
      return;
    }

    match self.palette.handle_key(key) {
      KeyResult::Event(PaletteEvent::Submitted(line)) => {
        self.execute_command(&line);
        return;
      }
      KeyResult::Event(PaletteEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key, &mut self.modals);
      self.apply(action);
    }
    self.sync_forms();
    self.chat.sync(&mut self.modals);
  }

  fn execute_command(&mut self, line: &str) {
    match commands::resolve(line) {
      CommandTarget::Navigate(path) => self.navigate(&path),
      CommandTarget::Quit => self.should_quit = true,
      CommandTarget::Unknown(input) => {
        self.status = Some(format!("unknown command: {input}"));
      }
    }
  }

  /// Open or close the form dialogs to match their stores.
  fn sync_forms(&mut self) {
    match self.modals.address.payload().filter(|_| self.modals.address.is_open()) {
      Some(form) if !self.address_form.is_active() => {
        self.address_form.show(&[form.address_id.clone(), form.note.clone()]);
      }
      None if self.address_form.is_active() => self.address_form.hide(),
      _ => {}
    }
    match self.modals.otp.payload().filter(|_| self.modals.otp.is_open()) {
      Some(prompt) if !self.otp_form.is_active() => {
        self.otp_form.show(&[prompt.email.clone(), prompt.code.clone()]);
      }
      None if self.otp_form.is_active() => self.otp_form.hide(),
      _ => {}
    }
  }

  fn tick(&mut self) {
    self.ticks = self.ticks.wrapping_add(1);
    if let Some(view) = self.view_stack.last_mut() {
      view.tick(&mut self.modals);
    }
    self.chat.tick(&mut self.modals);
    self.sync_forms();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::resources::testing::client_for;
  use httpmock::MockServer;

  fn app(server: &MockServer, start: &str) -> App {
    let yaml = format!("api:\n  base_url: {}\n", server.base_url());
    let config = Arc::new(Config::parse(&yaml).unwrap());
    let guard = RouteGuard::new(&config.guard, None);
    let services = Services {
      client: client_for(server),
      config,
    };
    App::new(services, guard, Arc::new(ActivityIndicator::new()), start)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn test_guarded_route_redirects_to_sign_in() {
    let server = MockServer::start_async().await;
    let app = app(&server, "/admin/dashboard");
    assert_eq!(app.breadcrumb(), vec!["Sign in".to_string()]);
  }

  #[tokio::test]
  async fn test_palette_navigates_and_q_quits_at_root() {
    let server = MockServer::start_async().await;
    let mut app = app(&server, "/products");
    assert_eq!(app.breadcrumb(), vec!["Products".to_string()]);

    for code in [KeyCode::Char(':'), KeyCode::Char('/'), KeyCode::Char('x'), KeyCode::Enter] {
      app.handle_key(key(code));
    }
    assert_eq!(app.breadcrumb(), vec!["Not found".to_string()]);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_otp_form_follows_store() {
    let server = MockServer::start_async().await;
    let mut app = app(&server, "/authen/login");

    app.handle_key(key(KeyCode::Char('v')));
    assert!(app.modals.otp.is_open());
    assert!(app.otp_form.is_active());

    app.handle_key(key(KeyCode::Esc));
    assert!(!app.modals.otp.is_open());
    assert!(!app.otp_form.is_active());
    assert_eq!(app.breadcrumb(), vec!["Sign in".to_string()]);
  }

  #[tokio::test]
  async fn test_unknown_command_sets_status() {
    let server = MockServer::start_async().await;
    let mut app = app(&server, "/cart");
    app.execute_command("bogus");
    assert_eq!(app.status.as_deref(), Some("unknown command: bogus"));
  }
}
