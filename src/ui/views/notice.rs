use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::api::ApiError;
use crate::modal::{InfoMessage, ModalStores, OtpPrompt};
use crate::query::{Mutation, MutationState};
use crate::resources::account::{AuthOutcome, VerifyOtp};
use crate::ui::view::{Confirmation, Services, ShortcutInfo, View, ViewAction};
use serde_json::Value;

/// Why the user landed on a notice page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  SignIn { from: Option<String> },
  Unauthorized { from: Option<String> },
  NotFound(String),
}

/// Dead-end pages reached through the route guard or an unknown path.
///
/// The sign-in notice also hosts email verification, since sign-in itself
/// happens through `decorhub login`.
pub struct NoticeView {
  notice: Notice,
  verify: Mutation<VerifyOtp, AuthOutcome<Value>>,
}

impl NoticeView {
  pub fn new(services: Services, notice: Notice) -> Self {
    let verify = services
      .client
      .mutation(|c, request: VerifyOtp| async move { Ok::<_, ApiError>(c.verify_otp(&request).await) });
    Self { notice, verify }
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    match &self.notice {
      Notice::SignIn { from } => {
        let mut lines = vec![
          Line::styled("Sign in required", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
          Line::from(""),
        ];
        if let Some(from) = from {
          lines.push(Line::raw(format!("{from} needs a signed-in account.")));
        }
        lines.push(Line::raw("Run `decorhub login --email <email>` and restart."));
        lines.push(Line::from(""));
        lines.push(Line::styled("Press v to verify your email with a one-time code.", dim));
        lines
      }
      Notice::Unauthorized { from } => vec![
        Line::styled("Not authorized", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::raw(match from {
          Some(from) => format!("Your account's role cannot open {from}."),
          None => "Your account's role cannot open that page.".to_string(),
        }),
      ],
      Notice::NotFound(path) => vec![
        Line::styled("Not found", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::raw(format!("Nothing lives at {path}.")),
        Line::styled("Type : for the list of pages.", dim),
      ],
    }
  }
}

impl View for NoticeView {
  fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('v') if matches!(self.notice, Notice::SignIn { .. }) => {
        if !self.verify.is_pending() {
          modals.otp.open(Some(OtpPrompt::default()));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.breadcrumb_label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let mut lines = self.lines();
    if self.verify.is_pending() {
      lines.push(Line::styled("Verifying...", Style::default().fg(Color::Cyan)));
    }
    let paragraph = Paragraph::new(lines)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.notice {
      Notice::SignIn { .. } => "Sign in".to_string(),
      Notice::Unauthorized { .. } => "Unauthorized".to_string(),
      Notice::NotFound(_) => "Not found".to_string(),
    }
  }

  fn tick(&mut self, modals: &mut ModalStores) {
    let info = match self.verify.poll() {
      Some(MutationState::Success(AuthOutcome::Accepted(_))) => {
        InfoMessage::success("Email verified", "You can now sign in")
      }
      Some(MutationState::Success(outcome)) => InfoMessage::error(
        "Verification failed",
        outcome.message().unwrap_or_else(|| "The code was rejected".to_string()),
      ),
      Some(MutationState::Error(e)) => InfoMessage::error("Verification failed", e.clone()),
      _ => return,
    };
    modals.info.open(Some(info));
  }

  fn on_confirm(&mut self, confirmation: Confirmation, _modals: &mut ModalStores) {
    if let Confirmation::Otp(prompt) = confirmation {
      self.verify.mutate(VerifyOtp {
        email: prompt.email,
        otp: prompt.code,
      });
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ];
    if matches!(self.notice, Notice::SignIn { .. }) {
      shortcuts.push(ShortcutInfo::new("v", "verify email").with_priority(20));
    }
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::testing::services;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_rejected_code_shows_server_message() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(POST).path("/api/Auth/verify-email");
        then.status(400).json_body(json!({"message": "OTP expired"}));
      })
      .await;

    let mut modals = ModalStores::default();
    let mut view = NoticeView::new(services(&server), Notice::SignIn { from: None });
    view.handle_key(KeyEvent::from(KeyCode::Char('v')), &mut modals);
    assert!(modals.otp.is_open());

    view.on_confirm(
      Confirmation::Otp(OtpPrompt {
        email: "an@example.com".into(),
        code: "123456".into(),
      }),
      &mut modals,
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick(&mut modals);

    let info = modals.info.payload().cloned().unwrap();
    assert!(info.is_error);
    assert_eq!(info.message, "OTP expired");
  }
}
