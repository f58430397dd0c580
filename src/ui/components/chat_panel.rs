use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::client::DecorClient;
use crate::modal::{ChatBox, InfoMessage, ModalStores};
use crate::query::{Mutation, MutationState, Query};
use crate::resources::chat::{self, ChatMessage, Conversation, SendMessage};
use crate::ui::renderfns::{centered_rect, truncate};

/// Chat box over the current view, driven by the chat modal store.
///
/// The thread query stays disabled until the conversation with the
/// receiver is known.
pub struct ChatPanel {
  client: DecorClient,
  receiver_id: Option<String>,
  conversations: Option<Query<Vec<Conversation>>>,
  messages: Option<Query<Vec<ChatMessage>>>,
  thread_id: Option<String>,
  send: Mutation<SendMessage, ChatMessage>,
  draft: TextInput,
}

impl ChatPanel {
  pub fn new(client: DecorClient) -> Self {
    let send = client.mutation(|c, input: SendMessage| async move { c.send_message(&input).await });
    Self {
      client,
      receiver_id: None,
      conversations: None,
      messages: None,
      thread_id: None,
      send,
      draft: TextInput::new(),
    }
  }

  pub fn is_active(&self) -> bool {
    self.receiver_id.is_some()
  }

  /// Follow the chat store: start when it opens, stop when it closes.
  pub fn sync(&mut self, modals: &mut ModalStores) {
    let Some(chat_box) = modals.chat.payload().filter(|_| modals.chat.is_open()) else {
      if self.is_active() {
        self.stop();
      }
      return;
    };
    if self.receiver_id.as_deref() != Some(chat_box.receiver_id.as_str()) {
      let receiver_id = chat_box.receiver_id.clone();
      self.start(receiver_id, chat_box.conversation.clone());
    }
  }

  fn start(&mut self, receiver_id: String, conversation: Option<Conversation>) {
    self.draft.clear();
    self.send.reset();
    match conversation {
      Some(conversation) => {
        self.open_thread(Some(conversation.id));
        self.conversations = None;
      }
      None => {
        let mut conversations = chat::conversations_query(&self.client);
        conversations.fetch();
        self.conversations = Some(conversations);
        self.open_thread(None);
      }
    }
    self.receiver_id = Some(receiver_id);
  }

  fn open_thread(&mut self, conversation_id: Option<String>) {
    let mut messages = chat::messages_query(&self.client, conversation_id.clone());
    messages.fetch();
    self.messages = Some(messages);
    self.thread_id = conversation_id;
  }

  fn stop(&mut self) {
    self.receiver_id = None;
    self.conversations = None;
    self.messages = None;
    self.thread_id = None;
    self.draft.clear();
  }

  fn conversation_id(&self) -> Option<String> {
    let receiver = self.receiver_id.as_deref()?;
    self
      .conversations
      .as_ref()?
      .data()?
      .iter()
      .find(|c| c.receiver_id == receiver)
      .map(|c| c.id.clone())
  }

  pub fn tick(&mut self, modals: &mut ModalStores) {
    self.sync(modals);
    if !self.is_active() {
      return;
    }

    if let Some(conversations) = &mut self.conversations {
      let arrived = conversations.poll() && conversations.is_success();
      if arrived && self.thread_id.is_none() {
        if let Some(id) = self.conversation_id() {
          self.open_thread(Some(id));
        }
      }
    }
    if let Some(messages) = &mut self.messages {
      messages.poll();
    }
    if let Some(MutationState::Error(e)) = self.send.poll() {
      modals.info.open(Some(InfoMessage::error("Message not sent", e.clone())));
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> KeyResult<()> {
    if !self.is_active() {
      return KeyResult::NotHandled;
    }
    match self.draft.handle_key(key) {
      InputResult::Cancelled => {
        modals.chat.close();
        self.stop();
        KeyResult::Event(())
      }
      InputResult::Submitted(text) => {
        if !self.send.is_pending() {
          let input = SendMessage {
            conversation_id: self.thread_id.clone().unwrap_or_default(),
            receiver_id: self.receiver_id.clone().unwrap_or_default(),
            message: text,
          };
          self.send.mutate(input);
          self.draft.clear();
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, chat_box: Option<&ChatBox>) {
    if !self.is_active() {
      return;
    }
    let popup = centered_rect(area, (area.width * 70 / 100).max(50), (area.height * 70 / 100).max(12));
    frame.render_widget(Clear, popup);
    let name = chat_box.map(|c| c.receiver_name.as_str()).unwrap_or("provider");
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Magenta))
      .title(format!(" Chat with {} ", truncate(name, 30)));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(inner);

    let receiver = self.receiver_id.as_deref().unwrap_or_default();
    match self.messages.as_ref() {
      Some(q) if q.is_loading() => {
        frame.render_widget(Paragraph::new("Loading messages...").fg(Color::DarkGray), chunks[0]);
      }
      Some(q) if q.data().is_some_and(|m| !m.is_empty()) => {
        let items: Vec<ListItem> = q
          .data()
          .into_iter()
          .flatten()
          .map(|m| {
            let (who, color) = if m.sender_id == receiver {
              (name, Color::Magenta)
            } else {
              ("you", Color::Cyan)
            };
            ListItem::new(Line::from(vec![
              Span::styled(format!("{who}: "), Style::default().fg(color)),
              Span::raw(m.message.clone()),
            ]))
          })
          .collect();
        frame.render_widget(List::new(items), chunks[0]);
      }
      _ => {
        frame.render_widget(Paragraph::new("No messages yet. Say hello.").fg(Color::DarkGray), chunks[0]);
      }
    }

    let (before, after) = self.draft.split_at_cursor();
    let prompt = if self.send.is_pending() { "sending " } else { "> " };
    let line = Line::from(vec![
      Span::styled(prompt, Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(line), chunks[1]);
  }
}
