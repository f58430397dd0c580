pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use crate::ui::components::{render_confirm, render_info};
use crate::ui::renderfns::{draw_footer, draw_header, HeaderInfo};
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Breadcrumb
    ])
    .split(frame.area());

  let config = &app.services.config;
  let title = config.display_title();
  let header = HeaderInfo {
    title: &title,
    api_url: &config.api.base_url,
    signed_in: app.services.client.credentials().token().is_some(),
    busy: app.activity.is_busy().then_some(app.ticks),
  };
  let shortcuts = app.current_view().map(|v| v.shortcuts()).unwrap_or_default();
  draw_header(frame, chunks[0], &header, &shortcuts);

  if let Some(view) = app.view_stack.last_mut() {
    view.render(frame, chunks[1]);
  }

  let breadcrumb = app.breadcrumb();
  draw_footer(frame, chunks[2], &breadcrumb, app.status.as_deref());

  // Overlays, bottom to top
  let area = chunks[1];
  app.palette.render_overlay(frame, area);
  app.chat.render_overlay(frame, area, app.modals.chat.payload());
  app.address_form.render_overlay(frame, area);
  app.otp_form.render_overlay(frame, area);
  if let Some(confirm) = app.modals.delete.payload().filter(|_| app.modals.delete.is_open()) {
    render_confirm(frame, area, &confirm.title, &confirm.message);
  }
  if let Some(removal) = app
    .modals
    .product_remove
    .payload()
    .filter(|_| app.modals.product_remove.is_open())
  {
    let message = format!("Remove {} from your cart?", removal.product_name);
    render_confirm(frame, area, "Remove product", &message);
  }
  if let Some(info) = app.modals.info.payload().filter(|_| app.modals.info.is_open()) {
    render_info(frame, area, info);
  }
}

/// Keep the selection inside `len` items, selecting the first when unset.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}
