use ratatui::prelude::{Color, Rect};

const SPINNER: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
  }
}

/// Display color for order, booking and payment statuses
pub fn status_color(status: &str) -> Color {
  match status.to_lowercase().as_str() {
    "completed" | "delivered" | "paid" | "success" | "confirmed" => Color::Green,
    "pending" | "processing" | "shipping" | "inprogress" | "in progress" => Color::Yellow,
    "cancelled" | "canceled" | "rejected" | "failed" => Color::Red,
    _ => Color::White,
  }
}

/// Thousands-separated amount with the currency suffix, e.g. `1,250,000 ₫`
pub fn format_price(amount: f64) -> String {
  let whole = amount.round() as i64;
  let digits = whole.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }
  let sign = if whole < 0 { "-" } else { "" };
  format!("{sign}{grouped} ₫")
}

/// Spinner glyph for a tick counter
pub fn spinner_frame(tick: usize) -> char {
  SPINNER[tick % SPINNER.len()]
}

/// Centered rectangle of at most `width` x `height` inside `area`
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("hello", 5), "hello");
    assert_eq!(truncate("hello world", 8), "hello...");
    assert_eq!(truncate("Đèn lồng đỏ", 6), "Đèn...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color("Delivered"), Color::Green);
    assert_eq!(status_color("Pending"), Color::Yellow);
    assert_eq!(status_color("Cancelled"), Color::Red);
    assert_eq!(status_color("Quoting"), Color::White);
  }

  #[test]
  fn test_format_price() {
    assert_eq!(format_price(0.0), "0 ₫");
    assert_eq!(format_price(950.0), "950 ₫");
    assert_eq!(format_price(1_250_000.4), "1,250,000 ₫");
    assert_eq!(format_price(-12_000.0), "-12,000 ₫");
  }

  #[test]
  fn test_centered_rect_fits() {
    let area = Rect::new(0, 0, 20, 10);
    assert_eq!(centered_rect(area, 10, 4), Rect::new(5, 3, 10, 4));
    assert_eq!(centered_rect(area, 50, 50), area);
  }
}
