//! How a list view turns `(data, loading)` into rows.
//!
//! Rendering is left to the caller; this module only decides what is shown.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMapper {
  pub current_page: usize,
  pub page_size: usize,
  pub enforce_pagination: bool,
  /// Render everything the caller passes; the caller merges pages.
  pub accumulative: bool,
  pub is_loading: bool,
  pub has_more: bool,
  pub skeleton_rows: usize,
}

impl Default for DataMapper {
  fn default() -> Self {
    Self {
      current_page: 1,
      page_size: 10,
      enforce_pagination: false,
      accumulative: false,
      is_loading: false,
      has_more: false,
      skeleton_rows: 5,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedItem<'a, T, P> {
  pub key: String,
  pub item: &'a T,
  pub props: P,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowMore {
  pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<'a, T, P> {
  Skeleton(usize),
  Empty,
  Items {
    items: Vec<MappedItem<'a, T, P>>,
    show_more: Option<ShowMore>,
  },
}

impl<T, P> Rendered<'_, T, P> {
  pub fn len(&self) -> usize {
    match self {
      Self::Items { items, .. } => items.len(),
      _ => 0,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl DataMapper {
  pub fn map<'a, T, P, K, F>(&self, data: Option<&'a [T]>, key_of: K, props_of: F) -> Rendered<'a, T, P>
  where
    K: Fn(&T) -> String,
    F: Fn(&T) -> P,
  {
    if matches!(data, Some(items) if items.is_empty()) {
      return Rendered::Empty;
    }
    let keeps_items = self.accumulative && data.is_some();
    if self.is_loading && !keeps_items {
      return Rendered::Skeleton(self.skeleton_rows);
    }
    let Some(data) = data else {
      return Rendered::Empty;
    };

    let visible = if self.accumulative || !self.enforce_pagination {
      data
    } else {
      self.page_slice(data)
    };

    let show_more = (self.accumulative && self.enforce_pagination && self.has_more).then_some(ShowMore {
      enabled: !self.is_loading,
    });

    Rendered::Items {
      items: dedupe(visible, key_of, props_of),
      show_more,
    }
  }

  fn page_slice<'a, T>(&self, data: &'a [T]) -> &'a [T] {
    if self.current_page == 0 || self.page_size == 0 {
      return &[];
    }
    let start = (self.current_page - 1).saturating_mul(self.page_size);
    if start >= data.len() {
      return &[];
    }
    let end = start.saturating_add(self.page_size).min(data.len());
    &data[start..end]
  }
}

/// A repeated key replaces the earlier item in place.
fn dedupe<'a, T, P, K, F>(items: &'a [T], key_of: K, props_of: F) -> Vec<MappedItem<'a, T, P>>
where
  K: Fn(&T) -> String,
  F: Fn(&T) -> P,
{
  let mut slots: HashMap<String, usize> = HashMap::new();
  let mut out: Vec<MappedItem<'a, T, P>> = Vec::with_capacity(items.len());
  for item in items {
    let mapped = MappedItem {
      key: key_of(item),
      item,
      props: props_of(item),
    };
    match slots.get(&mapped.key) {
      Some(&slot) => out[slot] = mapped,
      None => {
        slots.insert(mapped.key.clone(), out.len());
        out.push(mapped);
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn keys<P>(rendered: &Rendered<'_, u32, P>) -> Vec<u32> {
    match rendered {
      Rendered::Items { items, .. } => items.iter().map(|m| *m.item).collect(),
      _ => vec![],
    }
  }

  fn render<'a>(mapper: &DataMapper, data: Option<&'a [u32]>) -> Rendered<'a, u32, ()> {
    mapper.map(data, |n| n.to_string(), |_| ())
  }

  #[test]
  fn test_empty_list_ignores_loading() {
    let data: Vec<u32> = vec![];
    for is_loading in [false, true] {
      for accumulative in [false, true] {
        let mapper = DataMapper {
          is_loading,
          accumulative,
          ..DataMapper::default()
        };
        assert_eq!(render(&mapper, Some(data.as_slice())), Rendered::Empty);
      }
    }
  }

  #[test]
  fn test_loading_without_data_is_skeleton() {
    let mapper = DataMapper {
      is_loading: true,
      skeleton_rows: 3,
      ..DataMapper::default()
    };
    assert_eq!(render(&mapper, None), Rendered::Skeleton(3));
    let data: Vec<u32> = (0..40).collect();
    assert_eq!(render(&mapper, Some(data.as_slice())), Rendered::Skeleton(3));
  }

  #[test]
  fn test_absent_data_is_empty() {
    assert_eq!(render(&DataMapper::default(), None), Rendered::Empty);
  }

  #[test]
  fn test_third_page_of_25() {
    let data: Vec<u32> = (0..25).collect();
    let mapper = DataMapper {
      current_page: 3,
      page_size: 10,
      enforce_pagination: true,
      ..DataMapper::default()
    };
    let rendered = render(&mapper, Some(data.as_slice()));
    assert_eq!(keys(&rendered), vec![20, 21, 22, 23, 24]);
    assert!(matches!(rendered, Rendered::Items { show_more: None, .. }));
  }

  #[test]
  fn test_out_of_range_pages_render_nothing() {
    let data: Vec<u32> = (0..25).collect();
    for (current_page, page_size) in [(4, 10), (0, 10), (1, 0)] {
      let mapper = DataMapper {
        current_page,
        page_size,
        enforce_pagination: true,
        ..DataMapper::default()
      };
      assert!(render(&mapper, Some(data.as_slice())).is_empty());
    }
  }

  #[test]
  fn test_accumulative_ignores_page() {
    let data: Vec<u32> = (0..25).collect();
    let mapper = DataMapper {
      current_page: 3,
      page_size: 10,
      enforce_pagination: true,
      accumulative: true,
      has_more: true,
      ..DataMapper::default()
    };
    let rendered = render(&mapper, Some(data.as_slice()));
    assert_eq!(rendered.len(), 25);
    assert!(matches!(
      rendered,
      Rendered::Items {
        show_more: Some(ShowMore { enabled: true }),
        ..
      }
    ));
  }

  #[test]
  fn test_accumulative_loading_keeps_items() {
    let data: Vec<u32> = (0..10).collect();
    let mapper = DataMapper {
      accumulative: true,
      enforce_pagination: true,
      has_more: true,
      is_loading: true,
      ..DataMapper::default()
    };
    let rendered = render(&mapper, Some(data.as_slice()));
    assert_eq!(rendered.len(), 10);
    assert!(matches!(
      rendered,
      Rendered::Items {
        show_more: Some(ShowMore { enabled: false }),
        ..
      }
    ));
  }

  #[test]
  fn test_show_more_needs_pagination() {
    let data: Vec<u32> = (0..10).collect();
    let mapper = DataMapper {
      accumulative: true,
      has_more: true,
      ..DataMapper::default()
    };
    assert!(matches!(
      render(&mapper, Some(data.as_slice())),
      Rendered::Items { show_more: None, .. }
    ));
  }

  #[test]
  fn test_duplicate_keys_last_wins_in_first_slot() {
    let data = vec![(1, "a"), (2, "b"), (1, "c")];
    let rendered = DataMapper::default().map(Some(data.as_slice()), |(id, _)| id.to_string(), |(_, s)| s.to_uppercase());
    let Rendered::Items { items, .. } = rendered else {
      panic!("expected items");
    };
    let props: Vec<_> = items.iter().map(|m| m.props.as_str()).collect();
    assert_eq!(props, vec!["C", "B"]);
  }
}
