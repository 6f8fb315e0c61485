use crate::layout::MIN_SECTION_ROWS;
use crate::model::{DisplayItem, ResourceCategory, ResourceItem};
use std::ops::Range;

pub const ELLIPSIS: char = '…';
pub const SELECTED_MARKER: &str = "> ";
pub const ROW_PADDING: &str = "  ";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Navigation {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PaneRow {
    pub text: String,
    pub selected: bool,
}

/// One category's items plus a single-selection cursor.
#[derive(Debug, Clone)]
pub struct ListPane {
    category: ResourceCategory,
    items: Vec<ResourceItem>,
    selected: Option<usize>,
    height: usize,
    error: Option<String>,
    loading: bool,
}

impl ListPane {
    pub fn new(category: ResourceCategory) -> Self {
        Self {
            category,
            items: Vec::new(),
            selected: None,
            height: usize::from(MIN_SECTION_ROWS),
            error: None,
            loading: true,
        }
    }

    pub fn title(&self) -> String {
        format!("[{}] {}", self.category.hotkey(), self.category.title())
    }

    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&ResourceItem> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_height(&mut self, rows: u16) {
        self.height = usize::from(rows.max(1));
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces every item and resets the cursor to the first row.
    pub fn set_items(&mut self, items: Vec<ResourceItem>) {
        self.selected = if items.is_empty() { None } else { Some(0) };
        self.items = items;
        self.error = None;
        self.loading = false;
    }

    /// Replaces every item, keeping the cursor on the same title when it
    /// survived the reload.
    pub fn replace_items(&mut self, items: Vec<ResourceItem>) {
        let previous = self.selected_item().map(|item| item.title().to_string());
        self.set_items(items);
        if let Some(previous) = previous
            && let Some(index) = self.items.iter().position(|item| item.title() == previous)
        {
            self.selected = Some(index);
        }
    }

    /// Moves the cursor onto the first item titled `title`.
    pub fn select_title(&mut self, title: &str) -> bool {
        match self.items.iter().position(|item| item.title() == title) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.items.clear();
        self.selected = None;
        self.error = Some(message.into());
        self.loading = false;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
        self.error = None;
        self.loading = true;
    }

    /// Moves the cursor, clamped to the list bounds. Returns whether the
    /// selected index changed.
    pub fn navigate(&mut self, navigation: Navigation) -> bool {
        let Some(current) = self.selected else {
            return false;
        };
        let max_index = self.items.len().saturating_sub(1);
        let page = self.height.max(1);
        let next = match navigation {
            Navigation::Up => current.saturating_sub(1),
            Navigation::Down => current.saturating_add(1).min(max_index),
            Navigation::PageUp => current.saturating_sub(page),
            Navigation::PageDown => current.saturating_add(page).min(max_index),
            Navigation::Top => 0,
            Navigation::Bottom => max_index,
        };
        self.selected = Some(next);
        next != current
    }

    /// Item range that fits in the pane while keeping the cursor visible.
    pub fn visible_window(&self) -> Range<usize> {
        let height = self.height.max(1);
        let selected = self.selected.unwrap_or(0);
        let start = selected.saturating_sub(height - 1);
        let end = start.saturating_add(height).min(self.items.len());
        start.min(end)..end
    }

    pub fn rows(&self, inner_width: usize) -> Vec<PaneRow> {
        let text_width = inner_width.saturating_sub(SELECTED_MARKER.chars().count());
        let window = self.visible_window();
        let start = window.start;
        self.items[window]
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                let selected = self.selected == Some(start + offset);
                let prefix = if selected { SELECTED_MARKER } else { ROW_PADDING };
                let description = item.description();
                let label = if description.is_empty() {
                    item.title().to_string()
                } else {
                    format!("{} {description}", item.title())
                };
                PaneRow {
                    text: format!("{prefix}{}", truncate_to_width(&label, text_width)),
                    selected,
                }
            })
            .collect()
    }
}

/// Trims trailing characters until the text plus an ellipsis fits in
/// `max_width` columns. Text that already fits is returned unchanged.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = text.chars().count();
    if width <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = text.to_string();
    while width + 1 > max_width {
        out.pop();
        width -= 1;
    }
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::{ELLIPSIS, ListPane, Navigation, truncate_to_width};
    use crate::model::{PodInfo, ResourceCategory, ResourceItem};
    use proptest::prelude::*;

    fn pods(names: &[&str]) -> Vec<ResourceItem> {
        names
            .iter()
            .map(|name| {
                ResourceItem::Pod(PodInfo {
                    name: (*name).to_string(),
                    status: "Running".to_string(),
                    ready: "1/1".to_string(),
                    restarts: 0,
                })
            })
            .collect()
    }

    #[test]
    fn set_items_resets_cursor() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        assert_eq!(pane.selected_index(), None);
        pane.set_items(pods(&["a", "b", "c"]));
        assert_eq!(pane.selected_index(), Some(0));
        pane.navigate(Navigation::Bottom);
        pane.set_items(pods(&["x", "y"]));
        assert_eq!(pane.selected_index(), Some(0));
        pane.set_items(Vec::new());
        assert_eq!(pane.selected_index(), None);
        assert!(pane.selected_item().is_none());
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        pane.set_items(pods(&["a", "b", "c"]));
        assert!(!pane.navigate(Navigation::Up));
        assert!(pane.navigate(Navigation::Down));
        assert!(pane.navigate(Navigation::Down));
        assert!(!pane.navigate(Navigation::Down));
        assert_eq!(pane.selected_index(), Some(2));
        assert!(pane.navigate(Navigation::PageUp));
        assert_eq!(pane.selected_index(), Some(0));
    }

    #[test]
    fn replace_items_follows_selected_title() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        pane.set_items(pods(&["a", "b", "c"]));
        pane.navigate(Navigation::Down);
        pane.replace_items(pods(&["new", "a", "b"]));
        assert_eq!(pane.selected_index(), Some(2));

        pane.replace_items(pods(&["z"]));
        assert_eq!(pane.selected_index(), Some(0));
    }

    #[test]
    fn select_title_moves_cursor_only_on_match() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        pane.set_items(pods(&["a", "b", "c"]));
        assert!(pane.select_title("c"));
        assert_eq!(pane.selected_index(), Some(2));
        assert!(!pane.select_title("missing"));
        assert_eq!(pane.selected_index(), Some(2));
    }

    #[test]
    fn error_replaces_items() {
        let mut pane = ListPane::new(ResourceCategory::Services);
        pane.set_items(pods(&["a"]));
        pane.set_error("Error loading services: boom");
        assert!(pane.is_empty());
        assert_eq!(pane.error(), Some("Error loading services: boom"));
        assert_eq!(pane.selected_index(), None);
    }

    #[test]
    fn rows_mark_selection_and_respect_height() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        pane.set_height(2);
        pane.set_items(pods(&["a", "b", "c", "d"]));
        pane.navigate(Navigation::Down);
        pane.navigate(Navigation::Down);

        let rows = pane.rows(40);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "  b ● Running | 1/1");
        assert_eq!(rows[1].text, "> c ● Running | 1/1");
        assert!(rows[1].selected);
    }

    #[test]
    fn rows_are_truncated_to_inner_width() {
        let mut pane = ListPane::new(ResourceCategory::Pods);
        pane.set_items(pods(&["a-very-long-pod-name-0123456789"]));
        let rows = pane.rows(12);
        assert_eq!(rows[0].text.chars().count(), 12);
        assert!(rows[0].text.ends_with(ELLIPSIS));
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate_to_width("web", 10), "web");
        assert_eq!(truncate_to_width("exact", 5), "exact");
        assert_eq!(truncate_to_width("overflow", 0), "");
        assert_eq!(truncate_to_width("overflow", 1), "…");
    }

    proptest! {
        #[test]
        fn truncation_fits_exactly(text in "[a-z0-9 -]{0,80}", width in 1usize..60) {
            let out = truncate_to_width(&text, width);
            let len = text.chars().count();
            if len <= width {
                prop_assert_eq!(out, text);
            } else {
                prop_assert_eq!(out.chars().count(), width);
                prop_assert!(out.ends_with(ELLIPSIS));
            }
        }

        #[test]
        fn selection_stays_in_bounds(
            ops in proptest::collection::vec((0u8..7, 0usize..20), 0..60),
            height in 1u16..10,
        ) {
            let mut pane = ListPane::new(ResourceCategory::Pods);
            pane.set_height(height);
            for (op, size) in ops {
                match op {
                    0 => { pane.navigate(Navigation::Up); }
                    1 => { pane.navigate(Navigation::Down); }
                    2 => { pane.navigate(Navigation::PageUp); }
                    3 => { pane.navigate(Navigation::PageDown); }
                    4 => { pane.navigate(Navigation::Bottom); }
                    5 => {
                        let names = (0..size).map(|i| format!("pod-{i}")).collect::<Vec<_>>();
                        let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
                        pane.set_items(pods(&refs));
                    }
                    _ => {
                        let names = (0..size).map(|i| format!("pod-{}", i * 2)).collect::<Vec<_>>();
                        let refs = names.iter().map(String::as_str).collect::<Vec<_>>();
                        pane.replace_items(pods(&refs));
                    }
                }
                match pane.selected_index() {
                    Some(index) => prop_assert!(index < pane.len()),
                    None => prop_assert!(pane.is_empty()),
                }
                prop_assert!(pane.rows(30).len() <= pane.height());
            }
        }
    }
}
