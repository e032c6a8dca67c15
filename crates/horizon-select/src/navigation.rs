//! Highlight cursor over the rendered result list.
//!
//! The navigator works on the group-flattened list: group labels are not
//! rows, their children are. Movement skips disabled rows and wraps around;
//! when every row is disabled, movement is a no-op.

use horizon_select_core::logging::targets;

use crate::item::{Entry, Item, ItemId, flatten};

/// Abstract navigation input, already mapped from keys or pointer events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavigationIntent {
    /// Highlight the next enabled row.
    Next,
    /// Highlight the previous enabled row.
    Previous,
    /// Highlight the first enabled row.
    First,
    /// Highlight the last enabled row.
    Last,
    /// Act on the highlighted row.
    Confirm,
    /// Dismiss the dropdown.
    Cancel,
}

/// Highlight state for the current result list.
#[derive(Clone, Debug, Default)]
pub struct Navigator {
    rows: Vec<Item>,
    highlighted: Option<usize>,
}

impl Navigator {
    /// An empty navigator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows after a new result list was rendered.
    ///
    /// The highlighted item keeps its highlight if it is still listed;
    /// otherwise the first enabled row is highlighted.
    pub fn set_results(&mut self, results: &[Entry]) {
        let previous = self.highlighted_item().map(|item| item.id.clone());
        self.rows = flatten(results);
        self.highlighted = previous
            .and_then(|id| {
                self.rows
                    .iter()
                    .position(|row| row.id == id && !row.disabled)
            })
            .or_else(|| self.first_enabled());
    }

    /// All rows, in display order.
    pub fn rows(&self) -> &[Item] {
        &self.rows
    }

    /// Index of the highlighted row.
    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// The highlighted row.
    pub fn highlighted_item(&self) -> Option<&Item> {
        self.highlighted.and_then(|index| self.rows.get(index))
    }

    /// Highlight the row with `id`, if it is listed and enabled.
    pub fn highlight(&mut self, id: &ItemId) -> bool {
        match self
            .rows
            .iter()
            .position(|row| &row.id == id && !row.disabled)
        {
            Some(index) => {
                self.highlighted = Some(index);
                true
            }
            None => false,
        }
    }

    /// Move by `delta` enabled rows, wrapping around.
    pub fn move_by(&mut self, delta: isize) {
        if delta == 0 || !self.rows.iter().any(|row| !row.disabled) {
            return;
        }

        let len = self.rows.len() as isize;
        let step = delta.signum();
        let mut remaining = delta.unsigned_abs();
        let mut index = match self.highlighted {
            Some(index) => index as isize,
            None if step > 0 => -1,
            None => len,
        };

        while remaining > 0 {
            index = (index + step).rem_euclid(len);
            if !self.rows[index as usize].disabled {
                remaining -= 1;
            }
        }

        self.highlighted = Some(index as usize);
        tracing::trace!(target: targets::NAVIGATION, index, "highlight moved");
    }

    /// Highlight the first enabled row.
    pub fn move_to_first(&mut self) {
        if let Some(index) = self.first_enabled() {
            self.highlighted = Some(index);
        }
    }

    /// Highlight the last enabled row.
    pub fn move_to_last(&mut self) {
        if let Some(index) = self.rows.iter().rposition(|row| !row.disabled) {
            self.highlighted = Some(index);
        }
    }

    /// The highlighted row, if it can be acted on.
    pub fn confirm_highlighted(&self) -> Option<&Item> {
        self.highlighted_item().filter(|item| !item.disabled)
    }

    /// Drop all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.highlighted = None;
    }

    fn first_enabled(&self) -> Option<usize> {
        self.rows.iter().position(|row| !row.disabled)
    }
}
