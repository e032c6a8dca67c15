//! Host control synchronisation.
//!
//! The widget upgrades an existing selection control. Forms and validation
//! read the selection from that control, so every selection change is
//! mirrored back onto it through [`HostControl`].

use crate::item::{Item, ItemId};

/// The native selection control the widget is attached to.
pub trait HostControl: Send {
    /// Items the control already had selected when the widget attached.
    fn initial_selection(&self) -> Vec<Item> {
        Vec::new()
    }

    /// Mark exactly `selected` as chosen; every other option becomes unselected.
    fn sync_selection(&mut self, selected: &[ItemId]);

    /// Make sure an option exists for `item`, adding it if necessary.
    ///
    /// Called before a tag or a remote item is selected.
    fn ensure_option(&mut self, item: &Item);

    /// Fire the control's native change notification.
    fn dispatch_change(&mut self);
}

/// A host control that ignores every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedHost;

impl HostControl for DetachedHost {
    fn sync_selection(&mut self, _selected: &[ItemId]) {}

    fn ensure_option(&mut self, _item: &Item) {}

    fn dispatch_change(&mut self) {}
}

/// One option row of a [`NativeSelect`].
#[derive(Clone, Debug, PartialEq)]
pub struct NativeOption {
    /// Option value.
    pub value: ItemId,
    /// Option label.
    pub label: String,
    /// Whether the option is selected.
    pub selected: bool,
}

/// An in-memory selection control.
///
/// Useful for headless embedding and for tests: it records option rows,
/// their selected flags and how many change notifications were fired.
#[derive(Clone, Debug, Default)]
pub struct NativeSelect {
    options: Vec<NativeOption>,
    change_count: usize,
}

impl NativeSelect {
    /// Create an empty control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a control from option rows; rows flagged `selected` seed the
    /// widget's initial selection.
    pub fn from_options(options: impl IntoIterator<Item = NativeOption>) -> Self {
        Self {
            options: options.into_iter().collect(),
            change_count: 0,
        }
    }

    /// All option rows.
    pub fn options(&self) -> &[NativeOption] {
        &self.options
    }

    /// Values of the selected rows, in option order.
    pub fn selected_values(&self) -> Vec<ItemId> {
        self.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.clone())
            .collect()
    }

    /// Number of change notifications dispatched so far.
    pub fn change_count(&self) -> usize {
        self.change_count
    }
}

impl NativeOption {
    /// An option row.
    pub fn new(value: impl Into<ItemId>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

impl HostControl for NativeSelect {
    fn initial_selection(&self) -> Vec<Item> {
        self.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| {
                let mut item = Item::new(option.value.clone(), option.label.clone());
                item.selected = true;
                item
            })
            .collect()
    }

    fn sync_selection(&mut self, selected: &[ItemId]) {
        for option in &mut self.options {
            option.selected = selected.contains(&option.value);
        }
    }

    fn ensure_option(&mut self, item: &Item) {
        if !self.options.iter().any(|option| option.value == item.id) {
            self.options
                .push(NativeOption::new(item.id.clone(), item.text.clone(), false));
        }
    }

    fn dispatch_change(&mut self) {
        self.change_count += 1;
    }
}

/// A shared control, so the embedder can still inspect it after handing a
/// clone to the widget.
impl<H: HostControl> HostControl for std::sync::Arc<parking_lot::Mutex<H>> {
    fn initial_selection(&self) -> Vec<Item> {
        self.lock().initial_selection()
    }

    fn sync_selection(&mut self, selected: &[ItemId]) {
        self.lock().sync_selection(selected);
    }

    fn ensure_option(&mut self, item: &Item) {
        self.lock().ensure_option(item);
    }

    fn dispatch_change(&mut self) {
        self.lock().dispatch_change();
    }
}
