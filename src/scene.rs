use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemId};

/// Key under which [`crate::editor::GardenEditor::save_local`] persists the
/// scene document in the injected key-value store.
pub const SCENE_KEY: &str = "zen.scene";

/// Sand tint used whenever winter mode is active, regardless of theme.
pub const WINTER_SAND: u32 = 0xeaf3fb;

/// Time-of-day theme. Each theme tints the sand and selects an ambience mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Morning,
    #[default]
    Day,
    Dusk,
    Night,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Morning, Theme::Day, Theme::Dusk, Theme::Night];

    /// Sand color for this theme as 0xRRGGBB.
    pub fn sand_color(self) -> u32 {
        match self {
            Theme::Morning => 0xf0ebdd,
            Theme::Day => 0xe9e3d5,
            Theme::Dusk => 0xe5ded7,
            Theme::Night => 0xd8d3c6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Morning => "Morning",
            Theme::Day => "Day",
            Theme::Dusk => "Dusk",
            Theme::Night => "Night",
        }
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The complete editable state of one composition.
///
/// Unknown or missing fields in a persisted document fall back to defaults,
/// so older documents keep loading as the schema grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneState {
    pub theme: Theme,
    pub winter_mode: bool,
    /// Rake brush width in pixels.
    pub brush: f32,
    /// Drawn rake paths, oldest first. Only the last path is mutable, and
    /// only while a draw gesture is active.
    pub paths: Vec<Vec<Point>>,
    /// Placed items; insertion order is draw order (last on top).
    pub items: Vec<Item>,
    pub selected_id: Option<ItemId>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            winter_mode: false,
            brush: 12.0,
            paths: Vec::new(),
            items: Vec::new(),
            selected_id: None,
        }
    }
}

impl SceneState {
    /// Active sand color, honoring winter mode.
    pub fn sand_color(&self) -> u32 {
        if self.winter_mode {
            WINTER_SAND
        } else {
            self.theme.sand_color()
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|it| it.id == id)
    }

    /// Topmost item whose hit area contains `p`, if any.
    pub fn item_at(&self, p: Point) -> Option<&Item> {
        self.items.iter().rev().find(|it| it.hit_area().contains(p))
    }
}

/// What changed in the scene store. Subscribers use this to decide whether
/// a redraw, a remix, or both are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Paths,
    Items,
    Selection,
    Theme,
    Winter,
    Brush,
    /// Wholesale replacement (undo/redo, load).
    All,
}

type Listener = Box<dyn FnMut(&SceneState, SceneChange)>;

/// Broadcasts scene changes to registered listeners.
pub struct ChangeHub {
    listeners: RefCell<Vec<Listener>>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a listener to receive change notifications.
    pub fn subscribe(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    fn emit(&self, state: &SceneState, change: SceneChange) {
        for listener in &mut *self.listeners.borrow_mut() {
            listener(state, change);
        }
    }

    /// Drop all listeners. Called on teardown so late notifications cannot
    /// reach released subscribers.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

/// Canonical mutable scene state plus its change notifications.
///
/// All mutation goes through these methods so that every change is observed.
/// The store knows nothing about history; snapshot points are chosen by the
/// editor and the gesture machine.
#[derive(Default)]
pub struct SceneStore {
    state: SceneState,
    hub: ChangeHub,
}

impl SceneStore {
    pub fn new(state: SceneState) -> Self {
        Self {
            state,
            hub: ChangeHub::new(),
        }
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// Replace the whole state (undo/redo apply, local load).
    pub fn replace(&mut self, state: SceneState) {
        self.state = state;
        self.hub.emit(&self.state, SceneChange::All);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.state.theme != theme {
            self.state.theme = theme;
            self.hub.emit(&self.state, SceneChange::Theme);
        }
    }

    pub fn set_winter(&mut self, on: bool) {
        if self.state.winter_mode != on {
            self.state.winter_mode = on;
            self.hub.emit(&self.state, SceneChange::Winter);
        }
    }

    pub fn set_brush(&mut self, width: f32) {
        let width = width.clamp(1.0, 64.0);
        if self.state.brush != width {
            self.state.brush = width;
            self.hub.emit(&self.state, SceneChange::Brush);
        }
    }

    /// Start a new single-point path and clear the selection.
    pub fn begin_path(&mut self, p: Point) {
        self.state.selected_id = None;
        self.state.paths.push(vec![p]);
        self.hub.emit(&self.state, SceneChange::Selection);
        self.hub.emit(&self.state, SceneChange::Paths);
    }

    /// Append a point to the in-progress path, skipping exact duplicates.
    pub fn extend_path(&mut self, p: Point) {
        let Some(last) = self.state.paths.last_mut() else {
            return;
        };
        if last.last() == Some(&p) {
            return;
        }
        last.push(p);
        self.hub.emit(&self.state, SceneChange::Paths);
    }

    pub fn clear_paths(&mut self) {
        if !self.state.paths.is_empty() {
            self.state.paths.clear();
            self.hub.emit(&self.state, SceneChange::Paths);
        }
    }

    /// Add an item and select it.
    pub fn add_item(&mut self, item: Item) {
        self.state.selected_id = Some(item.id);
        self.state.items.push(item);
        self.hub.emit(&self.state, SceneChange::Items);
        self.hub.emit(&self.state, SceneChange::Selection);
    }

    pub fn remove_item(&mut self, id: ItemId) {
        let before = self.state.items.len();
        self.state.items.retain(|it| it.id != id);
        if self.state.items.len() != before {
            if self.state.selected_id == Some(id) {
                self.state.selected_id = None;
            }
            self.hub.emit(&self.state, SceneChange::Items);
            self.hub.emit(&self.state, SceneChange::Selection);
        }
    }

    pub fn set_item_position(&mut self, id: ItemId, x: f32, y: f32) {
        if let Some(item) = self.state.item_mut(id) {
            item.x = x;
            item.y = y;
            self.hub.emit(&self.state, SceneChange::Items);
        }
    }

    pub fn select(&mut self, id: Option<ItemId>) {
        if self.state.selected_id != id {
            self.state.selected_id = id;
            self.hub.emit(&self.state, SceneChange::Selection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extend_path_skips_duplicate_points() {
        let mut store = SceneStore::default();
        store.begin_path(Point::new(1.0, 1.0));
        store.extend_path(Point::new(1.0, 1.0));
        store.extend_path(Point::new(2.0, 1.0));
        store.extend_path(Point::new(2.0, 1.0));
        assert_eq!(store.state().paths[0].len(), 2);
    }

    #[test]
    fn change_notifications_reach_subscribers() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut store = SceneStore::default();
        let seen = Rc::new(Cell::new(0));
        let seen2 = seen.clone();
        store
            .hub()
            .subscribe(Box::new(move |_, _| seen2.set(seen2.get() + 1)));
        store.set_theme(Theme::Night);
        store.set_theme(Theme::Night); // no-op, no notification
        store.set_brush(20.0);
        assert_eq!(seen.get(), 2);
    }
}
