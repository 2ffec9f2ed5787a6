//! The editor facade: owns the scene store, history, renderer, audio engine
//! and the gesture machine, and exposes every operation the host calls.

use std::cell::Cell;
use std::rc::Rc;

use log::{info, warn};

use crate::audio::{AudioEngine, OneShot};
use crate::entitlement::{Entitlements, ITEM_LIMIT_FREE};
use crate::error::EditorError;
use crate::history::History;
use crate::input::{InteractionController, PointerEvent};
use crate::item::{Item, ItemId, ItemKind};
use crate::publish::{PublishId, PublishRequest, PublishSink};
use crate::render::Renderer;
use crate::scene::{Point, SCENE_KEY, SceneChange, SceneState, SceneStore, Theme};
use crate::storage::KeyValueStore;

/// Feature switches distinguishing the full editor from the reduced one
/// (no winter mode, no gated catalogue, no publish flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub winter_enabled: bool,
    pub gating_enabled: bool,
    pub publish_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            winter_enabled: true,
            gating_enabled: true,
            publish_enabled: true,
        }
    }
}

impl EditorConfig {
    /// The reduced-feature configuration.
    pub fn reduced() -> Self {
        Self {
            winter_enabled: false,
            gating_enabled: false,
            publish_enabled: false,
        }
    }
}

/// User-visible feedback for operations that are no-ops by design.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    PremiumItem,
    ItemLimitReached,
    WinterLocked,
    NothingSelected,
    NothingToUndo,
    NothingToRedo,
    SavedLocally,
    LoadedLocally,
    NothingSaved,
    LoadFailed,
    ImageExported,
    Published(PublishId),
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PremiumItem => write!(f, "This item needs premium."),
            Notice::ItemLimitReached => write!(f, "Item limit reached."),
            Notice::WinterLocked => {
                write!(f, "Winter needs premium (free during December).")
            }
            Notice::NothingSelected => write!(f, "Nothing selected."),
            Notice::NothingToUndo => write!(f, "Nothing to undo."),
            Notice::NothingToRedo => write!(f, "Nothing to redo."),
            Notice::SavedLocally => write!(f, "Saved locally."),
            Notice::LoadedLocally => write!(f, "Loaded local garden."),
            Notice::NothingSaved => write!(f, "No local garden saved yet."),
            Notice::LoadFailed => write!(f, "Could not read the local garden."),
            Notice::ImageExported => write!(f, "Image exported."),
            Notice::Published(id) => write!(f, "Published as {id}."),
        }
    }
}

/// Deterministic golden-angle spiral around the canvas center; spreads new
/// items without collision detection, clamped to a padding from the edges.
fn spiral_position(index: usize, width: f32, height: f32) -> (f32, f32) {
    const PAD: f32 = 28.0;
    let phi = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    let radius = 0.42 * width.min(height) * ((index as f32 + 1.0) / 12.0).sqrt();
    let angle = index as f32 * phi;
    let x = width * 0.5 + radius * angle.cos();
    let y = height * 0.5 + radius * angle.sin();
    (
        x.clamp(PAD, (width - PAD).max(PAD)),
        y.clamp(PAD, (height - PAD).max(PAD)),
    )
}

pub struct GardenEditor {
    store: SceneStore,
    history: History<SceneState>,
    controller: InteractionController,
    renderer: Renderer,
    audio: AudioEngine,
    entitlements: Entitlements,
    config: EditorConfig,
    storage: Box<dyn KeyValueStore>,
    publisher: Option<Box<dyn PublishSink>>,
    notices: Vec<Notice>,
    render_dirty: Rc<Cell<bool>>,
    torn_down: bool,
}

impl GardenEditor {
    pub fn new(
        width: u32,
        height: u32,
        config: EditorConfig,
        entitlements: Entitlements,
        storage: Box<dyn KeyValueStore>,
    ) -> Self {
        Self::with_audio(
            width,
            height,
            config,
            entitlements,
            storage,
            AudioEngine::new(),
        )
    }

    /// Construction with an engine built at a specific sample rate; tests
    /// use a low rate to keep voice synthesis cheap.
    pub fn with_audio(
        width: u32,
        height: u32,
        config: EditorConfig,
        entitlements: Entitlements,
        storage: Box<dyn KeyValueStore>,
        audio: AudioEngine,
    ) -> Self {
        let store = SceneStore::default();
        let render_dirty = Rc::new(Cell::new(true));

        // The render pipeline and the audio engine observe the store
        // independently.
        let dirty = render_dirty.clone();
        store.hub().subscribe(Box::new(move |_, _| dirty.set(true)));
        let remix = audio.handle();
        store.hub().subscribe(Box::new(move |state, change| {
            if matches!(
                change,
                SceneChange::Theme | SceneChange::Winter | SceneChange::All
            ) {
                remix.apply_scene(state.theme, state.winter_mode);
            }
        }));

        let history = History::new(store.state().clone());
        Self {
            store,
            history,
            controller: InteractionController::new(),
            renderer: Renderer::new(width, height),
            audio,
            entitlements,
            config,
            storage,
            publisher: None,
            notices: Vec::new(),
            render_dirty,
            torn_down: false,
        }
    }

    pub fn with_publisher(mut self, publisher: Box<dyn PublishSink>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    // ---- accessors -------------------------------------------------------

    pub fn scene(&self) -> &SceneState {
        self.store.state()
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn config(&self) -> EditorConfig {
        self.config
    }

    pub fn entitlements(&self) -> Entitlements {
        self.entitlements
    }

    /// Swap entitlement inputs (sign-in, upgrade, month rollover).
    pub fn set_entitlements(&mut self, entitlements: Entitlements) {
        self.entitlements = entitlements;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Drain queued user feedback.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        info!("{notice}");
        self.notices.push(notice);
    }

    fn snapshot(&mut self, dedupe: bool) {
        self.history.snapshot(self.store.state(), dedupe);
    }

    // ---- catalogue & entitlement policy ---------------------------------

    /// Kinds the current user may place under the current configuration.
    pub fn allowed_kinds(&self) -> Vec<ItemKind> {
        if self.config.gating_enabled && self.entitlements.premium {
            ItemKind::BASE.into_iter().chain(ItemKind::PREMIUM).collect()
        } else {
            ItemKind::BASE.to_vec()
        }
    }

    pub fn item_limit(&self) -> usize {
        if self.config.gating_enabled {
            self.entitlements.item_limit()
        } else {
            ITEM_LIMIT_FREE
        }
    }

    fn winter_unlocked(&self) -> bool {
        self.config.winter_enabled
            && (!self.config.gating_enabled || self.entitlements.winter_unlocked())
    }

    // ---- scene operations ------------------------------------------------

    pub fn add_item(&mut self, kind: ItemKind) {
        if !self.allowed_kinds().contains(&kind) {
            self.notify(Notice::PremiumItem);
            return;
        }
        if self.store.state().items.len() >= self.item_limit() {
            self.notify(Notice::ItemLimitReached);
            return;
        }
        let (w, h) = self.renderer.size();
        let index = self.store.state().items.len();
        let (x, y) = spiral_position(index, w as f32, h as f32);
        self.store.add_item(Item::new(kind, x, y));
        self.snapshot(false);
        self.audio.play_effect(OneShot::Click);
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.store.state().selected_id else {
            self.notify(Notice::NothingSelected);
            return;
        };
        self.store.remove_item(id);
        self.snapshot(false);
        self.audio.play_effect(OneShot::Click);
    }

    /// Position an item at its captured drag origin (current position when
    /// no drag is active) plus the cumulative delta. Never snapshots; the
    /// gesture end does.
    pub fn move_item(&mut self, id: ItemId, dx: f32, dy: f32) {
        let origin = self.controller.drag_origin_for(id).or_else(|| {
            self.store
                .state()
                .item(id)
                .map(|it| Point::new(it.x, it.y))
        });
        if let Some(origin) = origin {
            self.store.set_item_position(id, origin.x + dx, origin.y + dy);
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.store.set_theme(theme);
        self.snapshot(false);
    }

    pub fn toggle_winter(&mut self) {
        if !self.winter_unlocked() {
            self.notify(Notice::WinterLocked);
            return;
        }
        let on = !self.store.state().winter_mode;
        self.store.set_winter(on);
        self.snapshot(false);
    }

    pub fn set_brush(&mut self, width: f32) {
        self.store.set_brush(width);
        self.snapshot(false);
    }

    pub fn clear_paths(&mut self) {
        self.store.clear_paths();
        self.snapshot(false);
        self.audio.play_effect(OneShot::Click);
    }

    pub fn undo(&mut self) {
        match self.history.undo() {
            Some(state) => self.store.replace(state),
            None => self.notify(Notice::NothingToUndo),
        }
    }

    pub fn redo(&mut self) {
        match self.history.redo() {
            Some(state) => self.store.replace(state),
            None => self.notify(Notice::NothingToRedo),
        }
    }

    // ---- input -----------------------------------------------------------

    /// Feed one pointer event through the gesture machine. The first
    /// pointer-down doubles as the platform's audio unlock gesture.
    pub fn pointer_event(&mut self, event: PointerEvent) {
        if matches!(event, PointerEvent::Down(_)) && !self.audio.is_started() {
            if let Err(err) = self.audio.start() {
                warn!("audio unavailable: {err}");
            }
        }
        self.controller
            .handle(event, &mut self.store, &mut self.history, &self.audio);
    }

    pub fn gesture(&self) -> crate::input::Gesture {
        self.controller.gesture()
    }

    // ---- frame & surface -------------------------------------------------

    /// Apply pending change notifications to the renderer and redraw if
    /// anything changed. Returns whether a redraw happened.
    pub fn frame(&mut self) -> bool {
        if self.render_dirty.replace(false) {
            self.renderer.mark_dirty();
        }
        self.renderer.render_if_dirty(self.store.state())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
    }

    pub fn color_image(&self) -> egui::ColorImage {
        self.renderer.to_color_image()
    }

    // ---- persistence, export, publish ------------------------------------

    pub fn save_local(&mut self) -> Result<(), EditorError> {
        let json = serde_json::to_string(self.store.state())?;
        self.storage.set(SCENE_KEY, json);
        self.audio.play_effect(OneShot::Click);
        self.notify(Notice::SavedLocally);
        Ok(())
    }

    /// Load the locally persisted document. Missing or corrupt documents
    /// leave the current scene untouched.
    pub fn load_local(&mut self) {
        let Some(raw) = self.storage.get(SCENE_KEY) else {
            self.notify(Notice::NothingSaved);
            return;
        };
        match serde_json::from_str::<SceneState>(&raw) {
            Ok(state) => {
                self.store.replace(state);
                self.snapshot(true);
                self.audio.play_effect(OneShot::Click);
                self.notify(Notice::LoadedLocally);
            }
            Err(err) => {
                warn!("discarding unreadable scene document: {err}");
                self.notify(Notice::LoadFailed);
            }
        }
    }

    /// Rasterize the composed layers and return PNG bytes.
    pub fn export_image(&mut self) -> Result<Vec<u8>, EditorError> {
        self.renderer.render(self.store.state());
        let png = self.renderer.encode_png()?;
        self.audio.play_effect(OneShot::Click);
        self.notify(Notice::ImageExported);
        Ok(png)
    }

    /// Export and hand the composition to the publish sink. A failure is
    /// recoverable and never mutates the scene.
    pub fn publish(&mut self, title: &str) -> Result<PublishId, EditorError> {
        if !self.config.publish_enabled {
            return Err(EditorError::PublishDisabled);
        }
        self.renderer.render(self.store.state());
        let request = PublishRequest {
            title: title.to_owned(),
            image_png: self.renderer.encode_png()?,
            scene_json: serde_json::to_string(self.store.state())?,
        };
        let Some(publisher) = self.publisher.as_mut() else {
            return Err(EditorError::NoPublisher);
        };
        let id = publisher.publish(&request)?;
        self.audio.play_effect(OneShot::Click);
        self.notify(Notice::Published(id.clone()));
        Ok(id)
    }

    // ---- teardown --------------------------------------------------------

    /// Cancel the chime timer, release audio voices and cached surfaces,
    /// and drop all change subscriptions. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.controller.reset();
        self.audio.teardown();
        self.renderer.release();
        self.store.hub().clear();
        self.torn_down = true;
    }
}

impl Drop for GardenEditor {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spiral_is_deterministic_and_clamped() {
        let a = spiral_position(0, 800.0, 600.0);
        let b = spiral_position(0, 800.0, 600.0);
        assert_eq!(a, b);
        for i in 0..64 {
            let (x, y) = spiral_position(i, 320.0, 240.0);
            assert!((28.0..=292.0).contains(&x));
            assert!((28.0..=212.0).contains(&y));
        }
    }

    #[test]
    fn spiral_spreads_consecutive_items() {
        let (x0, y0) = spiral_position(0, 800.0, 600.0);
        let (x1, y1) = spiral_position(1, 800.0, 600.0);
        let d = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
        assert!(d > 40.0, "items placed too close: {d}");
    }
}
