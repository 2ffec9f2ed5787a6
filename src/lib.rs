#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod audio;
pub mod editor;
pub mod entitlement;
pub mod error;
pub mod history;
pub mod input;
pub mod item;
pub mod publish;
pub mod render;
pub mod scene;
pub mod storage;

pub use app::GardenApp;
pub use audio::{AmbienceLayer, AudioEngine, ChimeKind, OneShot};
pub use editor::{EditorConfig, GardenEditor, Notice};
pub use entitlement::Entitlements;
pub use error::{AudioError, EditorError};
pub use history::History;
pub use input::{Gesture, InteractionController, PointerEvent};
pub use item::{HitArea, Item, ItemId, ItemKind, ItemSize};
pub use publish::{PublishError, PublishId, PublishRequest, PublishSink};
pub use render::Renderer;
pub use scene::{Point, SceneChange, SceneState, SceneStore, Theme};
pub use storage::{KeyValueStore, MemoryStore};
