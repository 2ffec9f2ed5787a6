use crate::audio::{AudioEngine, OneShot};
use crate::history::History;
use crate::item::ItemId;
use crate::scene::{Point, SceneState, SceneStore};

/// Pointer events in canvas coordinates, as delivered by the host shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    /// Pointer released outside the canvas; ends the gesture like `Up`.
    UpOutside,
}

/// Active gesture. Exactly one gesture is live at a time; a pointer-down on
/// an item claims the event before the canvas can start a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    Drawing,
    Dragging {
        id: ItemId,
        drag_origin: Point,
        pointer_start: Point,
    },
}

/// Pointer-driven state machine that mutates the scene store and decides
/// where history snapshots happen (only at gesture end, so a whole drag or
/// stroke costs one undo entry).
pub struct InteractionController {
    gesture: Gesture,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Drag origin captured at pointer-down for the item being dragged.
    pub fn drag_origin_for(&self, id: ItemId) -> Option<Point> {
        match self.gesture {
            Gesture::Dragging {
                id: dragging,
                drag_origin,
                ..
            } if dragging == id => Some(drag_origin),
            _ => None,
        }
    }

    /// Abort any in-flight gesture without snapshotting (teardown path).
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        store: &mut SceneStore,
        history: &mut History<SceneState>,
        audio: &AudioEngine,
    ) {
        match (self.gesture, event) {
            (Gesture::Idle, PointerEvent::Down(p)) => {
                if let Some(item) = store.state().item_at(p) {
                    let id = item.id;
                    let drag_origin = Point::new(item.x, item.y);
                    store.select(Some(id));
                    self.gesture = Gesture::Dragging {
                        id,
                        drag_origin,
                        pointer_start: p,
                    };
                    audio.play_effect(OneShot::Click);
                } else {
                    store.begin_path(p);
                    self.gesture = Gesture::Drawing;
                    audio.play_effect(OneShot::Rake);
                }
            }
            (Gesture::Drawing, PointerEvent::Move(p)) => {
                store.extend_path(p);
            }
            (
                Gesture::Dragging {
                    id,
                    drag_origin,
                    pointer_start,
                },
                PointerEvent::Move(p),
            ) => {
                store.set_item_position(
                    id,
                    drag_origin.x + (p.x - pointer_start.x),
                    drag_origin.y + (p.y - pointer_start.y),
                );
            }
            (Gesture::Drawing, PointerEvent::Up(_) | PointerEvent::UpOutside) => {
                history.snapshot(store.state(), true);
                self.gesture = Gesture::Idle;
            }
            (Gesture::Dragging { .. }, PointerEvent::Up(_) | PointerEvent::UpOutside) => {
                audio.play_effect(OneShot::Drop);
                history.snapshot(store.state(), true);
                self.gesture = Gesture::Idle;
            }
            // Moves while idle, redundant downs and stray ups fall through.
            _ => {}
        }
    }
}
