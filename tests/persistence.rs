use zengarden::{
    AudioEngine, EditorConfig, EditorError, Entitlements, GardenEditor, ItemKind, KeyValueStore,
    MemoryStore, Notice, Point, PointerEvent, PublishError, PublishId, PublishRequest,
    PublishSink, SceneState, Theme, scene::SCENE_KEY,
};

fn editor_with_store(store: MemoryStore) -> GardenEditor {
    GardenEditor::with_audio(
        800,
        600,
        EditorConfig::default(),
        Entitlements::new(true, 6),
        Box::new(store),
        AudioEngine::with_sample_rate(8000.0),
    )
}

fn test_editor() -> GardenEditor {
    editor_with_store(MemoryStore::new())
}

/// Publish sink double that checks the request shape and answers from a
/// script.
struct FakeSink {
    result: Result<PublishId, PublishError>,
}

impl PublishSink for FakeSink {
    fn publish(&mut self, request: &PublishRequest) -> Result<PublishId, PublishError> {
        assert!(!request.title.is_empty());
        assert!(request.image_png.starts_with(b"\x89PNG"));
        assert!(request.scene_json.contains("theme"));
        self.result.clone()
    }
}

#[test]
fn save_then_load_round_trips_the_scene() {
    let mut editor = test_editor();
    editor.pointer_event(PointerEvent::Down(Point::new(10.0, 10.0)));
    editor.pointer_event(PointerEvent::Move(Point::new(40.0, 30.0)));
    editor.pointer_event(PointerEvent::Up(Point::new(40.0, 30.0)));
    editor.add_item(ItemKind::KoiPond);
    editor.set_theme(Theme::Dusk);

    let saved = editor.scene().clone();
    editor.save_local().unwrap();

    editor.clear_paths();
    editor.remove_selected();
    editor.set_theme(Theme::Morning);
    assert_ne!(*editor.scene(), saved);

    editor.load_local();
    assert_eq!(*editor.scene(), saved);
}

#[test]
fn loading_with_nothing_saved_keeps_defaults() {
    let mut editor = test_editor();
    editor.load_local();
    assert_eq!(editor.take_notices(), vec![Notice::NothingSaved]);
    assert_eq!(*editor.scene(), SceneState::default());
}

#[test]
fn corrupt_document_is_treated_as_nothing_saved() {
    let mut store = MemoryStore::new();
    store.set(SCENE_KEY, "{not json".into());
    let mut editor = editor_with_store(store);

    editor.set_theme(Theme::Night);
    editor.take_notices();
    editor.load_local();

    assert_eq!(editor.take_notices(), vec![Notice::LoadFailed]);
    assert_eq!(editor.scene().theme, Theme::Night); // untouched
}

#[test]
fn loader_tolerates_missing_and_unknown_fields() {
    let mut store = MemoryStore::new();
    store.set(
        SCENE_KEY,
        r#"{"theme":"night","someFutureField":[1,2,3]}"#.into(),
    );
    let mut editor = editor_with_store(store);
    editor.load_local();

    let scene = editor.scene();
    assert_eq!(scene.theme, Theme::Night);
    assert_eq!(scene.brush, 12.0); // defaulted
    assert!(scene.items.is_empty());
}

#[test]
fn export_image_yields_png_bytes() {
    let mut editor = test_editor();
    editor.add_item(ItemKind::Lantern);
    let png = editor.export_image().unwrap();
    assert!(png.starts_with(b"\x89PNG"));
}

#[test]
fn publish_returns_the_sink_id() {
    let sink = FakeSink {
        result: Ok(PublishId("garden-42".into())),
    };
    let mut editor = test_editor().with_publisher(Box::new(sink));
    editor.add_item(ItemKind::ZenBell);
    editor.take_notices();

    let id = editor.publish("My garden").unwrap();
    assert_eq!(id, PublishId("garden-42".into()));
    assert!(
        editor
            .take_notices()
            .contains(&Notice::Published(PublishId("garden-42".into())))
    );
}

#[test]
fn failed_publish_is_recoverable_and_leaves_the_scene_alone() {
    let sink = FakeSink {
        result: Err(PublishError::Transport("offline".into())),
    };
    let mut editor = test_editor().with_publisher(Box::new(sink));
    editor.add_item(ItemKind::Snowman);
    let before = editor.scene().clone();
    let depth = editor.history_depth();

    let err = editor.publish("doomed").unwrap_err();
    assert!(matches!(
        err,
        EditorError::Publish(PublishError::Transport(_))
    ));
    assert_eq!(*editor.scene(), before);
    assert_eq!(editor.history_depth(), depth);
}

#[test]
fn publish_is_rejected_in_the_reduced_config() {
    let mut editor = GardenEditor::with_audio(
        800,
        600,
        EditorConfig::reduced(),
        Entitlements::new(false, 6),
        Box::new(MemoryStore::new()),
        AudioEngine::with_sample_rate(8000.0),
    );
    assert!(matches!(
        editor.publish("nope"),
        Err(EditorError::PublishDisabled)
    ));
}
