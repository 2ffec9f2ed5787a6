use zengarden::{
    AudioEngine, EditorConfig, Entitlements, GardenEditor, ItemKind, MemoryStore, Notice, Theme,
};

fn test_editor() -> GardenEditor {
    GardenEditor::with_audio(
        800,
        600,
        EditorConfig::default(),
        Entitlements::new(false, 6),
        Box::new(MemoryStore::new()),
        AudioEngine::with_sample_rate(8000.0),
    )
}

#[test]
fn undo_right_after_a_mutation_restores_the_previous_state() {
    let mut editor = test_editor();
    editor.add_item(ItemKind::Lantern);
    let before = editor.scene().clone();

    editor.set_theme(Theme::Night);
    assert_ne!(*editor.scene(), before);

    editor.undo();
    assert_eq!(*editor.scene(), before);
}

#[test]
fn redo_right_after_undo_restores_the_pre_undo_state() {
    let mut editor = test_editor();
    editor.set_theme(Theme::Dusk);
    let mutated = editor.scene().clone();

    editor.undo();
    assert_eq!(editor.scene().theme, Theme::Day);

    editor.redo();
    assert_eq!(*editor.scene(), mutated);
}

#[test]
fn any_mutation_between_undo_and_redo_clears_the_redo_stack() {
    let mut editor = test_editor();
    editor.set_theme(Theme::Night);
    editor.undo();
    assert!(editor.can_redo());

    editor.add_item(ItemKind::Rake);
    assert!(!editor.can_redo());

    let before = editor.scene().clone();
    editor.redo();
    assert_eq!(*editor.scene(), before);
    assert!(editor.take_notices().contains(&Notice::NothingToRedo));
}

#[test]
fn undo_at_the_seed_is_a_noop_with_feedback() {
    let mut editor = test_editor();
    let before = editor.scene().clone();
    editor.undo();
    assert_eq!(*editor.scene(), before);
    assert_eq!(editor.take_notices(), vec![Notice::NothingToUndo]);
}

#[test]
fn undo_reverses_a_whole_chain_of_operations() {
    let mut editor = test_editor();
    let initial = editor.scene().clone();

    editor.add_item(ItemKind::StoneTall);
    editor.set_theme(Theme::Morning);
    editor.clear_paths();

    editor.undo();
    editor.undo();
    editor.undo();
    assert_eq!(*editor.scene(), initial);
}

#[test]
fn snapshots_are_deep_copies_not_views() {
    // Mutating the live scene after a snapshot must never retroactively
    // change what that snapshot holds.
    let mut editor = test_editor();
    editor.add_item(ItemKind::StoneFlat);
    let id = editor.scene().selected_id.unwrap();
    let placed = editor.scene().item(id).unwrap().x;

    editor.move_item(id, 50.0, 0.0); // live mutation without a snapshot
    editor.undo(); // back before the add
    assert!(editor.scene().items.is_empty());

    editor.redo(); // replay the add snapshot
    assert_eq!(editor.scene().item(id).unwrap().x, placed);
}
