use std::collections::HashSet;

use zengarden::{
    AudioEngine, EditorConfig, Entitlements, GardenEditor, ItemKind, MemoryStore, Notice,
    entitlement::{ITEM_LIMIT_FREE, ITEM_LIMIT_PREMIUM},
};

fn editor_with(config: EditorConfig, entitlements: Entitlements) -> GardenEditor {
    GardenEditor::with_audio(
        800,
        600,
        config,
        entitlements,
        Box::new(MemoryStore::new()),
        AudioEngine::with_sample_rate(8000.0),
    )
}

fn free_editor() -> GardenEditor {
    editor_with(EditorConfig::default(), Entitlements::new(false, 6))
}

fn premium_editor() -> GardenEditor {
    editor_with(EditorConfig::default(), Entitlements::new(true, 6))
}

#[test]
fn add_item_selects_sizes_and_snapshots() {
    let mut editor = free_editor();
    editor.add_item(ItemKind::StoneFlat);

    let scene = editor.scene();
    assert_eq!(scene.items.len(), 1);
    assert_eq!(scene.items[0].kind, ItemKind::StoneFlat);
    assert_eq!(scene.selected_id, Some(scene.items[0].id));
    assert_eq!(editor.history_depth(), 2); // seed + one snapshot
}

#[test]
fn slot_cap_rejects_item_past_the_limit() {
    let mut editor = free_editor();
    for _ in 0..ITEM_LIMIT_FREE {
        editor.add_item(ItemKind::StoneFlat);
    }
    assert_eq!(editor.scene().items.len(), ITEM_LIMIT_FREE);
    editor.take_notices();

    editor.add_item(ItemKind::StoneFlat);
    assert_eq!(editor.scene().items.len(), ITEM_LIMIT_FREE);
    assert_eq!(editor.take_notices(), vec![Notice::ItemLimitReached]);
}

#[test]
fn premium_cap_is_higher() {
    let editor = premium_editor();
    assert_eq!(editor.item_limit(), ITEM_LIMIT_PREMIUM);
}

#[test]
fn gated_kind_is_denied_without_premium() {
    let mut editor = free_editor();
    editor.add_item(ItemKind::ToriiGate);
    assert!(editor.scene().items.is_empty());
    assert_eq!(editor.take_notices(), vec![Notice::PremiumItem]);

    let mut editor = premium_editor();
    editor.add_item(ItemKind::ToriiGate);
    assert_eq!(editor.scene().items.len(), 1);
}

#[test]
fn reduced_config_exposes_only_the_base_catalogue() {
    // Even a premium user sees the reduced variant's catalogue and cap.
    let editor = editor_with(EditorConfig::reduced(), Entitlements::new(true, 12));
    assert_eq!(editor.allowed_kinds(), ItemKind::BASE.to_vec());
    assert_eq!(editor.item_limit(), ITEM_LIMIT_FREE);
}

#[test]
fn item_ids_stay_unique_across_add_remove_cycles() {
    let mut editor = free_editor();
    let mut seen = HashSet::new();
    for round in 0..4 {
        for _ in 0..3 {
            editor.add_item(ItemKind::StoneOval);
            let id = editor.scene().selected_id.unwrap();
            assert!(seen.insert(id), "duplicate id in round {round}");
        }
        editor.remove_selected();
    }
    assert_eq!(seen.len(), 12);
}

#[test]
fn remove_without_selection_is_a_noop_with_feedback() {
    let mut editor = free_editor();
    editor.remove_selected();
    assert_eq!(editor.take_notices(), vec![Notice::NothingSelected]);
    assert_eq!(editor.history_depth(), 1);
}

#[test]
fn winter_is_gated_by_premium_or_december() {
    let mut editor = editor_with(EditorConfig::default(), Entitlements::new(false, 6));
    editor.toggle_winter();
    assert!(!editor.scene().winter_mode);
    assert_eq!(editor.take_notices(), vec![Notice::WinterLocked]);

    let mut editor = editor_with(EditorConfig::default(), Entitlements::new(false, 12));
    editor.toggle_winter();
    assert!(editor.scene().winter_mode);
    editor.toggle_winter();
    assert!(!editor.scene().winter_mode);

    let mut editor = editor_with(EditorConfig::default(), Entitlements::new(true, 3));
    editor.toggle_winter();
    assert!(editor.scene().winter_mode);
}

#[test]
fn winter_is_unavailable_in_the_reduced_config() {
    let mut editor = editor_with(EditorConfig::reduced(), Entitlements::new(true, 12));
    editor.toggle_winter();
    assert!(!editor.scene().winter_mode);
    assert_eq!(editor.take_notices(), vec![Notice::WinterLocked]);
}

#[test]
fn add_undo_redo_scenario_keeps_order_and_selection() {
    let mut editor = free_editor();
    editor.add_item(ItemKind::StoneFlat);
    editor.add_item(ItemKind::Leaf);
    let leaf_id = editor.scene().selected_id.unwrap();

    editor.undo();
    assert_eq!(editor.scene().items.len(), 1);
    assert_eq!(editor.scene().items[0].kind, ItemKind::StoneFlat);

    editor.redo();
    let scene = editor.scene();
    let kinds: Vec<_> = scene.items.iter().map(|it| it.kind).collect();
    assert_eq!(kinds, vec![ItemKind::StoneFlat, ItemKind::Leaf]);
    assert_eq!(scene.selected_id, Some(leaf_id));
}
