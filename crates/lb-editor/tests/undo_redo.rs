//! Integration tests: undo/redo through the editor (lb-editor ↔ lb-core).
//!
//! Verifies that every kind of mutation can be withdrawn and re-applied,
//! that ids and order come back exactly, and that the selection follows.

use lb_core::{CreateRequest, Item, ItemId, ItemKind, ItemPatch};
use lb_editor::{ControlHandle, Editor, EditorConfig, HeadlessRenderer, HistoryLimit};
use pretty_assertions::assert_eq;

fn make_editor() -> Editor<HeadlessRenderer> {
    let _ = env_logger::builder().is_test(true).try_init();
    Editor::new(HeadlessRenderer::new(), EditorConfig::default())
}

fn add(editor: &mut Editor<HeadlessRenderer>, request: CreateRequest) -> ItemId {
    editor.post_creation(request);
    editor.flush().created.expect("creation should succeed")
}

fn layer_ids(editor: &Editor<HeadlessRenderer>) -> Vec<ItemId> {
    editor.document().ids().collect()
}

// ─── Worked scenario ────────────────────────────────────────────────────

#[test]
fn text_then_star_scenario() {
    let mut editor = make_editor();

    let text = add(&mut editor, CreateRequest::text("hello"));
    assert_eq!(
        editor.document().items(),
        &[Item::new(ItemId::from(1), ItemKind::Text, "hello")]
    );

    let star = add(&mut editor, CreateRequest::shape("star"));
    assert_eq!(layer_ids(&editor), vec![text, star], "shape on top");
    let two_items = editor.document().clone();

    editor.select(Some(star)).unwrap();
    assert_eq!(editor.move_selected_down(), Ok(true));
    assert_eq!(layer_ids(&editor), vec![star, text]);

    editor.undo();
    assert_eq!(layer_ids(&editor), vec![text, star]);

    editor.undo();
    assert_eq!(layer_ids(&editor), vec![text]);

    editor.redo();
    editor.redo();
    assert_eq!(layer_ids(&editor), vec![star, text]);

    editor.undo();
    assert_eq!(editor.document(), &two_items);
}

// ─── Inverse law ────────────────────────────────────────────────────────

#[test]
fn undo_then_redo_restores_post_mutation_state() {
    let mut editor = make_editor();
    let id = add(&mut editor, CreateRequest::text("a"));

    type Mutation = Box<dyn Fn(&mut Editor<HeadlessRenderer>)>;
    let mutations: Vec<Mutation> = vec![
        Box::new(move |e: &mut Editor<HeadlessRenderer>| {
            e.update(id, &ItemPatch::position(30.0, -12.0)).unwrap();
        }) as Mutation,
        Box::new(|e: &mut Editor<HeadlessRenderer>| {
            add(e, CreateRequest::shape("star"));
        }) as Mutation,
        Box::new(move |e: &mut Editor<HeadlessRenderer>| {
            e.move_up(id).unwrap();
        }) as Mutation,
        Box::new(move |e: &mut Editor<HeadlessRenderer>| {
            e.delete(id).unwrap();
        }) as Mutation,
    ];

    for mutate in mutations {
        mutate(&mut editor);
        let after = editor.document().clone();
        assert!(editor.undo().is_some());
        assert_ne!(editor.document(), &after);
        assert!(editor.redo().is_some());
        assert_eq!(editor.document(), &after);
    }
}

#[test]
fn empty_history_is_a_no_op() {
    let mut editor = make_editor();
    assert_eq!(editor.undo(), None);
    assert_eq!(editor.redo(), None);

    add(&mut editor, CreateRequest::text("a"));
    let current = editor.document().clone();
    assert_eq!(editor.redo(), None);
    assert_eq!(editor.document(), &current);
}

#[test]
fn undo_labels_name_the_step() {
    let mut editor = make_editor();
    let id = add(&mut editor, CreateRequest::shape("star"));
    editor.update(id, &ItemPatch::uniform_scale(2.0)).unwrap();
    editor.delete(id).unwrap();

    assert_eq!(editor.undo().as_deref(), Some("delete shape"));
    assert_eq!(editor.undo().as_deref(), Some("edit properties"));
    assert_eq!(editor.undo().as_deref(), Some("add shape"));
    assert_eq!(editor.redo().as_deref(), Some("add shape"));
}

// ─── Branch discard ─────────────────────────────────────────────────────

#[test]
fn new_mutation_after_undo_discards_redo() {
    let mut editor = make_editor();
    let id = add(&mut editor, CreateRequest::text("a"));
    editor.update(id, &ItemPatch::position(5.0, 5.0)).unwrap();

    editor.undo();
    assert!(editor.can_redo());

    editor.update(id, &ItemPatch::position(9.0, 9.0)).unwrap();
    assert!(!editor.can_redo(), "redo stack should be cleared after new action");
    assert_eq!(editor.redo(), None);
}

// ─── Id stability ───────────────────────────────────────────────────────

#[test]
fn ids_survive_reorder_and_history() {
    let mut editor = make_editor();
    let ids: Vec<ItemId> = ["a", "b", "c"]
        .into_iter()
        .map(|v| add(&mut editor, CreateRequest::text(v)))
        .collect();

    editor.move_down(ids[2]).unwrap();
    editor.move_down(ids[2]).unwrap();
    editor.move_up(ids[0]).unwrap();
    let shuffled = layer_ids(&editor);

    while editor.undo().is_some() {}
    assert!(editor.document().is_empty());
    while editor.redo().is_some() {}
    assert_eq!(layer_ids(&editor), shuffled);

    let mut sorted = layer_ids(&editor);
    sorted.sort_by_key(|id| id.as_number());
    assert_eq!(sorted, ids, "same id set, none re-minted");
}

#[test]
fn redo_of_creation_keeps_id_and_new_items_get_fresh_ones() {
    let mut editor = make_editor();
    let first = add(&mut editor, CreateRequest::text("a"));
    editor.undo();
    editor.redo();
    assert_eq!(layer_ids(&editor), vec![first]);

    editor.undo();
    let second = add(&mut editor, CreateRequest::text("b"));
    assert_ne!(first, second);
}

// ─── Boundary reorder ───────────────────────────────────────────────────

#[test]
fn boundary_reorder_changes_nothing() {
    let mut editor = make_editor();
    let bottom = add(&mut editor, CreateRequest::text("a"));
    let top = add(&mut editor, CreateRequest::text("b"));
    let before = editor.document().clone();
    let depth = editor.history().undo_depth();

    assert_eq!(editor.move_up(top), Ok(false));
    assert_eq!(editor.move_down(bottom), Ok(false));
    assert_eq!(editor.document(), &before);
    assert_eq!(editor.history().undo_depth(), depth, "no-op reorder is not a step");
}

#[test]
fn reorder_without_selection_is_a_no_op() {
    let mut editor = make_editor();
    add(&mut editor, CreateRequest::text("a"));
    add(&mut editor, CreateRequest::text("b"));
    assert_eq!(editor.move_selected_up(), Ok(false));
    assert_eq!(editor.move_selected_down(), Ok(false));
}

// ─── Selection reconciliation ───────────────────────────────────────────

#[test]
fn deleting_selected_item_clears_selection() {
    let mut editor = make_editor();
    let id = add(&mut editor, CreateRequest::shape("star"));
    editor.select(Some(id)).unwrap();

    assert!(editor.request_delete());
    assert_eq!(editor.selected_id(), None);
    assert!(editor.property_sheet().is_none());
    assert_eq!(editor.renderer().selected(), None);
    assert!(!editor.request_delete(), "nothing left to delete");
}

#[test]
fn undoing_past_creation_clears_selection() {
    let mut editor = make_editor();
    let keep = add(&mut editor, CreateRequest::text("keep"));
    let fresh = add(&mut editor, CreateRequest::shape("star"));

    editor.select(Some(fresh)).unwrap();
    editor.undo();
    assert_eq!(editor.selected_id(), None);
    assert!(editor.selected_item().is_none());

    editor.redo();
    editor.select(Some(keep)).unwrap();
    editor.undo();
    assert_eq!(editor.selected_id(), Some(keep), "surviving selection is preserved");
}

#[test]
fn undo_of_delete_restores_item_but_not_selection() {
    let mut editor = make_editor();
    let id = add(&mut editor, CreateRequest::text("a"));
    editor.select(Some(id)).unwrap();
    editor.delete_selected().unwrap();

    editor.undo();
    assert!(editor.document().contains(id));
    assert_eq!(editor.selected_id(), None);
}

// ─── Control handle ─────────────────────────────────────────────────────

fn press_undo(toolbar: &mut dyn ControlHandle) -> bool {
    toolbar.request_undo()
}

#[test]
fn control_handle_drives_history() {
    let mut editor = make_editor();
    assert!(!press_undo(&mut editor));
    add(&mut editor, CreateRequest::text("a"));
    assert!(press_undo(&mut editor));
    assert!(editor.request_redo());
    assert!(!editor.request_redo());
}

// ─── Depth policy ───────────────────────────────────────────────────────

#[test]
fn capped_history_drops_oldest_steps() {
    let config = EditorConfig {
        history: HistoryLimit::Capped(2),
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(HeadlessRenderer::new(), config);
    for v in ["a", "b", "c", "d"] {
        add(&mut editor, CreateRequest::text(v));
    }
    let mut undo_count = 0;
    while editor.undo().is_some() {
        undo_count += 1;
    }
    assert_eq!(undo_count, 2);
    assert_eq!(editor.document().len(), 2);
}
