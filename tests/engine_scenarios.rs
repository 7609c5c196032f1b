//! End-to-end engine behavior through the public API, driven by a scripted
//! surface instead of a real terminal.

use crossterm::event::KeyCode;
use hydra::core::editor::{EditorCommand, EditorError};
use hydra::tui::{
    CommandKey, CommandTable, Engine, EngineError, Mode, ScriptedSurface, Surface,
};
use ratatui::style::Modifier;
use std::path::Path;

fn engine(width: u16, height: u16) -> Engine<ScriptedSurface> {
    Engine::new(ScriptedSurface::new(width, height)).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn screen(engine: &Engine<ScriptedSurface>) -> Vec<String> {
    let (_, height) = engine.surface().size();
    (0..height).map(|y| engine.surface().row_text(y)).collect()
}

#[test]
fn test_write_after_move_advances_one_column() {
    let mut engine = engine(8, 5);
    for y in 0..5 {
        for x in 0..8 {
            engine.move_cursor(x, y).unwrap();
            engine.write_char('x');
            let cursor = engine.cursor();
            assert_eq!((cursor.x, cursor.y), (x as u16 + 1, y as u16));
        }
    }
}

#[test]
fn test_out_of_bounds_move_keeps_cursor() {
    let mut engine = engine(8, 5);
    engine.move_cursor(3, 2).unwrap();
    for (x, y) in [(-1, 0), (0, -1), (9, 0), (0, 6), (i32::MAX, i32::MIN)] {
        let err = engine.move_cursor(x, y).unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { .. }));
        assert_eq!((engine.cursor().x, engine.cursor().y), (3, 2));
    }
}

#[test]
fn test_reset_from_paused_with_widgets() {
    let mut engine = engine(20, 6);
    engine.add_label(0, 0, "title");
    engine.add_table(0, 1, strings(&["#"]), vec![strings(&["1"])]);
    engine.move_cursor(4, 4).unwrap();
    engine.suspend().unwrap();

    engine.reset().unwrap();
    assert_eq!((engine.cursor().x, engine.cursor().y), (0, 0));
    assert_eq!(engine.mode(), Mode::Navigate);
    assert_eq!(engine.input_buffer(), "");
    assert_eq!(engine.widget_count(), 0);
    assert!(engine.surface().is_active());
}

#[test]
fn test_table_navigation_wraps_in_both_directions() {
    let mut engine = engine(20, 10);
    for n in 1..=5 {
        let rows = (0..n).map(|i| vec![i.to_string()]).collect();
        let table = engine.add_table(0, 0, strings(&["#"]), rows);
        table.borrow_mut().select(n / 2);
        let start = table.borrow().index();
        for _ in 0..n {
            table.borrow_mut().next_item().unwrap();
        }
        assert_eq!(table.borrow().index(), start);
        for _ in 0..n {
            table.borrow_mut().previous_item().unwrap();
        }
        assert_eq!(table.borrow().index(), start);
    }
}

#[test]
fn test_empty_table_navigation_is_an_error() {
    let mut engine = engine(20, 10);
    let table = engine.add_table(0, 0, strings(&["#"]), Vec::new());
    assert!(matches!(table.borrow_mut().next_item(), Err(EngineError::EmptyTable)));
    assert!(matches!(
        table.borrow_mut().previous_item(),
        Err(EngineError::EmptyTable)
    ));
}

#[test]
fn test_wait_for_input_commits_and_cancels() {
    let mut engine = engine(20, 5);
    engine.surface_mut().push_text("hi");
    engine.surface_mut().push_key(KeyCode::Enter);
    assert_eq!(engine.wait_for_input().unwrap(), "hi");
    assert_eq!(engine.mode(), Mode::Navigate);

    engine.surface_mut().push_text("x");
    engine.surface_mut().push_key(KeyCode::Esc);
    assert_eq!(engine.wait_for_input().unwrap(), "");
    assert_eq!(engine.mode(), Mode::Navigate);
}

#[test]
fn test_confirm_answers() {
    let mut engine = engine(30, 5);

    engine.surface_mut().push_text("y");
    assert!(engine.confirm("Delete? ").unwrap());

    engine.surface_mut().push_text("n");
    assert!(!engine.confirm("Delete? ").unwrap());

    engine.surface_mut().push_key(KeyCode::Enter);
    assert!(!engine.confirm("Delete? ").unwrap());
    assert_eq!(engine.mode(), Mode::Navigate);
    assert!(!engine.style().add_modifier.contains(Modifier::REVERSED));
}

#[test]
fn test_table_draws_selection_and_padding() {
    let mut engine = engine(12, 8);
    engine.add_table(
        0,
        0,
        strings(&["#", "Title"]),
        vec![strings(&["1", "A"]), strings(&["2", "B"])],
    );
    engine.redraw().unwrap();

    let rows = screen(&engine);
    assert_eq!(rows[0], "╭────────╮  ");
    assert_eq!(rows[1], "│# Title │  ");
    assert_eq!(rows[2], "│1 A     │  ");
    assert_eq!(rows[3], "│2 B     │  ");
    assert_eq!(rows[4], "╰────────╯  ");

    let surface = engine.surface();
    assert!(surface.modifiers(1, 1).contains(Modifier::BOLD | Modifier::UNDERLINED));
    assert!(surface.modifiers(1, 2).contains(Modifier::REVERSED));
    assert!(surface.modifiers(2, 2).contains(Modifier::REVERSED));
    assert!(!surface.modifiers(1, 3).contains(Modifier::REVERSED));
}

#[test]
fn test_suspend_resume_restores_screen() {
    let mut engine = engine(24, 8);
    engine.add_label(0, 0, "posts");
    engine.add_table(0, 1, strings(&["#", "Title"]), vec![strings(&["1", "A"])]);
    engine.redraw().unwrap();
    let before = screen(&engine);

    engine.suspend().unwrap();
    assert_eq!(engine.mode(), Mode::Paused);
    assert!(!engine.surface().is_active());
    engine.tick().unwrap();

    engine.resume().unwrap();
    assert_eq!(engine.mode(), Mode::Navigate);
    assert_eq!(screen(&engine), before);
}

#[test]
fn test_bound_command_moves_selection_and_footer_lists_bindings() {
    let mut engine = engine(30, 8);
    let table = engine.add_table(
        0,
        0,
        strings(&["Title"]),
        vec![strings(&["A"]), strings(&["B"])],
    );
    let down = table.clone();
    let commands = CommandTable::new()
        .with(CommandKey::char('j'), "next", move |_| {
            down.borrow_mut().next_item().map(|_| ())
        })
        .with(CommandKey::char('x'), "noop", |_| Ok(()));
    engine.set_commands(commands);

    engine.surface_mut().push_text("zj");
    engine.tick().unwrap();
    assert_eq!(table.borrow().index(), 0);
    engine.tick().unwrap();
    assert_eq!(table.borrow().index(), 1);
    assert!(engine.surface().modifiers(1, 3).contains(Modifier::REVERSED));

    // The next tick paints the footer, then finds the script exhausted
    assert!(matches!(engine.tick(), Err(EngineError::Surface(_))));
    let footer = engine.surface().row_text(7);
    assert!(footer.starts_with("j next x noop"));
    assert_eq!(engine.surface().symbol(0, 6), "─");
}

#[cfg(unix)]
#[test]
fn test_editor_handoff_resumes_on_failure() {
    let mut engine = engine(20, 5);
    engine.add_label(0, 0, "still here");

    let missing = EditorCommand::new("hydra-test-no-such-editor", Vec::new());
    let err = engine.edit(&missing, Path::new("/tmp/post.md")).unwrap_err();
    assert!(matches!(err, EditorError::Launch { .. }));
    assert_eq!(engine.mode(), Mode::Navigate);
    assert!(engine.surface().is_active());
    assert!(engine.surface().row_text(0).starts_with("still here"));

    let ok = EditorCommand::new("true", Vec::new());
    engine.edit(&ok, Path::new("/tmp/post.md")).unwrap();
    assert_eq!(engine.surface().fini_count, 2);
}
