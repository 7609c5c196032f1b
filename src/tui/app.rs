//! # Post Screen
//!
//! The host screen: a title, a table of posts and a status line, plus the
//! commands that act on the selected post.
//!
//! ```text
//! hydra: ~/notes
//! ╭──────────────────────────╮
//! │#  Date       Title       │
//! │1  2024/03/01 first-post  │
//! ╰──────────────────────────╯
//!
//! Deleted ~/notes/old.md                 ← status
//! ──────────────────────────────────────
//! j next k prev e edit d delete ...      ← footer
//! ```
//!
//! The screen owns no engine. Every action receives the engine that
//! dispatched it and captures only the widget handles and shared state it
//! touches. When the table goes from empty to non-empty (or back) the command
//! table is rebuilt, so selection commands only exist when there is something
//! to select.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use log::{debug, warn};

use crate::core::content::ContentSource;
use crate::core::editor::{EditorCommand, EditorError};

use super::command::{CommandKey, CommandTable};
use super::engine::{Engine, Handle};
use super::error::EngineError;
use super::surface::Surface;
use super::widgets::{Label, Table};

struct ScreenState<C> {
    source: C,
    editor: EditorCommand,
}

pub struct PostScreen<C> {
    state: Rc<RefCell<ScreenState<C>>>,
    table: Handle<Table>,
    status: Handle<Label>,
}

impl<C> Clone for PostScreen<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            table: self.table.clone(),
            status: self.status.clone(),
        }
    }
}

/// The status line sits on the row just above the footer rule.
fn status_row_for<S: Surface + 'static>(engine: &Engine<S>) -> u16 {
    engine.surface().size().1.saturating_sub(3)
}

impl<C: ContentSource + 'static> PostScreen<C> {
    /// Register the screen's widgets and commands with `engine`.
    pub fn install<S: Surface + 'static>(
        engine: &mut Engine<S>,
        source: C,
        editor: EditorCommand,
        heading: &str,
    ) -> Self {
        engine.add_label(0, 0, heading);
        let table = engine.add_table(0, 1, source.headings(), source.rows());
        let status = engine.add_label(0, status_row_for(engine), "");
        let screen = Self {
            state: Rc::new(RefCell::new(ScreenState { source, editor })),
            table,
            status,
        };
        engine.set_commands(screen.commands());
        screen
    }

    pub fn table(&self) -> &Handle<Table> {
        &self.table
    }

    pub fn status(&self) -> String {
        self.status.borrow().text.clone()
    }

    pub fn set_status(&self, text: impl Into<String>) {
        self.status.borrow_mut().set_text(text);
    }

    pub fn status_row(&self) -> u16 {
        self.status.borrow().y
    }

    /// Keep the status line above the footer after a resize. Returns true
    /// when it moved, in which case the caller should redraw.
    pub fn relayout<S: Surface + 'static>(&self, engine: &Engine<S>) -> bool {
        let row = status_row_for(engine);
        let mut status = self.status.borrow_mut();
        if status.y == row {
            return false;
        }
        debug!("Status line moved from row {} to {}", status.y, row);
        status.y = row;
        true
    }

    /// Run `f` against the content source.
    pub fn with_source<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.state.borrow_mut().source)
    }

    /// Copy the source's rows into the table, rebuilding the commands when
    /// the table's emptiness changed.
    pub fn sync<S: Surface + 'static>(&self, engine: &mut Engine<S>) {
        let (headings, rows) = {
            let state = self.state.borrow();
            (state.source.headings(), state.source.rows())
        };
        let was_empty = self.table.borrow().is_empty();
        self.table.borrow_mut().set_content(headings, rows);
        if self.table.borrow().is_empty() != was_empty {
            engine.set_commands(self.commands());
        }
    }

    fn commands<S: Surface + 'static>(&self) -> CommandTable<S> {
        let mut commands = CommandTable::new();
        if !self.table.borrow().is_empty() {
            let table = self.table.clone();
            commands.bind(CommandKey::char('j'), "next", move |_| {
                table.borrow_mut().next_item().map(|_| ())
            });
            let table = self.table.clone();
            commands.bind(CommandKey::char('k'), "prev", move |_| {
                table.borrow_mut().previous_item().map(|_| ())
            });
            let screen = self.clone();
            commands.bind(CommandKey::char('e'), "edit", move |engine| {
                screen.edit_selected(engine)
            });
            let screen = self.clone();
            commands.bind(CommandKey::char('d'), "delete", move |engine| {
                screen.delete_selected(engine)
            });
        }
        let screen = self.clone();
        commands.bind(CommandKey::char('n'), "new", move |engine| screen.new_post(engine));
        let screen = self.clone();
        commands.bind(CommandKey::char('r'), "refresh", move |engine| {
            screen.reload(engine);
            Ok(())
        });
        commands.bind(CommandKey::char('q'), "quit", |engine| engine.close());
        commands
    }

    /// Re-read the source and show the result.
    fn reload<S: Surface + 'static>(&self, engine: &mut Engine<S>) {
        if let Err(e) = self.with_source(|source| source.refresh()) {
            warn!("Refresh failed: {}", e);
            self.set_status(format!("Refresh failed: {e}"));
        }
        self.sync(engine);
    }

    /// Hand the terminal to the editor. Editor failures end up in the status
    /// line; only engine failures propagate.
    fn open_in_editor<S: Surface + 'static>(
        &self,
        engine: &mut Engine<S>,
        path: &Path,
    ) -> Result<(), EngineError> {
        let editor = self.state.borrow().editor.clone();
        match engine.edit(&editor, path) {
            Ok(()) => self.set_status(format!("Edited {}", path.display())),
            Err(EditorError::Engine(e)) => return Err(e),
            Err(e) => {
                warn!("Editor failed: {}", e);
                self.set_status(format!("Editor failed: {e}"));
            }
        }
        self.reload(engine);
        Ok(())
    }

    fn edit_selected<S: Surface + 'static>(
        &self,
        engine: &mut Engine<S>,
    ) -> Result<(), EngineError> {
        let index = self.table.borrow().index();
        let Some(path) = self.state.borrow().source.path_of(index) else {
            return Ok(());
        };
        self.open_in_editor(engine, &path)
    }

    /// Blank the status line and park the cursor on it for a prompt.
    /// Returns false, with the reason in the status line, when there is no
    /// room for one.
    fn prompt_at_status<S: Surface + 'static>(
        &self,
        engine: &mut Engine<S>,
    ) -> Result<bool, EngineError> {
        self.relayout(engine);
        self.set_status("");
        engine.redraw()?;
        match engine.move_cursor(0, self.status_row().into()) {
            Ok(()) => Ok(true),
            Err(e @ EngineError::OutOfBounds { .. }) => {
                warn!("No room for a prompt: {}", e);
                self.set_status("Terminal too small");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn new_post<S: Surface + 'static>(&self, engine: &mut Engine<S>) -> Result<(), EngineError> {
        if !self.prompt_at_status(engine)? {
            return Ok(());
        }
        engine.write_str("New title: ");
        let title = engine.wait_for_input()?;
        if title.trim().is_empty() {
            self.set_status("Cancelled");
            return Ok(());
        }

        let created = self.with_source(|source| source.create(&title));
        match created {
            Ok(path) => {
                debug!("New post at {}", path.display());
                self.sync(engine);
                self.select_path(&path);
                self.open_in_editor(engine, &path)
            }
            Err(e) => {
                self.set_status(format!("Could not create post: {e}"));
                Ok(())
            }
        }
    }

    fn select_path(&self, path: &Path) {
        let state = self.state.borrow();
        let found = (0..self.table.borrow().len())
            .find(|&i| state.source.path_of(i).as_deref() == Some(path));
        if let Some(index) = found {
            self.table.borrow_mut().select(index);
        }
    }

    fn delete_selected<S: Surface + 'static>(
        &self,
        engine: &mut Engine<S>,
    ) -> Result<(), EngineError> {
        let (index, title) = {
            let table = self.table.borrow();
            let title = table
                .selected_row()
                .and_then(|row| row.last().cloned())
                .unwrap_or_default();
            (table.index(), title)
        };
        if !self.prompt_at_status(engine)? {
            return Ok(());
        }
        if !engine.confirm(&format!("Delete '{title}'? [y/N] "))? {
            self.set_status("Kept");
            return Ok(());
        }

        let deleted = self.with_source(|source| source.delete(index));
        match deleted {
            Ok(path) => self.set_status(format!("Deleted {}", path.display())),
            Err(e) => self.set_status(format!("Delete failed: {e}")),
        }
        self.sync(engine);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::DirectorySource;
    use crate::test_support::engine;
    use crate::tui::surface::{ScriptedSurface, SurfaceEvent};
    use crossterm::event::KeyCode;
    use std::fs;

    type Fixture = (tempfile::TempDir, Engine<ScriptedSurface>, PostScreen<DirectorySource>);

    fn screen_for(files: &[&str], editor: EditorCommand) -> Fixture {
        screen_sized(files, editor, 60, 16)
    }

    fn screen_sized(files: &[&str], editor: EditorCommand, width: u16, height: u16) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            fs::write(dir.path().join(name), "body").unwrap();
        }
        let mut source = DirectorySource::new(dir.path(), "md");
        source.refresh().unwrap();
        let mut engine = engine(width, height);
        let screen = PostScreen::install(&mut engine, source, editor, "hydra");
        engine.redraw().unwrap();
        (dir, engine, screen)
    }

    fn true_editor() -> EditorCommand {
        EditorCommand::new("true", Vec::new())
    }

    #[test]
    fn test_install_lists_rows() {
        let (_dir, engine, screen) = screen_for(&["a.md", "b.md"], true_editor());
        assert_eq!(screen.table().borrow().len(), 2);
        assert_eq!(engine.widget_count(), 3);
        assert!(engine.surface().row_text(3).contains('a'));
    }

    #[test]
    fn test_empty_table_has_no_selection_commands() {
        let (_dir, engine, _screen) = screen_for(&[], true_editor());
        assert!(engine.commands().get(&CommandKey::char('j')).is_none());
        assert!(engine.commands().get(&CommandKey::char('d')).is_none());
        assert!(engine.commands().get(&CommandKey::char('n')).is_some());
    }

    #[test]
    fn test_j_and_k_move_selection() {
        let (_dir, mut engine, screen) = screen_for(&["a.md", "b.md", "c.md"], true_editor());
        engine.surface_mut().push_text("jjjk");
        for _ in 0..4 {
            engine.tick().unwrap();
        }
        assert_eq!(screen.table().borrow().index(), 2);
    }

    #[test]
    fn test_delete_confirmed_removes_file() {
        let (dir, mut engine, screen) = screen_for(&["a.md", "b.md"], true_editor());
        engine.surface_mut().push_text("dy");
        engine.tick().unwrap();
        assert!(!dir.path().join("a.md").exists());
        assert_eq!(screen.table().borrow().len(), 1);
        assert!(screen.status().starts_with("Deleted"));
    }

    #[test]
    fn test_delete_declined_keeps_file() {
        let (dir, mut engine, screen) = screen_for(&["a.md"], true_editor());
        engine.surface_mut().push_key(KeyCode::Char('d'));
        engine.surface_mut().push_key(KeyCode::Enter);
        engine.tick().unwrap();
        assert!(dir.path().join("a.md").exists());
        assert_eq!(screen.status(), "Kept");
    }

    #[test]
    fn test_deleting_last_row_drops_selection_commands() {
        let (_dir, mut engine, _screen) = screen_for(&["a.md"], true_editor());
        engine.surface_mut().push_text("dy");
        engine.tick().unwrap();
        assert!(engine.commands().get(&CommandKey::char('j')).is_none());
    }

    #[test]
    fn test_new_post_cancelled_with_escape() {
        let (dir, mut engine, screen) = screen_for(&[], true_editor());
        engine.surface_mut().push_text("nabc");
        engine.surface_mut().push_key(KeyCode::Esc);
        engine.tick().unwrap();
        assert_eq!(screen.status(), "Cancelled");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_post_creates_and_edits() {
        let (dir, mut engine, screen) = screen_for(&["a.md"], true_editor());
        engine.surface_mut().push_text("nHello There");
        engine.surface_mut().push_key(KeyCode::Enter);
        engine.tick().unwrap();

        let path = dir.path().join("hello-there.md");
        assert!(path.exists());
        assert_eq!(screen.table().borrow().len(), 2);
        assert_eq!(
            screen.table().borrow().selected_row().unwrap().last().unwrap(),
            "hello-there"
        );
        assert!(screen.status().starts_with("Edited"));
        assert_eq!(engine.surface().fini_count, 1);
        assert!(engine.surface().is_active());
    }

    #[cfg(unix)]
    #[test]
    fn test_editor_failure_is_reported_and_ui_resumes() {
        let editor = EditorCommand::new("false", Vec::new());
        let (_dir, mut engine, screen) = screen_for(&["a.md"], editor);
        engine.surface_mut().push_text("e");
        engine.tick().unwrap();
        assert!(screen.status().starts_with("Editor failed"));
        assert_eq!(engine.mode(), crate::tui::Mode::Navigate);
        assert!(engine.surface().is_active());
        assert!(engine.surface().row_text(13).starts_with("Editor failed"));
    }

    #[test]
    fn test_refresh_picks_up_new_files() {
        let (dir, mut engine, screen) = screen_for(&[], true_editor());
        fs::write(dir.path().join("late.md"), "x").unwrap();
        engine.surface_mut().push_text("r");
        engine.tick().unwrap();
        assert_eq!(screen.table().borrow().len(), 1);
        assert!(engine.commands().get(&CommandKey::char('j')).is_some());
    }

    #[test]
    fn test_relayout_follows_resize() {
        let (_dir, mut engine, screen) = screen_for(&["a.md"], true_editor());
        assert_eq!(screen.status_row(), 13);
        screen.set_status("hello");
        engine.surface_mut().push_event(SurfaceEvent::Resize(60, 10));
        engine.tick().unwrap();

        assert!(screen.relayout(&engine));
        assert!(!screen.relayout(&engine));
        assert_eq!(screen.status_row(), 7);
        engine.redraw().unwrap();
        assert!(engine.surface().row_text(7).starts_with("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_post_after_shrink_prompts_on_visible_row() {
        let (dir, mut engine, screen) = screen_sized(&[], true_editor(), 60, 40);
        engine.surface_mut().push_event(SurfaceEvent::Resize(60, 20));
        engine.surface_mut().push_text("nabc");
        engine.surface_mut().push_key(KeyCode::Enter);
        engine.tick().unwrap();
        engine.tick().unwrap();

        assert_eq!(screen.status_row(), 17);
        assert!(dir.path().join("abc.md").exists());
        assert!(screen.status().starts_with("Edited"));
    }

    #[test]
    fn test_delete_after_shrink_still_confirms() {
        let (dir, mut engine, screen) = screen_sized(&["a.md"], true_editor(), 60, 40);
        engine.surface_mut().push_event(SurfaceEvent::Resize(60, 20));
        engine.surface_mut().push_text("dy");
        engine.tick().unwrap();
        engine.tick().unwrap();

        assert!(!dir.path().join("a.md").exists());
        assert!(screen.status().starts_with("Deleted"));
    }
}
