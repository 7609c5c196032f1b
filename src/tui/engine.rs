//! # Render Engine
//!
//! Owns the [`Surface`], the cursor, the current style, the widget list and
//! the command table, and drives everything through a single blocking
//! [`Engine::tick`].
//!
//! ## Modes
//!
//! ```text
//!              wait_for_input / confirm
//!   ┌──────────┐ ─────────────────────► ┌─────────┐
//!   │ Navigate │                        │  Input  │
//!   └──────────┘ ◄───────────────────── └─────────┘
//!     │     ▲          Enter / Esc
//!     │     │
//!  suspend resume
//!     ▼     │
//!   ┌──────────┐
//!   │  Paused  │  ticks are no-ops, the surface belongs to a child process
//!   └──────────┘
//! ```
//!
//! - **Navigate**: a key press is matched against the command table. A hit
//!   runs the bound action, then the whole screen is redrawn. Misses are
//!   ignored.
//! - **Input**: printable keys append to the input buffer and are echoed at
//!   the cursor. Enter commits, Esc cancels (buffer cleared), Backspace
//!   erases the last character.
//! - **Paused**: entered by [`Engine::suspend`], left by [`Engine::resume`].
//!
//! ## Tick
//!
//! One tick draws the footer, flushes, polls exactly one event and applies it.
//! [`Engine::wait_for_input`] and [`Engine::confirm`] are plain loops over
//! `tick`, so nothing else runs between two ticks.
//!
//! ## Callbacks
//!
//! Bound actions receive `&mut Engine` and may do anything an owner can:
//! register widgets, replace the command table, suspend. Widgets are shared
//! through [`Handle`]s so an action can capture exactly the widgets it needs.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use ratatui::style::{Modifier, Style};

use crate::core::editor::{EditorCommand, EditorError};

use super::command::{Action, CommandKey, CommandTable};
use super::error::EngineError;
use super::surface::{Surface, SurfaceEvent};
use super::widgets::{Canvas, Label, Table, Widget};

/// Grid position of the write cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
}

/// How polled key events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Navigate,
    Input,
    Paused,
}

/// Shared reference to a registered widget.
pub type Handle<T> = Rc<RefCell<T>>;

const INPUT_INDICATOR: &str = "INPUT";

fn noop_action<S>(_: &mut Engine<S>) -> Result<(), EngineError> {
    Ok(())
}

pub struct Engine<S> {
    surface: S,
    cursor: Cursor,
    style: Style,
    mode: Mode,
    resume_mode: Mode,
    input_buffer: String,
    widgets: Vec<Rc<RefCell<dyn Widget>>>,
    commands: CommandTable<S>,
    /// Bumped by every `set_commands`, so a dispatch can tell whether its
    /// action replaced the table it came from.
    commands_generation: u64,
}

impl<S: Surface + 'static> Engine<S> {
    /// Take ownership of `surface`, acquire the terminal and clear it.
    pub fn new(mut surface: S) -> Result<Self, EngineError> {
        surface.init()?;
        surface.clear();
        surface.sync()?;
        let (width, height) = surface.size();
        info!("Engine started on {}x{} surface", width, height);
        Ok(Self {
            surface,
            cursor: Cursor::default(),
            style: Style::default(),
            mode: Mode::Navigate,
            resume_mode: Mode::Navigate,
            input_buffer: String::new(),
            widgets: Vec::new(),
            commands: CommandTable::new(),
            commands_generation: 0,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Affects subsequent writes only.
    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// The last committed (or in-progress) input.
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn commands(&self) -> &CommandTable<S> {
        &self.commands
    }

    // ------------------------------------------------------------------------
    // Cursor and writes
    // ------------------------------------------------------------------------

    /// Move the cursor. Coordinates past the surface size are rejected and
    /// leave the cursor where it was.
    pub fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), EngineError> {
        let (width, height) = self.surface.size();
        if x < 0 || y < 0 || x > i32::from(width) || y > i32::from(height) {
            return Err(EngineError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        self.cursor = Cursor {
            x: x as u16,
            y: y as u16,
        };
        Ok(())
    }

    /// Paint at the cursor without advancing it.
    fn put_char(&mut self, c: char) {
        if self.mode == Mode::Paused {
            return;
        }
        self.surface
            .set_cell(self.cursor.x, self.cursor.y, c, self.style);
    }

    /// Paint `c` at the cursor and advance one column. No wrapping.
    pub fn write_char(&mut self, c: char) {
        self.put_char(c);
        self.cursor.x = self.cursor.x.saturating_add(1);
    }

    pub fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
        }
    }

    // ------------------------------------------------------------------------
    // Widgets and commands
    // ------------------------------------------------------------------------

    /// Register a widget. It is painted after every widget registered before it.
    pub fn add_widget<W: Widget + 'static>(&mut self, widget: W) -> Handle<W> {
        let handle = Rc::new(RefCell::new(widget));
        self.widgets.push(handle.clone());
        handle
    }

    pub fn add_label(&mut self, x: u16, y: u16, text: impl Into<String>) -> Handle<Label> {
        self.add_widget(Label::new(x, y, text))
    }

    pub fn add_table(
        &mut self,
        x: u16,
        y: u16,
        headings: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Handle<Table> {
        self.add_widget(Table::new(x, y, headings, rows))
    }

    /// Replace the whole command table.
    pub fn set_commands(&mut self, commands: CommandTable<S>) {
        debug!("Command table replaced ({} bindings)", commands.len());
        self.commands = commands;
        self.commands_generation += 1;
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn draw_widgets(&mut self) {
        let widgets = self.widgets.clone();
        for widget in &widgets {
            if let Err(e) = widget.borrow().draw(self) {
                debug!("Widget not painted: {}", e);
            }
        }
    }

    /// Clear the surface, paint every widget in registration order, flush.
    pub fn redraw(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Paused {
            return Ok(());
        }
        self.surface.clear();
        self.draw_widgets();
        self.surface.sync()?;
        Ok(())
    }

    /// Back to the initial state: blank screen, cursor at the origin,
    /// Navigate mode, empty input buffer, no widgets. The command table is kept.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Paused {
            self.surface.init()?;
        }
        self.surface.clear();
        self.surface.sync()?;
        self.cursor = Cursor::default();
        self.style = Style::default();
        self.mode = Mode::Navigate;
        self.resume_mode = Mode::Navigate;
        self.input_buffer.clear();
        self.widgets.clear();
        debug!("Engine reset");
        Ok(())
    }

    /// Rule on the second-to-last row, mode or bindings on the last row.
    /// Cursor and style are left as they were.
    fn draw_footer(&mut self) {
        let (width, height) = self.surface.size();
        if height < 2 {
            return;
        }
        let text = match self.mode {
            Mode::Navigate => self.commands.footer_text(),
            Mode::Input => INPUT_INDICATOR.to_string(),
            Mode::Paused => return,
        };
        let saved_cursor = self.cursor;
        let saved_style = self.style;
        self.style = Style::default();

        Canvas::hline(self, 0, width, height - 2);
        self.cursor = Cursor {
            x: 0,
            y: height - 1,
        };
        self.write_str(&format!("{:<width$}", text, width = usize::from(width)));

        self.cursor = saved_cursor;
        self.style = saved_style;
    }

    // ------------------------------------------------------------------------
    // Input state machine
    // ------------------------------------------------------------------------

    /// One step: footer, flush, poll one event, apply it. A no-op while paused.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Paused {
            return Ok(());
        }
        self.draw_footer();
        self.surface.sync()?;

        match self.surface.poll_event()? {
            SurfaceEvent::Resize(width, height) => {
                debug!("Resize to {}x{}", width, height);
                self.redraw()?;
            }
            SurfaceEvent::Key(key) => match self.mode {
                Mode::Navigate => self.dispatch(CommandKey::from(key))?,
                Mode::Input => self.handle_input(key),
                Mode::Paused => {}
            },
        }
        Ok(())
    }

    fn dispatch(&mut self, key: CommandKey) -> Result<(), EngineError> {
        let Some(index) = self.commands.position(&key) else {
            return Ok(());
        };
        let generation = self.commands_generation;
        let Some(command) = self.commands.entry_mut(index) else {
            return Ok(());
        };
        debug!("Dispatching {:?} → '{}'", key, command.description);

        // The action borrows the engine mutably, so it is parked outside the
        // table while it runs.
        let mut action: Action<S> =
            std::mem::replace(&mut command.action, Box::new(noop_action::<S>));
        let result = action(self);
        if self.commands_generation == generation {
            if let Some(command) = self.commands.entry_mut(index) {
                command.action = action;
            }
        }
        result?;
        self.redraw()
    }

    fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                debug!("Input committed ({} chars)", self.input_buffer.chars().count());
                self.mode = Mode::Navigate;
            }
            KeyCode::Esc => {
                debug!("Input cancelled");
                self.input_buffer.clear();
                self.mode = Mode::Navigate;
            }
            KeyCode::Backspace => {
                if self.input_buffer.pop().is_some() {
                    self.cursor.x = self.cursor.x.saturating_sub(1);
                    self.put_char(' ');
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input_buffer.push(c);
                self.write_char(c);
            }
            _ => {}
        }
    }

    /// Collect a line of text at the cursor. Blocks until Enter (returns the
    /// typed text) or Esc (returns an empty string).
    pub fn wait_for_input(&mut self) -> Result<String, EngineError> {
        if self.mode == Mode::Paused {
            return Err(EngineError::Suspended);
        }
        self.input_buffer.clear();
        self.mode = Mode::Input;
        while self.mode == Mode::Input {
            if let Err(e) = self.tick() {
                self.mode = Mode::Navigate;
                return Err(e);
            }
        }
        Ok(self.input_buffer.clone())
    }

    /// Show `prompt` in reverse video and wait for a yes/no answer.
    ///
    /// `y`/`Y` accepts, `n`/`N` rejects, and so does finishing with nothing
    /// typed (Enter or Esc). Any other character is erased and ignored.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool, EngineError> {
        if self.mode == Mode::Paused {
            return Err(EngineError::Suspended);
        }
        let saved_style = self.style;
        self.style = saved_style.add_modifier(Modifier::REVERSED);
        self.write_str(prompt);
        self.style = saved_style;

        self.input_buffer.clear();
        self.mode = Mode::Input;
        let answer = self.await_answer();

        self.mode = Mode::Navigate;
        self.style = saved_style;
        self.input_buffer.clear();
        debug!("Confirm '{}' → {:?}", prompt.trim(), answer.as_ref().ok());
        answer
    }

    fn await_answer(&mut self) -> Result<bool, EngineError> {
        loop {
            self.tick()?;
            match self.input_buffer.chars().next() {
                Some('y' | 'Y') => return Ok(true),
                Some('n' | 'N') => return Ok(false),
                Some(_) => {
                    self.input_buffer.clear();
                    self.cursor.x = self.cursor.x.saturating_sub(1);
                    self.put_char(' ');
                }
                None if self.mode != Mode::Input => return Ok(false),
                None => {}
            }
        }
    }

    // ------------------------------------------------------------------------
    // Terminal handoff
    // ------------------------------------------------------------------------

    /// Release the terminal so another process can use it. Until
    /// [`Engine::resume`], the surface is not touched and ticks do nothing.
    pub fn suspend(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Paused {
            return Ok(());
        }
        self.surface.fini()?;
        self.resume_mode = self.mode;
        self.mode = Mode::Paused;
        info!("Terminal suspended");
        Ok(())
    }

    /// Reacquire the terminal, clear it and redraw every widget.
    pub fn resume(&mut self) -> Result<(), EngineError> {
        if self.mode != Mode::Paused {
            return Ok(());
        }
        self.surface.init()?;
        self.surface.clear();
        self.mode = self.resume_mode;
        info!("Terminal resumed");
        self.redraw()
    }

    /// Run `f` with the terminal released. The engine is resumed whether or
    /// not `f` succeeds.
    pub fn handoff<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<EngineError>,
    {
        self.suspend()?;
        let result = f();
        self.resume()?;
        result
    }

    /// Open `path` in `editor`, handing it the terminal until it exits.
    pub fn edit(&mut self, editor: &EditorCommand, path: &Path) -> Result<(), EditorError> {
        self.handoff(|| editor.open(path))
    }

    /// Release the terminal and exit the process.
    pub fn close(&mut self) -> ! {
        if let Err(e) = self.surface.fini() {
            warn!("Failed to release terminal on close: {}", e);
        }
        info!("Engine closed");
        std::process::exit(0)
    }
}

impl<S: Surface + 'static> Canvas for Engine<S> {
    fn size(&self) -> (u16, u16) {
        self.surface.size()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), EngineError> {
        Engine::move_cursor(self, x, y)
    }

    fn restore_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn write_char(&mut self, c: char) {
        Engine::write_char(self, c);
    }

    fn style(&self) -> Style {
        self.style
    }

    fn set_style(&mut self, style: Style) {
        self.style = style;
    }
}
