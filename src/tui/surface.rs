//! # Terminal Surface
//!
//! The addressable character grid the engine paints into. The engine only
//! talks to the [`Surface`] trait; it never drives the terminal directly.
//!
//! Two implementations live here:
//!
//! - [`CrosstermSurface`]: the real terminal. Raw mode + alternate screen via
//!   crossterm, cells staged in a ratatui [`Buffer`] and flushed through a
//!   ratatui [`Terminal`] so only changed cells are written.
//! - [`ScriptedSurface`]: an in-memory grid fed by a queue of events. Used by
//!   the test suite.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──► init() ──► [clear/set_cell/sync/poll_event]* ──► fini()
//!              ▲                                              │
//!              └──────────────── (handoff) ───────────────────┘
//! ```
//!
//! `fini()` releases the terminal completely (cooked mode, main screen,
//! visible cursor) so a child process can own it. `init()` may be called again
//! afterwards to reclaim it.

use std::collections::VecDeque;
use std::io::{self, Stdout, stdout};
use std::sync::Once;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{debug, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

/// An event polled from the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Raw terminal capability consumed by the engine.
pub trait Surface {
    /// Acquire the terminal (raw mode, alternate screen).
    fn init(&mut self) -> io::Result<()>;

    /// Release the terminal back to its normal mode.
    fn fini(&mut self) -> io::Result<()>;

    /// Blank every cell. Takes effect on the next [`Surface::sync`].
    fn clear(&mut self);

    /// Flush pending cell writes to the physical terminal.
    fn sync(&mut self) -> io::Result<()>;

    /// Current grid size as `(width, height)`.
    fn size(&self) -> (u16, u16);

    /// Write one character cell. Coordinates outside the grid are clipped.
    fn set_cell(&mut self, x: u16, y: u16, c: char, style: Style);

    /// Block until the next key or resize event.
    fn poll_event(&mut self) -> io::Result<SurfaceEvent>;
}

/// Write `c` into `buffer` at `(x, y)`, replacing whatever style was there.
fn put_cell(buffer: &mut Buffer, x: u16, y: u16, c: char, style: Style) {
    if let Some(cell) = buffer.cell_mut((x, y)) {
        cell.reset();
        cell.set_char(c).set_style(style);
    }
}

// ============================================================================
// Crossterm Surface
// ============================================================================

static PANIC_HOOK: Once = Once::new();

/// Restore the terminal to normal mode. Safe to call when it was never set up.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            original_hook(panic_info);
        }));
    });
}

/// The real terminal, driven through crossterm and ratatui.
pub struct CrosstermSurface {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    back: Buffer,
}

impl CrosstermSurface {
    pub fn new() -> Self {
        install_panic_hook();
        Self {
            terminal: None,
            back: Buffer::empty(Rect::default()),
        }
    }

    fn resize_back(&mut self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        if self.back.area != area {
            debug!("Surface resized to {}x{}", width, height);
            self.back.resize(area);
        }
    }
}

impl Default for CrosstermSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for CrosstermSurface {
    fn init(&mut self) -> io::Result<()> {
        if self.terminal.is_some() {
            return Ok(());
        }
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        terminal.clear()?;
        let (width, height) = crossterm::terminal::size()?;
        self.resize_back(width, height);
        self.back.reset();
        self.terminal = Some(terminal);
        debug!("Terminal acquired ({}x{})", width, height);
        Ok(())
    }

    /// On failure the terminal stays held, so the caller can retry.
    fn fini(&mut self) -> io::Result<()> {
        if self.terminal.is_some() {
            restore_terminal()?;
            self.terminal = None;
            debug!("Terminal released");
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.back.reset();
    }

    fn sync(&mut self) -> io::Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };
        let back = &self.back;
        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            for y in 0..area.height.min(back.area.height) {
                for x in 0..area.width.min(back.area.width) {
                    if let (Some(src), Some(dst)) = (back.cell((x, y)), buf.cell_mut((x, y))) {
                        *dst = src.clone();
                    }
                }
            }
        })?;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.back.area.width, self.back.area.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, c: char, style: Style) {
        put_cell(&mut self.back, x, y, c, style);
    }

    fn poll_event(&mut self) -> io::Result<SurfaceEvent> {
        loop {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    return Ok(SurfaceEvent::Key(key));
                }
                Event::Resize(width, height) => {
                    self.resize_back(width, height);
                    return Ok(SurfaceEvent::Resize(width, height));
                }
                _ => {}
            }
        }
    }
}

impl Drop for CrosstermSurface {
    fn drop(&mut self) {
        if let Err(e) = self.fini() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

// ============================================================================
// Scripted Surface
// ============================================================================

/// In-memory surface replaying a fixed queue of events.
///
/// Polling past the end of the queue fails with `UnexpectedEof`, so a blocking
/// loop driven by this surface always terminates.
pub struct ScriptedSurface {
    buffer: Buffer,
    events: VecDeque<SurfaceEvent>,
    active: bool,
    /// Number of `init()` calls.
    pub init_count: usize,
    /// Number of `fini()` calls.
    pub fini_count: usize,
    /// Number of `sync()` calls.
    pub sync_count: usize,
    /// Cell writes or syncs attempted while released.
    pub inactive_writes: usize,
    /// Make `fini()` fail and keep the surface held.
    pub fail_fini: bool,
}

impl ScriptedSurface {
    /// An already-initialised surface of the given size with no events queued.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffer: Buffer::empty(Rect::new(0, 0, width, height)),
            events: VecDeque::new(),
            active: true,
            init_count: 0,
            fini_count: 0,
            sync_count: 0,
            inactive_writes: 0,
            fail_fini: false,
        }
    }

    pub fn push_event(&mut self, event: SurfaceEvent) {
        self.events.push_back(event);
    }

    pub fn push_key(&mut self, code: KeyCode) {
        self.push_event(SurfaceEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    /// Queue one `Char` key press per character of `text`.
    pub fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            self.push_key(KeyCode::Char(c));
        }
    }

    /// Events not yet polled.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The symbol at `(x, y)`, or an empty string outside the grid.
    pub fn symbol(&self, x: u16, y: u16) -> &str {
        self.buffer.cell((x, y)).map_or("", |cell| cell.symbol())
    }

    /// The modifiers painted at `(x, y)`.
    pub fn modifiers(&self, x: u16, y: u16) -> Modifier {
        self.buffer
            .cell((x, y))
            .map_or(Modifier::empty(), |cell| cell.modifier)
    }

    /// Row `y` as a string, trailing blanks included.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.buffer.area.width)
            .map(|x| self.symbol(x, y))
            .collect()
    }
}

impl Surface for ScriptedSurface {
    fn init(&mut self) -> io::Result<()> {
        self.active = true;
        self.init_count += 1;
        Ok(())
    }

    fn fini(&mut self) -> io::Result<()> {
        if self.fail_fini {
            return Err(io::Error::other("scripted fini failure"));
        }
        self.active = false;
        self.fini_count += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.buffer.reset();
    }

    fn sync(&mut self) -> io::Result<()> {
        if !self.active {
            self.inactive_writes += 1;
        }
        self.sync_count += 1;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.buffer.area.width, self.buffer.area.height)
    }

    fn set_cell(&mut self, x: u16, y: u16, c: char, style: Style) {
        if !self.active {
            self.inactive_writes += 1;
        }
        put_cell(&mut self.buffer, x, y, c, style);
    }

    fn poll_event(&mut self) -> io::Result<SurfaceEvent> {
        let event = self.events.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted events exhausted")
        })?;
        if let SurfaceEvent::Resize(width, height) = event {
            self.buffer.resize(Rect::new(0, 0, width, height));
        }
        Ok(event)
    }
}
