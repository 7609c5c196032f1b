//! # Widgets
//!
//! Self-painting UI elements registered with the engine.
//!
//! A widget paints through the [`Canvas`] capability: cursor moves, character
//! writes and the current style. The engine implements `Canvas`; a widget
//! only holds it for the duration of one `draw` call and never stores it.
//!
//! New widget kinds implement [`Widget`]. There is no base widget to extend.
//!
//! ## Table layout
//!
//! ```text
//! (x,y) ╭────────╮
//!       │#  Title│   ← headings, bold + underlined
//!       │1  A    │   ← selected row, reverse video
//!       │2  B    │
//!       ╰────────╯
//! ```
//!
//! Each column is `max(heading, every cell) + 1` characters wide.

use ratatui::style::{Modifier, Style};

use super::engine::Cursor;
use super::error::EngineError;

const CORNERS: [char; 4] = ['╭', '╮', '╰', '╯'];
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

/// What a widget may do to the engine while painting itself.
pub trait Canvas {
    /// Surface size as `(width, height)`.
    fn size(&self) -> (u16, u16);

    fn cursor(&self) -> Cursor;

    /// Move the cursor, rejecting coordinates outside the surface.
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), EngineError>;

    /// Put a saved cursor back without bounds checks.
    fn restore_cursor(&mut self, cursor: Cursor);

    /// Paint `c` at the cursor in the current style and advance one column.
    fn write_char(&mut self, c: char);

    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write_char(c);
        }
    }

    fn style(&self) -> Style;

    /// Affects subsequent writes only.
    fn set_style(&mut self, style: Style);

    /// Horizontal rule over columns `x0..x1` of row `y`. The cursor is preserved.
    fn hline(&mut self, x0: u16, x1: u16, y: u16) {
        let saved = self.cursor();
        for x in x0..x1 {
            if self.move_cursor(x.into(), y.into()).is_ok() {
                self.write_char(HORIZONTAL);
            }
        }
        self.restore_cursor(saved);
    }

    /// Vertical rule over rows `y0..y1` of column `x`. The cursor is preserved.
    fn vline(&mut self, y0: u16, y1: u16, x: u16) {
        let saved = self.cursor();
        for y in y0..y1 {
            if self.move_cursor(x.into(), y.into()).is_ok() {
                self.write_char(VERTICAL);
            }
        }
        self.restore_cursor(saved);
    }

    /// Rounded box with corners at `(x, y)` and `(x + w, y + h)`.
    fn frame(&mut self, x: u16, y: u16, w: u16, h: u16) {
        let saved = self.cursor();
        let right = x.saturating_add(w);
        let bottom = y.saturating_add(h);
        self.hline(x, right, y);
        self.hline(x, right, bottom);
        self.vline(y, bottom, x);
        self.vline(y, bottom, right);
        let corners = [(x, y), (right, y), (x, bottom), (right, bottom)];
        for ((cx, cy), corner) in corners.into_iter().zip(CORNERS) {
            if self.move_cursor(cx.into(), cy.into()).is_ok() {
                self.write_char(corner);
            }
        }
        self.restore_cursor(saved);
    }
}

/// A drawable element.
pub trait Widget {
    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), EngineError>;
}

// ============================================================================
// Label
// ============================================================================

/// Fixed text at a fixed origin, written as one run with no wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub x: u16,
    pub y: u16,
    pub text: String,
}

impl Label {
    pub fn new(x: u16, y: u16, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget for Label {
    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), EngineError> {
        canvas.move_cursor(self.x.into(), self.y.into())?;
        canvas.write_str(&self.text);
        Ok(())
    }
}

// ============================================================================
// Table
// ============================================================================

/// A framed grid of strings with headings and a selected row.
///
/// The selection index always stays inside `0..rows.len()` (or 0 when empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub x: u16,
    pub y: u16,
    /// Inactive tables are painted dimmed.
    pub active: bool,
    headings: Vec<String>,
    rows: Vec<Vec<String>>,
    index: usize,
}

impl Table {
    pub fn new(x: u16, y: u16, headings: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            x,
            y,
            active: true,
            headings,
            rows,
            index: 0,
        }
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected_row(&self) -> Option<&[String]> {
        self.rows.get(self.index).map(Vec::as_slice)
    }

    /// Select row `index`, clamped to the last row.
    pub fn select(&mut self, index: usize) {
        self.index = index.min(self.rows.len().saturating_sub(1));
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Replace headings and rows. The selection is clamped to the new rows.
    pub fn set_content(&mut self, headings: Vec<String>, rows: Vec<Vec<String>>) {
        self.headings = headings;
        self.rows = rows;
        self.select(self.index);
    }

    /// Move the selection down one row, wrapping to the top.
    pub fn next_item(&mut self) -> Result<usize, EngineError> {
        if self.rows.is_empty() {
            return Err(EngineError::EmptyTable);
        }
        self.index = (self.index + 1) % self.rows.len();
        Ok(self.index)
    }

    /// Move the selection up one row, wrapping to the bottom.
    pub fn previous_item(&mut self) -> Result<usize, EngineError> {
        if self.rows.is_empty() {
            return Err(EngineError::EmptyTable);
        }
        let len = self.rows.len();
        self.index = (self.index + len - 1) % len;
        Ok(self.index)
    }

    /// Width of every column, one trailing space included.
    pub fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headings.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![1; columns];
        for line in std::iter::once(&self.headings).chain(self.rows.iter()) {
            for (col, item) in line.iter().enumerate() {
                widths[col] = widths[col].max(item.chars().count() + 1);
            }
        }
        widths
    }

    fn draw_line(&self, canvas: &mut dyn Canvas, line: &[String], widths: &[usize]) {
        for (col, width) in widths.iter().enumerate() {
            let item = line.get(col).map_or("", String::as_str);
            canvas.write_str(&format!("{:<width$}", item, width = width));
        }
    }

    fn paint(&self, canvas: &mut dyn Canvas, base: Style) -> Result<(), EngineError> {
        let widths = self.column_widths();
        let inner: usize = widths.iter().sum();
        let inner = u16::try_from(inner).unwrap_or(u16::MAX);
        let height = u16::try_from(self.rows.len()).unwrap_or(u16::MAX);
        let (x, y) = (i32::from(self.x), i32::from(self.y));

        canvas.frame(self.x, self.y, inner.saturating_add(1), height.saturating_add(2));

        canvas.set_style(base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
        canvas.move_cursor(x + 1, y + 1)?;
        self.draw_line(canvas, &self.headings, &widths);

        for (i, row) in self.rows.iter().enumerate() {
            let style = if i == self.index {
                base.add_modifier(Modifier::REVERSED)
            } else {
                base
            };
            canvas.set_style(style);
            canvas.move_cursor(x + 1, y + 2 + i as i32)?;
            self.draw_line(canvas, row, &widths);
        }
        Ok(())
    }
}

impl Widget for Table {
    fn draw(&self, canvas: &mut dyn Canvas) -> Result<(), EngineError> {
        let saved = canvas.style();
        let base = if self.active {
            saved
        } else {
            saved.add_modifier(Modifier::DIM)
        };
        canvas.set_style(base);
        let result = self.paint(canvas, base);
        canvas.set_style(saved);
        result
    }
}
