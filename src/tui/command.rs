//! # Command Table
//!
//! Maps a physical key to an action plus a short footer label.
//!
//! Lookup is exact equality on [`CommandKey`]: key code, rune and modifier
//! bits. The table is a plain ordered list, so iteration order is
//! registration order (which is also the order shown in the footer), and
//! there is no hashing involved in matching.
//!
//! The table is replaced wholesale via `Engine::set_commands`; there is no
//! incremental add/remove on a live engine.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

use super::engine::Engine;
use super::error::EngineError;

/// The tuple a polled key event is matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandKey {
    pub code: KeyCode,
    pub rune: char,
    pub modifiers: KeyModifiers,
}

impl CommandKey {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let rune = match code {
            KeyCode::Char(c) => c,
            KeyCode::Enter => '\r',
            KeyCode::Esc => '\x1b',
            KeyCode::Tab => '\t',
            KeyCode::Backspace => '\x7f',
            _ => '\0',
        };
        // The case of a character key already lives in the character.
        let modifiers = if matches!(code, KeyCode::Char(_)) {
            modifiers.difference(KeyModifiers::SHIFT)
        } else {
            modifiers
        };
        Self {
            code,
            rune,
            modifiers,
        }
    }

    /// A bare character key, e.g. `CommandKey::char('q')`.
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    /// A named key with no modifiers, e.g. `CommandKey::key(KeyCode::Enter)`.
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// A character key held with Ctrl.
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

impl From<KeyEvent> for CommandKey {
    fn from(event: KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

/// Footer trigger label: the character itself, or the key's name.
impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "^")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Esc => write!(f, "esc"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Backspace => write!(f, "bksp"),
            KeyCode::Delete => write!(f, "del"),
            KeyCode::Up => write!(f, "↑"),
            KeyCode::Down => write!(f, "↓"),
            KeyCode::Left => write!(f, "←"),
            KeyCode::Right => write!(f, "→"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            KeyCode::PageUp => write!(f, "pgup"),
            KeyCode::PageDown => write!(f, "pgdn"),
            KeyCode::F(n) => write!(f, "F{n}"),
            _ => write!(f, "?"),
        }
    }
}

/// A bound callback. It receives the engine that dispatched it.
pub type Action<S> = Box<dyn FnMut(&mut Engine<S>) -> Result<(), EngineError>>;

/// An action plus its footer description.
pub struct Command<S> {
    pub description: String,
    pub(crate) action: Action<S>,
}

impl<S> Command<S> {
    pub fn new<F>(description: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut Engine<S>) -> Result<(), EngineError> + 'static,
    {
        Self {
            description: description.into(),
            action: Box::new(action),
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered key → command mapping.
pub struct CommandTable<S> {
    entries: Vec<(CommandKey, Command<S>)>,
}

impl<S> CommandTable<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `key`. Rebinding an existing key replaces its command in place.
    pub fn bind<F>(&mut self, key: CommandKey, description: impl Into<String>, action: F)
    where
        F: FnMut(&mut Engine<S>) -> Result<(), EngineError> + 'static,
    {
        self.insert(key, Command::new(description, action));
    }

    /// Builder form of [`CommandTable::bind`].
    pub fn with<F>(mut self, key: CommandKey, description: impl Into<String>, action: F) -> Self
    where
        F: FnMut(&mut Engine<S>) -> Result<(), EngineError> + 'static,
    {
        self.bind(key, description, action);
        self
    }

    pub fn insert(&mut self, key: CommandKey, command: Command<S>) {
        match self.position(&key) {
            Some(i) => {
                debug!("Rebinding {:?} to '{}'", key, command.description);
                self.entries[i].1 = command;
            }
            None => self.entries.push((key, command)),
        }
    }

    pub(crate) fn position(&self, key: &CommandKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &CommandKey) -> Option<&Command<S>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut Command<S>> {
        self.entries.get_mut(index).map(|(_, command)| command)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CommandKey, &Command<S>)> {
        self.entries.iter().map(|(k, c)| (k, c))
    }

    /// Footer line: every trigger and description, in registration order.
    pub fn footer_text(&self) -> String {
        self.entries
            .iter()
            .map(|(key, command)| format!("{} {}", key, command.description))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<S> Default for CommandTable<S> {
    fn default() -> Self {
        Self::new()
    }
}
