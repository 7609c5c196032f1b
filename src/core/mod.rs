//! # Core
//!
//! Everything the terminal engine collaborates with but does not own.
//! Nothing in here draws to the screen.
//!
//! ```text
//!     ┌────────────┐   rows / paths    ┌────────────────┐
//!     │  content   │ ────────────────► │                │
//!     └────────────┘                   │      TUI       │
//!     ┌────────────┐   handoff         │  (engine, app) │
//!     │   editor   │ ◄──────────────── │                │
//!     └────────────┘                   └────────────────┘
//!     ┌────────────┐   ┌────────────┐
//!     │   config   │   │  refresh   │
//!     └────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: TOML config file, env vars and CLI flags collapsed into one
//!   `ResolvedConfig`
//! - [`content`]: the `ContentSource` trait and the directory-backed source
//! - [`editor`]: launching the external editor subprocess
//! - [`refresh`]: background work whose result the UI picks up between ticks

pub mod config;
pub mod content;
pub mod editor;
pub mod refresh;
