//! Engine error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A cursor move landed outside the surface. The cursor is unchanged.
    #[error("cursor ({x}, {y}) out of bounds for {width}x{height} surface")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u16,
        height: u16,
    },

    /// Selection navigation on a table with no rows.
    #[error("table has no rows to select")]
    EmptyTable,

    /// Blocking input was requested while the terminal is handed off.
    #[error("engine is suspended")]
    Suspended,

    #[error("terminal surface error: {0}")]
    Surface(#[from] std::io::Error),
}
