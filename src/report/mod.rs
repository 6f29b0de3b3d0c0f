//! Presentation and export collaborators that turn a [`ProjectionSeries`] into
//! something a person reads or saves. None of this feeds back into the engine.
//!
//! [`ProjectionSeries`]: crate::core::ProjectionSeries

mod chart;
mod export;
mod format;
mod table;

pub use chart::{render_svg, write_svg};
pub use export::{DEFAULT_EXPORT_FILE, to_csv, write_atomically, write_csv};
pub use format::{DISPLAY_UNIT, format_currency, format_units};
pub use table::render_table;
