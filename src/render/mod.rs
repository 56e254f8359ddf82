//! Montage rendering: GIF frame preparation, grid layout and composition

pub mod composer;
pub mod fonts;
pub mod gif_frames;
pub mod layout;

pub use composer::{MontageComposer, MontageStyle};
pub use fonts::FontCache;
pub use gif_frames::GifFrameProcessor;
pub use layout::{CellRect, GridCell, GridLayout};
