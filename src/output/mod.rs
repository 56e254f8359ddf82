//! Output naming and writing

pub mod naming;
pub mod writer;

pub use naming::{absolutize, generate_unique_filename, montage_filename, unique_filename};
pub use writer::{resolve_batch, resolve_single, MontageWriter, OutputTarget};
