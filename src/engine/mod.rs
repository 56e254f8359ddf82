//! Parallel frame and clip extraction engine

use image::{imageops::FilterType, RgbImage};

use crate::domain::model::ThumbnailSize;
use crate::ports::ImageCodec;

pub mod clip_extractor;
pub mod frame_extractor;
pub mod pool;

pub use clip_extractor::ClipExtractor;
pub use frame_extractor::FrameExtractor;
pub use pool::WorkerPool;

/// Resize a decoded frame to the thumbnail size with a bilinear filter,
/// leaving it untouched when it already matches.
pub(crate) fn fit_thumbnail(codec: &dyn ImageCodec, image: RgbImage, size: ThumbnailSize) -> RgbImage {
    if image.width() == size.width && image.height() == size.height {
        image
    } else {
        codec.resize(&image, size.width, size.height, FilterType::Triangle)
    }
}
