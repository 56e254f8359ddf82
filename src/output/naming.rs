//! Output file naming

use std::path::{Component, Path, PathBuf};

use crate::domain::model::OutputFormat;

/// Longest file name most filesystems accept
pub const MAX_FILENAME_LEN: usize = 255;

const MONTAGE_SUFFIX: &str = "_montage";

/// Absolute form of `path`: resolved when it exists, otherwise joined to the
/// working directory without touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.exists() {
        if let Ok(resolved) = path.canonicalize() {
            return resolved;
        }
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

/// `<stem>_montage.<ext>` for a single input
pub fn montage_filename(video: &Path, format: OutputFormat) -> String {
    format!("{}{}.{}", stem(video), MONTAGE_SUFFIX, format.extension())
}

/// Batch file name for the JPEG montage of `video` found under `input_root`
pub fn generate_unique_filename(video: &Path, input_root: &Path) -> String {
    unique_filename(video, input_root, OutputFormat::Jpg)
}

/// Batch file name: directories between `input_root` and `video` are joined
/// with underscores in front of the stem, e.g. `sub_dir_clip_montage.gif`.
///
/// Names longer than [`MAX_FILENAME_LEN`] lose their top-most directories
/// first; the stem is truncated only when no directory is left to drop.
pub fn unique_filename(video: &Path, input_root: &Path, format: OutputFormat) -> String {
    let video = absolutize(video);
    let root = absolutize(input_root);
    let suffix = format!("{}.{}", MONTAGE_SUFFIX, format.extension());
    let base = stem(&video);

    let Ok(relative) = video.strip_prefix(&root) else {
        return format!("{}{}", base, suffix);
    };

    let mut dirs: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let build = |dirs: &[String], base: &str| {
        if dirs.is_empty() {
            format!("{}{}", base, suffix)
        } else {
            format!("{}_{}{}", dirs.join("_"), base, suffix)
        }
    };

    let mut filename = build(&dirs, &base);
    while filename.chars().count() > MAX_FILENAME_LEN && !dirs.is_empty() {
        dirs.remove(0);
        filename = build(&dirs, &base);
    }

    if filename.chars().count() > MAX_FILENAME_LEN {
        let available = MAX_FILENAME_LEN.saturating_sub(suffix.chars().count());
        let truncated: String = base.chars().take(available).collect();
        filename = build(&[], &truncated);
    }

    filename
}
