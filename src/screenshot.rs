//! Read side of the screenshot directory: the newest image and its average
//! colour.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{AppError, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Most recently modified image in `dir`, by file extension.
pub fn latest_image(dir: &Path) -> Result<PathBuf> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if !is_image {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, path));
        }
    }

    latest.map(|(_, path)| path).ok_or_else(|| {
        AppError::Image(format!("could not find images in directory {}", dir.display()))
    })
}

/// Mean of every pixel's RGBA channels as `#rrggbb`, or `#rrggbbaa` when the
/// mean alpha is not fully opaque.
pub fn average_color(path: &Path) -> Result<String> {
    let img = image::open(path)?.to_rgba8();
    let n = u64::from(img.width()) * u64::from(img.height());
    if n == 0 {
        return Err(AppError::Image(format!("{} has no pixels", path.display())));
    }

    let mut sums = [0_u64; 4];
    for pixel in img.pixels() {
        for (sum, channel) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(channel);
        }
    }
    // Rounded mean of u8 values always fits in u8.
    let [r, g, b, a] = sums.map(|s| ((s + n / 2) / n) as u8);

    Ok(if a == u8::MAX {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    })
}

/// Average colour of the newest screenshot in `dir`.
pub fn latest_average_color(dir: &Path) -> Result<String> {
    average_color(&latest_image(dir)?)
}
