//! Image decoding with EXIF orientation normalization.

use std::io::Cursor;

use image::RgbaImage;
use tracing::debug;

use crate::error::LoadError;

/// Decode image bytes to RGBA8 and apply the EXIF Orientation tag so that
/// every cached image is upright. Missing or unreadable metadata leaves the
/// pixels as decoded.
pub fn decode_oriented(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let decoded = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| LoadError::Format(err.to_string()))?
        .decode()
        .map_err(|err| LoadError::Format(err.to_string()))?;
    let rgba = decoded.to_rgba8();
    let orientation = read_orientation(bytes).unwrap_or(1);
    Ok(apply_orientation(rgba, orientation))
}

/// The eight EXIF orientation cases. Values outside 1..=8 pass through.
pub fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops;
    match orientation {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => {
            // transpose: rotate90 + horizontal flip
            let rotated = imageops::rotate90(&img);
            imageops::flip_horizontal(&rotated)
        }
        6 => imageops::rotate90(&img),
        7 => {
            // transverse: rotate270 + horizontal flip
            let rotated = imageops::rotate270(&img);
            imageops::flip_horizontal(&rotated)
        }
        8 => imageops::rotate270(&img),
        _ => img,
    }
}

fn read_orientation(bytes: &[u8]) -> Option<u16> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0)?;
    debug!(orientation = value, "exif orientation tag");
    Some(value as u16)
}
