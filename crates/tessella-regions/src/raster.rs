//! 8-bit raster conversion for label grids.
//!
//! Grids are persisted as single-channel 8-bit images, so labels must fit
//! `0..=255`. Everything here works on in-memory images and byte slices.

use image::{GrayImage, Luma};

use crate::grid::LabelGrid;
use crate::types::{Label, RegionError, Sample};

/// Largest label an 8-bit raster can hold.
pub const MAX_RASTER_LABEL: Label = 255;

/// Convert a grid to an 8-bit image, one pixel per cell.
///
/// # Errors
///
/// Returns [`RegionError::LabelOutOfRange`] if any label exceeds
/// [`MAX_RASTER_LABEL`], or [`RegionError::InvalidDimensions`] if the
/// grid is too large for an image.
pub fn to_gray_image(grid: &LabelGrid) -> Result<GrayImage, RegionError> {
    let pixels = grid
        .as_raw()
        .iter()
        .map(|&label| {
            u8::try_from(label).map_err(|_| RegionError::LabelOutOfRange {
                label,
                max: MAX_RASTER_LABEL,
            })
        })
        .collect::<Result<Vec<u8>, _>>()?;
    let (width, height) = image_dimensions(grid)?;
    GrayImage::from_raw(width, height, pixels).ok_or(RegionError::InvalidDimensions {
        width: grid.width(),
        height: grid.height(),
    })
}

/// Convert an 8-bit image to a grid, one cell per pixel.
///
/// # Errors
///
/// Returns [`RegionError::InvalidDimensions`] for an empty image.
pub fn from_gray_image(image: &GrayImage) -> Result<LabelGrid, RegionError> {
    let data = image.as_raw().iter().map(|&v| Label::from(v)).collect();
    LabelGrid::from_raw(image.width() as usize, image.height() as usize, data)
}

/// Encode a grid as a grayscale PNG.
///
/// # Errors
///
/// Returns [`RegionError::LabelOutOfRange`] if any label exceeds
/// [`MAX_RASTER_LABEL`], or [`RegionError::ImageDecode`] if encoding
/// fails.
pub fn encode_png(grid: &LabelGrid) -> Result<Vec<u8>, RegionError> {
    let image = to_gray_image(grid)?;
    encode_gray_png(&image)
}

/// Encode an 8-bit image as PNG.
///
/// # Errors
///
/// Returns [`RegionError::ImageDecode`] if encoding fails.
pub fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, RegionError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(buf)
}

/// Decode raster bytes (PNG or BMP) into a grid.
///
/// Color images are converted to luminance first.
///
/// # Errors
///
/// Returns [`RegionError::EmptyInput`] if `bytes` is empty.
/// Returns [`RegionError::ImageDecode`] if the format is unrecognized or
/// the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<LabelGrid, RegionError> {
    if bytes.is_empty() {
        return Err(RegionError::EmptyInput);
    }
    let image = image::load_from_memory(bytes)?;
    from_gray_image(&image.to_luma8())
}

/// Min-max stretch the labels onto `1..=255` for viewing.
///
/// Zero is left free so a stretched grid never blends into a black
/// background. A grid holding a single value maps entirely to `1`.
///
/// # Errors
///
/// Returns [`RegionError::InvalidDimensions`] if the grid is too large
/// for an image.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn stretch_to_display(grid: &LabelGrid) -> Result<GrayImage, RegionError> {
    let (width, height) = image_dimensions(grid)?;
    let raw = grid.as_raw();
    let min = raw.iter().copied().min().unwrap_or(0);
    let max = raw.iter().copied().max().unwrap_or(0);
    let scale = if max > min {
        254.0 / f64::from(max - min)
    } else {
        0.0
    };
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let v = grid.get(x as usize, y as usize);
        let stretched = f64::from(v - min).mul_add(scale, 1.0).round();
        Luma([stretched.clamp(1.0, 255.0) as u8])
    }))
}

/// Paint samples onto a black image at `255 * value / max_value`.
///
/// # Errors
///
/// - [`RegionError::InvalidConfig`] if `max_value == 0` or a sample lies
///   outside the image.
/// - [`RegionError::InvalidDimensions`] for a zero-sized or oversized
///   image.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_samples(
    width: usize,
    height: usize,
    samples: &[Sample],
    max_value: Label,
) -> Result<GrayImage, RegionError> {
    if max_value == 0 {
        return Err(RegionError::InvalidConfig(
            "sample rendering needs a positive maximum value".to_string(),
        ));
    }
    let invalid = || RegionError::InvalidDimensions { width, height };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    let mut image = GrayImage::new(
        u32::try_from(width).map_err(|_| invalid())?,
        u32::try_from(height).map_err(|_| invalid())?,
    );
    for s in samples {
        if s.col >= width || s.row >= height {
            return Err(RegionError::InvalidConfig(format!(
                "sample at row {}, col {} lies outside the {width}x{height} image",
                s.row, s.col
            )));
        }
        let shade = (255.0 * f64::from(s.value) / f64::from(max_value)).clamp(0.0, 255.0);
        image.put_pixel(s.col as u32, s.row as u32, Luma([shade as u8]));
    }
    Ok(image)
}

fn image_dimensions(grid: &LabelGrid) -> Result<(u32, u32), RegionError> {
    let invalid = || RegionError::InvalidDimensions {
        width: grid.width(),
        height: grid.height(),
    };
    Ok((
        u32::try_from(grid.width()).map_err(|_| invalid())?,
        u32::try_from(grid.height()).map_err(|_| invalid())?,
    ))
}
