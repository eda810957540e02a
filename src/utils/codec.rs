//! Decode arbitrary image bytes and re-encode them as an RGBA PNG.
//!
//! Raster containers go through the `image` crate with the format sniffed from
//! the content. SVG documents are rasterised with `resvg` at their intrinsic size.

use flate2::read::GzDecoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use resvg::{tiny_skia, usvg};
use std::io::{Cursor, Read};
use thiserror::Error;

/// Same ceiling on decoded pixels that libvips applies by default.
pub const MAX_PIXELS: u64 = 0x3FFF * 0x3FFF;

/// Ceiling on SVG source text, after gzip inflation for `.svgz`.
pub const MAX_SVG_SIZE: usize = 10 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input buffer contains unsupported image format")]
    UnknownFormat,
    #[error("{0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to parse SVG: {0}")]
    Svg(#[source] usvg::Error),
    #[error("Failed to decompress SVG: {0}")]
    SvgDecompress(#[source] std::io::Error),
    #[error("SVG source exceeds {limit} bytes")]
    SvgTooLarge { limit: usize },
    #[error("SVG is not valid UTF-8: {0}")]
    SvgEncoding(#[source] std::str::Utf8Error),
    #[error("SVG has no renderable area")]
    EmptySvg,
    #[error("Input image exceeds pixel limit ({width}x{height})")]
    TooLarge { width: u32, height: u32 },
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Converted {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn to_rgba_png(bytes: &[u8]) -> Result<Converted> {
    let decoded = decode(bytes)?;
    let normalized = ensure_alpha(decoded);

    let mut png = Vec::new();
    normalized
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(Error::Encode)?;

    Ok(Converted {
        png,
        width: normalized.width(),
        height: normalized.height(),
    })
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if looks_like_svg(bytes) {
        return rasterize_svg(bytes);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| Error::Decode(image::ImageError::IoError(err)))?;

    if reader.format().is_none() {
        return Err(Error::UnknownFormat);
    }

    let (width, height) = reader.into_dimensions().map_err(Error::Decode)?;
    check_pixel_limit(width, height)?;

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| Error::Decode(image::ImageError::IoError(err)))?
        .decode()
        .map_err(Error::Decode)
}

/// Gives every image four channels. Alpha already present is kept, otherwise it
/// is synthesized fully opaque. Sample depth above 8 bits is kept at 16.
pub fn ensure_alpha(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgba8 => img,
        ColorType::Rgba16 => img,
        ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgb32F
        | ColorType::Rgba32F => DynamicImage::ImageRgba16(img.to_rgba16()),
        _ => DynamicImage::ImageRgba8(img.to_rgba8()),
    }
}

fn check_pixel_limit(width: u32, height: u32) -> Result<()> {
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(Error::TooLarge { width, height });
    }
    Ok(())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    if bytes.starts_with(&GZIP_MAGIC) {
        return true;
    }

    let bytes = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let bytes = &bytes[start..];

    // comments and DOCTYPE may push the root element arbitrarily far
    bytes.starts_with(b"<") && bytes.windows(4).any(|w| w == b"<svg")
}

/// Inflates `.svgz` input without letting it grow past [`MAX_SVG_SIZE`].
fn svg_source(bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        if bytes.len() > MAX_SVG_SIZE {
            return Err(Error::SvgTooLarge {
                limit: MAX_SVG_SIZE,
            });
        }
        return Ok(bytes.to_vec());
    }

    let mut output = Vec::new();
    GzDecoder::new(bytes)
        .take(MAX_SVG_SIZE as u64 + 1)
        .read_to_end(&mut output)
        .map_err(Error::SvgDecompress)?;

    if output.len() > MAX_SVG_SIZE {
        return Err(Error::SvgTooLarge {
            limit: MAX_SVG_SIZE,
        });
    }

    Ok(output)
}

fn rasterize_svg(bytes: &[u8]) -> Result<DynamicImage> {
    let source = svg_source(bytes)?;
    let text = std::str::from_utf8(&source).map_err(Error::SvgEncoding)?;
    let tree = usvg::Tree::from_str(text, &usvg::Options::default()).map_err(Error::Svg)?;

    let size = tree.size().to_int_size();
    check_pixel_limit(size.width(), size.height())?;

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or(Error::EmptySvg)?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    image::RgbaImage::from_raw(size.width(), size.height(), rgba)
        .map(DynamicImage::ImageRgba8)
        .ok_or(Error::EmptySvg)
}
