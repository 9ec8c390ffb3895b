use std::path::Path;

use ::image::{DynamicImage, ExtendedColorType, ImageFormat};

use super::{Bitmap, Format};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[source] ::image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] ::image::ImageError),
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("{0} channels cannot be encoded")]
    Channels(usize),
}

impl CodecError {
    /// Whether the failure is a missing/unreadable file rather than bad data.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CodecError::Open { .. })
    }
}

/// File formats images can be saved as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FileFormat {
    Png,
    Bmp,
    Tga,
}

impl FileFormat {
    /// Guesses the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(FileFormat::Png),
            "bmp" => Some(FileFormat::Bmp),
            "tga" => Some(FileFormat::Tga),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            FileFormat::Png => ImageFormat::Png,
            FileFormat::Bmp => ImageFormat::Bmp,
            FileFormat::Tga => ImageFormat::Tga,
        }
    }
}

/// Decodes an in-memory file, keeping its channel count.
pub fn decode(bytes: &[u8]) -> Result<Bitmap, CodecError> {
    let img = ::image::load_from_memory(bytes).map_err(CodecError::Decode)?;
    Ok(bitmap_from_dynamic(img))
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Bitmap, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CodecError::Open {
        path: path.display().to_string(),
        source,
    })?;
    decode(&bytes)
}

fn bitmap_from_dynamic(img: DynamicImage) -> Bitmap {
    let (w, h) = (img.width(), img.height());
    match img.color().channel_count() {
        1 => Bitmap::new(w, h, Format::Luminance, img.into_luma8().into_raw()),
        2 => Bitmap::new(w, h, Format::LuminanceAlpha, img.into_luma_alpha8().into_raw()),
        3 => Bitmap::new(w, h, Format::Rgb, img.into_rgb8().into_raw()),
        _ => Bitmap::new(w, h, Format::Rgba, img.into_rgba8().into_raw()),
    }
}

/// Encodes tightly packed pixels with `channels` channels.
pub fn encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    format: FileFormat,
) -> Result<Vec<u8>, CodecError> {
    let color = color_type(channels)?;
    let mut out = std::io::Cursor::new(Vec::new());
    ::image::write_buffer_with_format(&mut out, pixels, width, height, color, format.image_format())
        .map_err(CodecError::Encode)?;
    Ok(out.into_inner())
}

pub fn save_file(
    path: impl AsRef<Path>,
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    format: Option<FileFormat>,
) -> Result<(), CodecError> {
    let path = path.as_ref();
    let format = match format.or_else(|| FileFormat::from_path(path)) {
        Some(f) => f,
        None => return Err(CodecError::UnsupportedFormat(path.display().to_string())),
    };
    let color = color_type(channels)?;
    ::image::save_buffer_with_format(path, pixels, width, height, color, format.image_format())
        .map_err(CodecError::Encode)
}

fn color_type(channels: usize) -> Result<ExtendedColorType, CodecError> {
    match channels {
        1 => Ok(ExtendedColorType::L8),
        2 => Ok(ExtendedColorType::La8),
        3 => Ok(ExtendedColorType::Rgb8),
        4 => Ok(ExtendedColorType::Rgba8),
        n => Err(CodecError::Channels(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_keeps_channels() {
        let pixels = vec![255, 0, 0, 255, 0, 0, 255, 128];
        let bytes = encode(&pixels, 2, 1, 4, FileFormat::Png).unwrap();
        let b = decode(&bytes).unwrap();
        assert_eq!((b.width, b.height, b.format), (2, 1, Format::Rgba));
        assert_eq!(b.pixels, pixels);
    }

    #[test]
    fn rgb_png_decodes_as_rgb() {
        let bytes = encode(&[1, 2, 3], 1, 1, 3, FileFormat::Png).unwrap();
        assert_eq!(decode(&bytes).unwrap().format, Format::Rgb);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_file("/nonexistent/dir/nothing.png").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.PNG")), Some(FileFormat::Png));
        assert_eq!(FileFormat::from_path(Path::new("x.tga")), Some(FileFormat::Tga));
        assert_eq!(FileFormat::from_path(Path::new("x.jpg")), None);
    }
}
