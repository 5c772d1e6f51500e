use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use pg_core::error::CoreError;
use pg_core::frame::FrameBuffer;

/// Decode an image, detecting the codec from its content rather than its name.
///
/// # Errors
/// [`CoreError::FileNotFound`], [`CoreError::UnsupportedFormat`] when the
/// content is not a known image, or the decoder's error.
///
/// # Example
/// ```no_run
/// use pg_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("files/original/cat.jpg")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    if !path.is_file() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    let reader = ImageReader::open(path)
        .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    if reader.format().is_none() {
        return Err(CoreError::UnsupportedFormat {
            format: path.display().to_string(),
        }
        .into());
    }
    let img = reader
        .decode()
        .with_context(|| format!("Impossible de décoder {}", path.display()))?;
    frame_from_dynamic(&img)
}

/// Convert any decoded image into an RGBA frame.
///
/// # Errors
/// [`CoreError::InvalidDimensions`] for zero-sized images.
pub fn frame_from_dynamic(img: &DynamicImage) -> Result<FrameBuffer> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameBuffer::from_rgba(width, height, rgba.into_raw())?)
}

/// Codec chosen from the output extension (`jpg`, `jpeg`, `png`).
///
/// # Errors
/// [`CoreError::UnsupportedFormat`] for anything else.
pub fn format_for(path: &Path) -> Result<ImageFormat, CoreError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        _ => Err(CoreError::UnsupportedFormat { format: ext }),
    }
}

/// Encode a frame by extension, creating parent directories.
///
/// The bytes go to a temporary file next to the target which is renamed on
/// success; on failure the temporary file is removed and no partial output
/// is left behind.
///
/// # Errors
/// Unsupported extension, I/O errors, or encoder errors.
pub fn save_image(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let format = format_for(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Impossible de créer {}", dir.display()))?;

    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or(
        CoreError::InvalidDimensions {
            width: frame.width,
            height: frame.height,
        },
    )?;
    let img = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
        _ => DynamicImage::ImageRgba8(rgba),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".pixglyph-")
        .suffix(".part")
        .tempfile_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut writer, format)
            .with_context(|| format!("Échec de l'encodage de {}", path.display()))?;
        writer.flush()?;
    }
    tmp.persist(path)
        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_roundtrip_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/dir/out.png");
        let mut fb = FrameBuffer::filled(3, 2, [10, 20, 30, 255]);
        fb.set_pixel(2, 1, [200, 100, 50, 128]);
        save_image(&fb, &path).unwrap();
        assert_eq!(load_image(&path).unwrap(), fb);
    }

    #[test]
    fn jpeg_is_detected_by_content_not_name() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("photo.jpg");
        save_image(&FrameBuffer::filled(8, 8, [90, 90, 90, 255]), &jpg).unwrap();
        let renamed = dir.path().join("photo.data");
        std::fs::rename(&jpg, &renamed).unwrap();
        let fb = load_image(&renamed).unwrap();
        assert_eq!((fb.width, fb.height), (8, 8));
    }

    #[test]
    fn garbage_content_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"definitely not an image, just some text").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn unknown_extension_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tiff");
        assert!(save_image(&FrameBuffer::new(2, 2), &path).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_image(Path::new("/nope/missing.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }
}
