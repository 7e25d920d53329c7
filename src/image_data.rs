//! Image decoding adapter.
//!
//! Decoding is delegated to the `image` crate; this module only owns the resulting
//! 8-bit interleaved pixel buffer and its dimensions, ready to hand to a texture upload.

use std::fmt;
use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Channel layout requested from the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFormat {
  /// Keep whatever the file stores.
  #[default]
  Native,
  Grey,
  GreyAlpha,
  Rgb,
  Rgba,
}

impl ChannelFormat {
  /// Channel count this format forces, or `None` for [`ChannelFormat::Native`].
  pub fn channels(self) -> Option<u8> {
    match self {
      ChannelFormat::Native => None,
      ChannelFormat::Grey => Some(1),
      ChannelFormat::GreyAlpha => Some(2),
      ChannelFormat::Rgb => Some(3),
      ChannelFormat::Rgba => Some(4),
    }
  }
}

struct Pixels {
  bytes:           Vec<u8>,
  width:           u32,
  height:          u32,
  channels:        u8,
  source_channels: u8,
}

/// Owns at most one decoded image at a time.
#[derive(Default)]
pub struct DecodedImage {
  pixels: Option<Pixels>,
}

impl DecodedImage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn open(path: impl AsRef<Path>, format: ChannelFormat) -> Result<Self> {
    let mut image = Self::new();
    image.load(path, format)?;
    Ok(image)
  }

  /// Decodes `path`, replacing whatever was loaded before.
  ///
  /// The previous buffer is released before decoding starts, so a failed load leaves the
  /// image empty.
  pub fn load(&mut self, path: impl AsRef<Path>, format: ChannelFormat) -> Result<()> {
    let path = path.as_ref();
    self.release();

    let decoded = image::open(path).map_err(|source| Error::ImageDecode {
      path: path.to_path_buf(),
      source,
    })?;
    let source_channels = decoded.color().channel_count();
    let channels = format.channels().unwrap_or(source_channels);
    let (width, height) = (decoded.width(), decoded.height());
    let bytes = into_interleaved_bytes(decoded, channels);

    log::debug!(
      "Decoded {:?}: {}x{}, {} channels ({} in file)",
      path,
      width,
      height,
      channels,
      source_channels,
    );
    self.pixels = Some(Pixels { bytes, width, height, channels, source_channels });
    Ok(())
  }

  /// Drops the decode buffer, if any.
  pub fn release(&mut self) {
    if let Some(pixels) = self.pixels.take() {
      log::trace!("Released {} byte image buffer", pixels.bytes.len());
    }
  }

  pub fn is_loaded(&self) -> bool {
    self.pixels.is_some()
  }

  pub fn width(&self) -> Option<u32> {
    self.pixels.as_ref().map(|p| p.width)
  }

  pub fn height(&self) -> Option<u32> {
    self.pixels.as_ref().map(|p| p.height)
  }

  /// Channels per pixel in [`DecodedImage::bytes`].
  pub fn channels(&self) -> Option<u8> {
    self.pixels.as_ref().map(|p| p.channels)
  }

  /// Channels per pixel the file itself stored.
  pub fn source_channels(&self) -> Option<u8> {
    self.pixels.as_ref().map(|p| p.source_channels)
  }

  pub fn bytes(&self) -> Option<&[u8]> {
    self.pixels.as_ref().map(|p| p.bytes.as_slice())
  }

  /// Copy of the `width * height * channels` pixel bytes.
  ///
  /// # Panics
  /// If no image is loaded.
  pub fn bytes_copy(&self) -> Vec<u8> {
    let pixels = self.pixels.as_ref().expect("No image loaded!");
    let len = pixels.width as usize * pixels.height as usize * pixels.channels as usize;
    pixels.bytes[..len].to_vec()
  }
}

fn into_interleaved_bytes(image: DynamicImage, channels: u8) -> Vec<u8> {
  match channels {
    1 => image.into_luma8().into_raw(),
    2 => image.into_luma_alpha8().into_raw(),
    3 => image.into_rgb8().into_raw(),
    _ => image.into_rgba8().into_raw(),
  }
}

impl fmt::Debug for DecodedImage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.pixels {
      Some(p) => f
        .debug_struct("DecodedImage")
        .field("width", &p.width)
        .field("height", &p.height)
        .field("channels", &p.channels)
        .finish(),
      None => f.write_str("DecodedImage(empty)"),
    }
  }
}

#[cfg(test)]
mod tests {
  use image::{Rgb, RgbImage};

  use super::*;

  fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("gradient.png");
    let image = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8 * 60, y as u8 * 80, 255]));
    image.save(&path).unwrap();
    path
  }

  #[test]
  fn native_format_keeps_file_channels() {
    let dir = tempfile::tempdir().unwrap();
    let image = DecodedImage::open(write_fixture(dir.path()), ChannelFormat::Native).unwrap();

    assert_eq!(image.width(), Some(4));
    assert_eq!(image.height(), Some(3));
    assert_eq!(image.channels(), Some(3));
    assert_eq!(image.bytes_copy().len(), 4 * 3 * 3);
    assert_eq!(&image.bytes_copy()[..3], &[0, 0, 255]);
  }

  #[test]
  fn requested_format_sets_buffer_channels() {
    let dir = tempfile::tempdir().unwrap();
    let image = DecodedImage::open(write_fixture(dir.path()), ChannelFormat::Rgba).unwrap();

    assert_eq!(image.channels(), Some(4));
    assert_eq!(image.source_channels(), Some(3));
    assert_eq!(image.bytes().unwrap().len(), 4 * 3 * 4);
    assert_eq!(image.bytes_copy()[3], 255);
  }

  #[test]
  fn failed_load_leaves_image_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut image = DecodedImage::open(write_fixture(dir.path()), ChannelFormat::Rgb).unwrap();

    let err = image.load(dir.path().join("missing.png"), ChannelFormat::Rgb).unwrap_err();
    assert!(matches!(err, Error::ImageDecode { .. }));
    assert!(!image.is_loaded());
    assert_eq!(image.width(), None);
  }

  #[test]
  #[should_panic(expected = "No image loaded")]
  fn bytes_copy_requires_a_loaded_image() {
    DecodedImage::new().bytes_copy();
  }
}
