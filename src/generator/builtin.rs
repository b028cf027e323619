//! Built-in generators backed by the `image` crate.

use crate::generator::Generator;
use anyhow::Context;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Output encodings supported by the built-in generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => ".png",
            ImageFormat::Jpeg => ".jpg",
        }
    }

    fn encoding(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Generator kinds selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Passthrough,
    Resize,
    Thumbnail,
}

/// Copies the source bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Generator for Passthrough {
    fn generate(&self, source: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(source.to_vec())
    }
}

/// Resizes to fit within `width` x `height`, preserving aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl Generator for Resize {
    fn generate(&self, source: &[u8]) -> anyhow::Result<Vec<u8>> {
        let img = image::load_from_memory(source).context("Failed to load source image")?;
        let resized = img.resize(self.width, self.height, FilterType::Lanczos3);
        encode(&resized, self.format)
    }

    fn extension(&self) -> Option<&str> {
        Some(self.format.extension())
    }
}

/// Fast downscale to at most `width` x `height`, preserving aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl Generator for Thumbnail {
    fn generate(&self, source: &[u8]) -> anyhow::Result<Vec<u8>> {
        let img = image::load_from_memory(source).context("Failed to load source image")?;
        let thumbnail = img.thumbnail(self.width, self.height);
        encode(&thumbnail, self.format)
    }

    fn extension(&self) -> Option<&str> {
        Some(self.format.extension())
    }
}

fn encode(img: &image::DynamicImage, format: ImageFormat) -> anyhow::Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let img = match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageFormat::Png => img.clone(),
    };
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format.encoding())
        .context("Failed to encode image")?;
    Ok(buffer)
}
