// THEORY:
// The `Raster` module is the engine's only gateway for pixel data. Every scoring
// function downstream assumes it is working on a well-formed grid, so all of the
// validation lives here: non-zero dimensions, a supported channel layout (1 or 3),
// and a sample buffer whose length actually matches `width * height * channels`.
// Once a `Raster` exists, it is immutable and safe to share across any number of
// concurrent scoring calls.
//
// Key architectural principles:
// 1.  **Decode at the boundary**: encoded files (PNG/JPEG uploads) are turned into
//     pixel grids exactly once, via the `image` crate. Anything the decoder cannot
//     parse surfaces as `AnalysisError::Decode` and never reaches the scorers.
// 2.  **One grayscale**: the luma plane is derived here with the `Pixel` weights,
//     so the dark-region, contrast, edge, and histogram analyses all agree on what
//     "intensity" means.
// 3.  **Channels preserved**: the 3-channel data is kept (not collapsed) because
//     the validity gate measures how far apart the channels are.

use crate::core_modules::error::AnalysisError;
use crate::core_modules::pixel::pixel::Pixel;
use image::DynamicImage;

/// An immutable, validated grid of 8-bit intensity samples.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Raster {
    /// Wraps an already-decoded sample buffer, validating its shape.
    pub fn from_buffer(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, AnalysisError> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::Decode(format!(
                "degenerate {width}x{height} image"
            )));
        }
        if channels != 1 && channels != 3 {
            return Err(AnalysisError::Decode(format!(
                "unsupported channel layout: {channels} channels"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(AnalysisError::Decode(format!(
                "buffer length {} does not match {width}x{height}x{channels}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Decodes an encoded image file (PNG, JPEG, ...) into a raster.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnalysisError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(match decoded {
            DynamicImage::ImageLuma8(gray) => {
                let (width, height) = gray.dimensions();
                Self::from_buffer(width, height, 1, gray.into_raw())?
            }
            other => {
                let rgb = other.to_rgb8();
                let (width, height) = rgb.dimensions();
                Self::from_buffer(width, height, 3, rgb.into_raw())?
            }
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The grayscale intensity plane, row-major. For 1-channel rasters this is
    /// the sample buffer itself; for 3-channel rasters it is the rounded luma.
    pub fn luminance_plane(&self) -> Vec<u8> {
        match self.channels {
            1 => self.data.clone(),
            _ => self
                .data
                .chunks_exact(3)
                .map(|sample| Pixel::from(sample).luminance_u8())
                .collect(),
        }
    }

    /// Iterates the raster as RGB pixels. Gray samples are replicated across
    /// the three channels so single-channel rasters have zero channel spread.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        let channels = self.channels as usize;
        self.data
            .chunks_exact(channels)
            .map(move |sample| match channels {
                1 => Pixel::gray(sample[0]),
                _ => Pixel::from(sample),
            })
    }
}
