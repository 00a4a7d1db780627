//! # Pixel Grid
//!
//! A rectangular, row-major grid of 8-bit grayscale samples. This is what an
//! image preprocessing step hands to the encoder.
//!
//! Dimensions travel in the meta frame as little-endian u16, so each side
//! must be in `1..=65535`.

use serde::Serialize;

use crate::error::PixelwireError;

/// Immutable row-major grid of 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u16,
    height: u16,
    samples: Vec<u8>,
}

/// Summary of a grid's samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStats {
    pub width: u16,
    pub height: u16,
    pub pixel_count: usize,
    pub min_value: u8,
    pub max_value: u8,
    pub avg_value: f64,
}

impl PixelGrid {
    /// Build a grid from 8-bit samples.
    ///
    /// ## Errors
    ///
    /// `InvalidGrid` if either dimension is zero or larger than 65535, or
    /// if `samples.len() != width * height`.
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Result<Self, PixelwireError> {
        let width = dimension("width", width as i64)?;
        let height = dimension("height", height as i64)?;

        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(PixelwireError::InvalidGrid(format!(
                "sample count mismatch: expected {} ({}x{}), got {}",
                expected,
                width,
                height,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a grid from wider integer samples, keeping the low 8 bits of
    /// each value. Dimensions arrive signed from loosely typed callers
    /// (JSON), so non-positive values are rejected here.
    ///
    /// ```
    /// use pixelwire::protocol::PixelGrid;
    ///
    /// let grid = PixelGrid::from_wide(2, 1, [0x1FF, 300])?;
    /// assert_eq!(grid.samples(), &[0xFF, 44]);
    /// # Ok::<(), pixelwire::PixelwireError>(())
    /// ```
    pub fn from_wide<I>(width: i64, height: i64, samples: I) -> Result<Self, PixelwireError>
    where
        I: IntoIterator<Item = i64>,
    {
        let w = dimension("width", width)?;
        let h = dimension("height", height)?;
        let samples = samples.into_iter().map(|v| v as u8).collect();
        Self::new(w as usize, h as usize, samples)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn pixel_count(&self) -> usize {
        self.samples.len()
    }

    /// Min, max and mean of the samples.
    pub fn stats(&self) -> GridStats {
        // new() guarantees at least one sample
        let min_value = self.samples.iter().copied().min().unwrap_or(0);
        let max_value = self.samples.iter().copied().max().unwrap_or(0);
        let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();

        GridStats {
            width: self.width,
            height: self.height,
            pixel_count: self.samples.len(),
            min_value,
            max_value,
            avg_value: sum as f64 / self.samples.len() as f64,
        }
    }
}

fn dimension(name: &str, value: i64) -> Result<u16, PixelwireError> {
    if value <= 0 {
        return Err(PixelwireError::InvalidGrid(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    u16::try_from(value).map_err(|_| {
        PixelwireError::InvalidGrid(format!(
            "{} {} does not fit the 16-bit dimension field",
            name, value
        ))
    })
}
