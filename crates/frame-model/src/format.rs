//! Pixel formats and frame descriptions.
//!
//! A [`FrameDesc`] fully determines the plane geometry of a frame:
//! the same `(width, height, format)` always yields the same plane sizes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// Channel layout of a planar frame, including chroma subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromaFormat {
    /// Luma only.
    Yuv400,
    /// Chroma halved horizontally and vertically.
    Yuv420,
    /// Chroma halved horizontally.
    Yuv422,
    /// Full-resolution chroma.
    Yuv444,
    /// Planar red, green, blue.
    Rgb,
    /// Planar red, green, blue, alpha.
    Rgba,
}

impl ChromaFormat {
    /// Number of planes stored for this format.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Yuv400 => 1,
            Self::Yuv420 | Self::Yuv422 | Self::Yuv444 | Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Log2 subsampling `(x, y)` applied to the given plane.
    pub fn subsampling(self, plane: usize) -> (u32, u32) {
        if plane == 0 {
            return (0, 0);
        }
        match self {
            Self::Yuv420 => (1, 1),
            Self::Yuv422 => (1, 0),
            _ => (0, 0),
        }
    }

    /// Whether the format carries luma/chroma (as opposed to RGB) planes.
    pub fn is_yuv(self) -> bool {
        matches!(
            self,
            Self::Yuv400 | Self::Yuv420 | Self::Yuv422 | Self::Yuv444
        )
    }

    /// Dimensions of `plane` for a frame of `width x height`.
    ///
    /// Subsampled dimensions round up so odd-sized frames keep their last
    /// column/row of chroma.
    pub fn plane_dims(self, plane: usize, width: u32, height: u32) -> (u32, u32) {
        let (sx, sy) = self.subsampling(plane);
        (
            (width + (1 << sx) - 1) >> sx,
            (height + (1 << sy) - 1) >> sy,
        )
    }
}

impl fmt::Display for ChromaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yuv400 => "400",
            Self::Yuv420 => "420",
            Self::Yuv422 => "422",
            Self::Yuv444 => "444",
            Self::Rgb => "rgb",
            Self::Rgba => "rgba",
        };
        f.write_str(name)
    }
}

impl FromStr for ChromaFormat {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "400" | "yuv400" | "gray" => Ok(Self::Yuv400),
            "420" | "yuv420" | "yuv420p" => Ok(Self::Yuv420),
            "422" | "yuv422" | "yuv422p" => Ok(Self::Yuv422),
            "444" | "yuv444" | "yuv444p" => Ok(Self::Yuv444),
            "rgb" | "gbrp" => Ok(Self::Rgb),
            "rgba" => Ok(Self::Rgba),
            _ => Err(FrameError::UnknownFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Color space tag. Informational only; no conversion is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    #[default]
    Unspecified,
    Bt601,
    Bt709,
    Bt2020,
    Srgb,
}

/// Inclusive legal sample range for a bit depth and signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub min: i32,
    pub max: i32,
}

impl SampleRange {
    /// Range for `bit_depth` bits, signed or unsigned.
    pub fn for_depth(bit_depth: u8, signed: bool) -> Self {
        let bits = u32::from(bit_depth.clamp(1, 16));
        if signed {
            let half = 1i32 << (bits - 1);
            Self {
                min: -half,
                max: half - 1,
            }
        } else {
            Self {
                min: 0,
                max: (1i32 << bits) - 1,
            }
        }
    }

    /// Round a floating-point sample and clamp it into range.
    pub fn clamp_f64(&self, value: f64) -> i32 {
        if value.is_nan() {
            return self.min.max(0);
        }
        let rounded = value.round();
        if rounded <= f64::from(self.min) {
            self.min
        } else if rounded >= f64::from(self.max) {
            self.max
        } else {
            rounded as i32
        }
    }

    /// Clamp an integer sample into range.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Which fields of two descriptions must agree for a module's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compat {
    pub format: bool,
    pub color_space: bool,
    pub resolution: bool,
    pub bit_depth: bool,
}

impl Compat {
    /// Everything must match.
    pub const ALL: Compat = Compat {
        format: true,
        color_space: true,
        resolution: true,
        bit_depth: true,
    };

    /// Sample layout must match; resolution may differ.
    pub const LAYOUT: Compat = Compat {
        format: true,
        color_space: true,
        resolution: false,
        bit_depth: true,
    };
}

/// Value-type description of a frame: geometry, layout, and sample range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDesc {
    pub width: u32,
    pub height: u32,
    pub format: ChromaFormat,
    #[serde(default)]
    pub color_space: ColorSpace,
    pub bit_depth: u8,
    #[serde(default)]
    pub signed: bool,
}

impl FrameDesc {
    /// An unsigned 8-bit description with unspecified color space.
    pub fn new(width: u32, height: u32, format: ChromaFormat) -> Self {
        Self {
            width,
            height,
            format,
            color_space: ColorSpace::Unspecified,
            bit_depth: 8,
            signed: false,
        }
    }

    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    /// Same layout, different resolution.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reject zero-sized frames and bit depths outside 1..=16.
    pub fn validate(&self) -> FrameResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(1..=16).contains(&self.bit_depth) {
            return Err(FrameError::UnsupportedBitDepth {
                bit_depth: self.bit_depth,
            });
        }
        Ok(())
    }

    pub fn plane_count(&self) -> usize {
        self.format.plane_count()
    }

    pub fn plane_dims(&self, plane: usize) -> (u32, u32) {
        self.format.plane_dims(plane, self.width, self.height)
    }

    /// Total number of samples across all planes.
    pub fn capacity(&self) -> usize {
        (0..self.plane_count())
            .map(|p| {
                let (w, h) = self.plane_dims(p);
                w as usize * h as usize
            })
            .sum()
    }

    pub fn sample_range(&self) -> SampleRange {
        SampleRange::for_depth(self.bit_depth, self.signed)
    }

    /// Value representing "no signal" in `plane`: mid-range for unsigned
    /// chroma, zero everywhere else.
    pub fn neutral_value(&self, plane: usize) -> i32 {
        if plane > 0 && plane < 3 && self.format.is_yuv() && !self.signed {
            1 << (u32::from(self.bit_depth.clamp(1, 16)) - 1)
        } else {
            0
        }
    }

    /// Describe the first field that differs under `compat`, if any.
    pub fn mismatch(&self, other: &FrameDesc, compat: Compat) -> Option<String> {
        if compat.format && self.format != other.format {
            return Some(format!("pixel format {} vs {}", self.format, other.format));
        }
        if compat.color_space && self.color_space != other.color_space {
            return Some(format!(
                "color space {:?} vs {:?}",
                self.color_space, other.color_space
            ));
        }
        if compat.resolution && (self.width != other.width || self.height != other.height) {
            return Some(format!(
                "resolution {}x{} vs {}x{}",
                self.width, self.height, other.width, other.height
            ));
        }
        if compat.bit_depth && (self.bit_depth != other.bit_depth || self.signed != other.signed)
        {
            return Some(format!(
                "bit depth {}{} vs {}{}",
                self.bit_depth,
                if self.signed { "s" } else { "" },
                other.bit_depth,
                if other.signed { "s" } else { "" }
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_geometry_per_format() {
        let d = FrameDesc::new(7, 5, ChromaFormat::Yuv420);
        assert_eq!(d.plane_count(), 3);
        assert_eq!(d.plane_dims(0), (7, 5));
        assert_eq!(d.plane_dims(1), (4, 3));
        assert_eq!(d.capacity(), 35 + 12 + 12);

        let d = FrameDesc::new(8, 4, ChromaFormat::Yuv422);
        assert_eq!(d.plane_dims(2), (4, 4));

        let d = FrameDesc::new(8, 4, ChromaFormat::Yuv400);
        assert_eq!(d.plane_count(), 1);
        assert_eq!(d.capacity(), 32);

        let d = FrameDesc::new(8, 4, ChromaFormat::Rgba);
        assert_eq!(d.plane_count(), 4);
        assert_eq!(d.plane_dims(3), (8, 4));
    }

    #[test]
    fn sample_ranges() {
        assert_eq!(SampleRange::for_depth(8, false), SampleRange { min: 0, max: 255 });
        assert_eq!(
            SampleRange::for_depth(10, true),
            SampleRange {
                min: -512,
                max: 511
            }
        );
        let r = SampleRange::for_depth(8, false);
        assert_eq!(r.clamp_f64(-3.2), 0);
        assert_eq!(r.clamp_f64(254.6), 255);
        assert_eq!(r.clamp_f64(300.0), 255);
        assert_eq!(r.clamp_f64(12.4), 12);
    }

    #[test]
    fn neutral_values() {
        let d = FrameDesc::new(4, 4, ChromaFormat::Yuv420).with_bit_depth(10);
        assert_eq!(d.neutral_value(0), 0);
        assert_eq!(d.neutral_value(1), 512);
        let d = FrameDesc::new(4, 4, ChromaFormat::Rgb);
        assert_eq!(d.neutral_value(1), 0);
        let d = FrameDesc::new(4, 4, ChromaFormat::Yuv444).with_signed(true);
        assert_eq!(d.neutral_value(2), 0);
    }

    #[test]
    fn validation_rejects_degenerate_descriptions() {
        assert!(FrameDesc::new(0, 4, ChromaFormat::Yuv420).validate().is_err());
        assert!(FrameDesc::new(4, 4, ChromaFormat::Yuv420)
            .with_bit_depth(17)
            .validate()
            .is_err());
        assert!(FrameDesc::new(4, 4, ChromaFormat::Yuv420)
            .with_bit_depth(16)
            .validate()
            .is_ok());
    }

    #[test]
    fn mismatch_respects_compat_mask() {
        let a = FrameDesc::new(64, 32, ChromaFormat::Yuv420);
        let b = a.with_size(32, 32);
        assert!(a.mismatch(&b, Compat::ALL).is_some());
        assert!(a.mismatch(&b, Compat::LAYOUT).is_none());

        let c = a.with_bit_depth(10);
        assert!(a
            .mismatch(&c, Compat::LAYOUT)
            .unwrap()
            .contains("bit depth"));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("420".parse::<ChromaFormat>().unwrap(), ChromaFormat::Yuv420);
        assert_eq!("GRAY".parse::<ChromaFormat>().unwrap(), ChromaFormat::Yuv400);
        assert!("nv12".parse::<ChromaFormat>().is_err());
        for f in [
            ChromaFormat::Yuv400,
            ChromaFormat::Yuv420,
            ChromaFormat::Yuv422,
            ChromaFormat::Yuv444,
            ChromaFormat::Rgb,
            ChromaFormat::Rgba,
        ] {
            assert_eq!(f.to_string().parse::<ChromaFormat>().unwrap(), f);
        }
    }
}
