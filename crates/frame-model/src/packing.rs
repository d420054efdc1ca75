//! Face-packing descriptors.
//!
//! A packing describes how the logical faces of a projection (e.g. the six
//! faces of a cubemap) are arranged on a `rows x cols` grid inside one frame.
//!
//! # Text format
//!
//! Whitespace-separated integers:
//!
//! ```text
//! numFaces rows cols
//! gridX gridY faceId rotation ratioPercent    (numFaces times)
//! ```
//!
//! Parsing is strictly positional; any missing, extra, or out-of-range
//! token rejects the whole descriptor.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// Clockwise face rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Rotation that takes a face stored at `self` to one stored at `target`.
    pub fn delta_to(self, target: Rotation) -> Rotation {
        let d = (target.degrees() + 360 - self.degrees()) % 360;
        // d is always a multiple of 90 below 360
        Self::from_degrees(d).unwrap_or_default()
    }

    /// Whether width and height trade places under this rotation.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::R90 | Self::R270)
    }
}

/// One face's placement on the packing grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceSlot {
    pub grid_x: u32,
    pub grid_y: u32,
    pub face_id: u32,
    pub rotation: Rotation,
    /// Face size as a percentage of the grid cell, in `1..=100`.
    pub ratio_percent: u32,
}

impl FaceSlot {
    /// A full-size, unrotated face.
    pub fn new(grid_x: u32, grid_y: u32, face_id: u32) -> Self {
        Self {
            grid_x,
            grid_y,
            face_id,
            rotation: Rotation::R0,
            ratio_percent: 100,
        }
    }

    /// Scale a cell extent by this face's ratio, never below one sample.
    pub fn scaled(&self, cell_extent: u32) -> u32 {
        ((u64::from(cell_extent) * u64::from(self.ratio_percent)) / 100).max(1) as u32
    }
}

/// A validated face-packing descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FacePacking {
    rows: u32,
    cols: u32,
    faces: Vec<FaceSlot>,
}

impl FacePacking {
    /// Build and validate a packing.
    pub fn new(rows: u32, cols: u32, faces: Vec<FaceSlot>) -> FrameResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(FrameError::malformed_packing(format!(
                "grid must be at least 1x1, got {rows}x{cols}"
            )));
        }
        if faces.is_empty() {
            return Err(FrameError::malformed_packing("packing declares no faces"));
        }
        let cells = u64::from(rows) * u64::from(cols);
        if faces.len() as u64 > cells {
            return Err(FrameError::malformed_packing(format!(
                "{} faces do not fit a {rows}x{cols} grid",
                faces.len()
            )));
        }

        let mut ids = HashSet::new();
        let mut cells_used = HashSet::new();
        for face in &faces {
            if face.grid_x >= cols || face.grid_y >= rows {
                return Err(FrameError::malformed_packing(format!(
                    "face {} at ({}, {}) lies outside the {rows}x{cols} grid",
                    face.face_id, face.grid_x, face.grid_y
                )));
            }
            if !(1..=100).contains(&face.ratio_percent) {
                return Err(FrameError::malformed_packing(format!(
                    "face {} ratio {} outside 1..=100",
                    face.face_id, face.ratio_percent
                )));
            }
            if !ids.insert(face.face_id) {
                return Err(FrameError::malformed_packing(format!(
                    "face id {} declared twice",
                    face.face_id
                )));
            }
            if !cells_used.insert((face.grid_x, face.grid_y)) {
                return Err(FrameError::malformed_packing(format!(
                    "grid cell ({}, {}) holds two faces",
                    face.grid_x, face.grid_y
                )));
            }
        }

        Ok(Self { rows, cols, faces })
    }

    /// Parse the whitespace-separated text format.
    pub fn parse(text: &str) -> FrameResult<Self> {
        let mut tokens = Tokens::new(text);
        let num_faces = tokens.next_u32("numFaces")?;
        let rows = tokens.next_u32("rows")?;
        let cols = tokens.next_u32("cols")?;

        if u64::from(num_faces) > u64::from(rows) * u64::from(cols) {
            return Err(FrameError::malformed_packing(format!(
                "numFaces {num_faces} exceeds {rows}x{cols} grid"
            )));
        }

        let mut faces = Vec::with_capacity(num_faces as usize);
        for _ in 0..num_faces {
            let grid_x = tokens.next_u32("gridX")?;
            let grid_y = tokens.next_u32("gridY")?;
            let face_id = tokens.next_u32("faceId")?;
            let degrees = tokens.next_u32("rotation")?;
            let rotation = Rotation::from_degrees(degrees).ok_or_else(|| {
                FrameError::malformed_packing(format!(
                    "token {}: rotation {degrees} is not one of 0/90/180/270",
                    tokens.position
                ))
            })?;
            let ratio_percent = tokens.next_u32("ratioPercent")?;
            faces.push(FaceSlot {
                grid_x,
                grid_y,
                face_id,
                rotation,
                ratio_percent,
            });
        }
        tokens.finish()?;

        Self::new(rows, cols, faces)
    }

    /// A 1x1 packing holding a single full-size face.
    pub fn single(face_id: u32) -> Self {
        Self {
            rows: 1,
            cols: 1,
            faces: vec![FaceSlot::new(0, 0, face_id)],
        }
    }

    /// Six cube faces on a 3-column, 2-row grid with ids in raster order.
    pub fn cubemap_3x2() -> Self {
        let faces = (0..6).map(|id| FaceSlot::new(id % 3, id / 3, id)).collect();
        Self {
            rows: 2,
            cols: 3,
            faces,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn faces(&self) -> &[FaceSlot] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face(&self, face_id: u32) -> Option<&FaceSlot> {
        self.faces.iter().find(|f| f.face_id == face_id)
    }

    pub fn face_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.faces.iter().map(|f| f.face_id)
    }
}

impl fmt::Display for FacePacking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.faces.len(), self.rows, self.cols)?;
        for face in &self.faces {
            write!(
                f,
                " {} {} {} {} {}",
                face.grid_x,
                face.grid_y,
                face.face_id,
                face.rotation.degrees(),
                face.ratio_percent
            )?;
        }
        Ok(())
    }
}

impl FromStr for FacePacking {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FacePacking {
    type Error = FrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FacePacking> for String {
    fn from(value: FacePacking) -> Self {
        value.to_string()
    }
}

struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_whitespace(),
            position: 0,
        }
    }

    fn next_u32(&mut self, field: &str) -> FrameResult<u32> {
        self.position += 1;
        let token = self.iter.next().ok_or_else(|| {
            FrameError::malformed_packing(format!(
                "token {}: expected {field}, found end of input",
                self.position
            ))
        })?;
        token.parse::<u32>().map_err(|_| {
            FrameError::malformed_packing(format!(
                "token {}: expected {field}, found '{token}'",
                self.position
            ))
        })
    }

    fn finish(mut self) -> FrameResult<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(extra) => Err(FrameError::malformed_packing(format!(
                "token {}: unexpected trailing '{extra}'",
                self.position + 1
            ))),
        }
    }
}
