//! SphereFrame Frame Model
//!
//! Defines the core data contracts shared by every processing module:
//! - **Formats:** Chroma layout, color space, bit depth, and the derived plane geometry
//! - **Buffers:** Multi-plane pixel storage sized from a [`FrameDesc`]
//! - **Packing:** Face-packing descriptors for cubemap-style 360° layouts
//!
//! Samples are stored as `i32` so 8-bit, 16-bit, and signed differential
//! content share one representation. The legal range is carried by the
//! buffer's description and enforced by the writers.

pub mod buffer;
pub mod error;
pub mod format;
pub mod packing;

pub use buffer::*;
pub use error::*;
pub use format::*;
pub use packing::*;
