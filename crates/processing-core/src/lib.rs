//! SphereFrame Processing Core — the resampling engines
//!
//! Pure pixel computation shared by the processing modules:
//! - **Kernels:** Circular Lanczos-3 and cubic 1D interpolation
//! - **Face remap:** Move faces between packing layouts with area-accurate resizing
//! - **ERP/square:** Fold an equirectangular frame into a square and back
//!
//! This crate is pure computation — no I/O, no module state.
//! All inputs are buffers; all outputs are written into caller-owned buffers.

pub mod erp_square;
pub mod face_remap;
pub mod kernels;

pub use face_remap::FaceRemapPlan;
pub use kernels::Kernel;
pub use erp_square::{erp_to_square, reconstruction_error, square_to_erp, ReconstructionError};
