//! SphereFrame Module Engine
//!
//! The contract every frame-processing unit implements, and the units
//! themselves:
//! - **Module:** [`FrameModule`] lifecycle (`create`, `process`, `need_frame`,
//!   `flush`, `destroy`) and static [`ModuleMetadata`]
//! - **State:** [`ModuleState`], the frame-consumption state machine shared by
//!   buffering, windowed, and draining modules
//! - **Options:** Typed, range-checked module options
//! - **Registry:** Name → factory lookup used by hosts
//! - **Host:** [`ModuleHost`], a wrapper that refuses to process a module whose
//!   `create` failed
//!
//! ```text
//!            create                process (window full)
//!   Idle ───────────▶ Buffering ───────────────────────▶ Ready
//!                      ▲   │  ▲                            │
//!                      │   │  └──────── emit ──────────────┘
//!                      │   │ process (full frame)
//!                      │   ▼
//!                      └─ Draining   (need_frame == false)
//! ```

pub mod host;
pub mod module;
pub mod modules;
pub mod options;
pub mod registry;
pub mod state;

pub use host::ModuleHost;
pub use module::*;
pub use options::*;
pub use registry::ModuleRegistry;
pub use state::{ModulePhase, ModuleState};
