//! Pointerflow Model
//!
//! Defines the data contracts shared by every Pointerflow crate:
//! - **Events:** Raw pointer events as delivered by a host adapter
//! - **Pointers:** Per-pointer records kept by the tracker
//! - **Signals:** The envelope every emitted value travels in
//! - **Gestures:** Pan, pinch and tap payloads
//! - **Geometry:** Pure helpers for distance, angle and direction
//!
//! Coordinates are taken as supplied; no coordinate-space transforms are
//! applied anywhere in the pipeline.

pub mod event;
pub mod geometry;
pub mod gesture;
pub mod pointer;
pub mod signal;

pub use event::*;
pub use geometry::*;
pub use gesture::*;
pub use pointer::*;
pub use signal::*;
