//! Lumen math primitives.
//!
//! Vector and color arithmetic comes straight from `glam`; this crate adds
//! the ray and parametric interval types the tracer is built on.

// Re-export glam for convenience
pub use glam::*;

mod interval;
mod ray;

pub use interval::Interval;
pub use ray::Ray;
