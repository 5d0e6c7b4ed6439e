//! Garment rendering: layout, fill resolution, rasterisation, debug overlay.

pub mod color;
pub mod compositor;
pub mod debug;
pub mod garment;
pub mod geometry;
pub mod raster;

pub use compositor::{CompositeOutcome, Compositor};
pub use garment::{GarmentCategory, GarmentDescriptor};
pub use geometry::GarmentGeometry;
