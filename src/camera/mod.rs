// Camera domain: frame sources, device lifecycle, pixel normalisation.

pub mod backend;
pub mod convert;
pub mod dummy;
pub mod error;
pub mod feed;
pub mod types;
