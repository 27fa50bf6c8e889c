//! Map projection and graticule engine for terminal maps of high-latitude
//! regions: Mercator and polar stereographic projections, frame boundaries,
//! labelled parallels and meridians, and drawing clipped to the frame.

pub mod braille;
pub mod data;
pub mod error;
pub mod geo;
pub mod grid;
pub mod map;
pub mod surface;

pub use error::{MapError, Result};
