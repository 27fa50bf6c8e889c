pub mod boundary;
pub mod clip;
pub mod contour;
pub mod frame;
pub mod geometry;
pub mod graticule;
pub mod projection;
pub mod renderer;
pub mod ticks;
pub mod viewport;

pub use boundary::{BoundaryBuilder, BoundaryPolygon};
pub use clip::{ClippedDrawer, GraticuleArtifacts, GraticuleStyle};
pub use frame::MapFrame;
pub use graticule::{GraticuleConfig, GraticuleLine, GraticuleRenderer, Label};
pub use projection::{ProjectedPoint, Projection, ProjectionKind, ProjectionParameters};
pub use renderer::{BrailleSurface, MapLayers};
pub use ticks::TickPlanner;
pub use viewport::Viewport;
