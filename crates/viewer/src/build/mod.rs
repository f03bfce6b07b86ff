//! Geometry preparation for display and export.
//!
//! Tessellation of B-rep shapes into triangle meshes, edge sampling, and
//! aggregate bounds used for view framing.

mod bounds;
mod discretize;
mod tessellate;

pub use bounds::{BoundingBox, DEFAULT_TOLERANCE};
pub use discretize::{discretize_edge, sample_edge};
pub use kernel::Discretizer;
pub use tessellate::{tessellate, Mesh, Tessellator};
