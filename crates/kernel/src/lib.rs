//! Analytic B-rep kernel.
//!
//! Shapes are built from planar, polar-planar, cylindrical and spherical
//! faces and from line/circle edges. The kernel exposes the small set of
//! operations the viewer pipeline consumes as black boxes: face meshing,
//! curve sampling, bounding boxes and exchange-file export/import.

pub mod bounds;
pub mod discretize;
pub mod error;
pub mod exchange;
pub mod geometry;
pub mod location;
pub mod mesh;
pub mod primitives;
pub mod topology;

pub use bounds::{compute_bounds, Aabb};
pub use discretize::{discretize, Discretizer};
pub use error::KernelError;
pub use exchange::{export_shape, import_shape, write_stl_file, ExchangeFormat};
pub use geometry::{Curve, Surface};
pub use location::Location;
pub use mesh::{clean, incremental_mesh, Triangulation};
pub use primitives::{make_box, make_circle_edge, make_cylinder, make_line_edge, make_rectangle, make_sphere, make_vertex};
pub use topology::{Compound, Edge, Face, Orientation, Shape, ShapeType, Solid, Vertex};

/// Parametric confusion: spans below this are treated as empty.
pub const PARAM_CONFUSION: f64 = 1e-9;

/// Upper bound on segments per parametric direction when meshing or sampling.
pub const MAX_SEGMENTS: usize = 2048;
