//! Assembly hand-off to a viewer process.
//!
//! An assembly of located, colored shapes is packed into an archive,
//! sent over HTTP and unpacked on the viewer side, where it is meshed,
//! flattened into display parts and shown on a [`surface::ViewerSurface`].

pub mod assembly;
pub mod build;
pub mod camera;
pub mod display;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod helpers;
pub mod remote;
pub mod serializer;
pub mod settings;
pub mod surface;
pub mod validation;

pub use assembly::{NodeColor, ShapeNode};
pub use build::{BoundingBox, Mesh, Tessellator};
pub use display::{DisplayScene, DisplayUpdate};
pub use error::{ArchiveError, GeometryError, RemoteError};
pub use remote::RemoteViewer;
pub use serializer::{deserialize, deserialize_bytes, serialize_to_bytes, ExportOptions, Serializer};
pub use settings::ViewerSettings;
