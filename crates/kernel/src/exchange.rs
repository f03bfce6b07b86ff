//! Exchange files.
//!
//! `Brep` is a JSON document carrying the exact analytic shape, so an
//! export/import round trip is lossless. `Stl` is a tessellated ASCII file
//! and can only be written.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::mesh::{clean, incremental_mesh};
use crate::topology::Shape;

const BREP_FORMAT: &str = "brep-json";
const BREP_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeFormat {
    #[default]
    Brep,
    Stl,
}

impl ExchangeFormat {
    pub fn name(self) -> &'static str {
        match self {
            ExchangeFormat::Brep => "brep",
            ExchangeFormat::Stl => "stl",
        }
    }

    pub fn extension(self) -> &'static str {
        self.name()
    }

    pub fn is_importable(self) -> bool {
        matches!(self, ExchangeFormat::Brep)
    }
}

impl fmt::Display for ExchangeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExchangeFormat {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brep" => Ok(ExchangeFormat::Brep),
            "stl" => Ok(ExchangeFormat::Stl),
            _ => Err(KernelError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Serialize)]
struct BrepDocumentRef<'a> {
    format: &'a str,
    version: u32,
    linear_tolerance: f64,
    angular_tolerance: f64,
    shape: &'a Shape,
}

#[derive(Deserialize)]
struct BrepDocument {
    format: String,
    version: u32,
    shape: Shape,
}

/// Write `shape` to `path` in `format`.
pub fn export_shape(
    shape: &Shape,
    path: &Path,
    format: ExchangeFormat,
    linear_tolerance: f64,
    angular_tolerance: f64,
) -> Result<(), KernelError> {
    KernelError::check_positive("linear_tolerance", linear_tolerance)?;
    KernelError::check_positive("angular_tolerance", angular_tolerance)?;
    if shape.is_null() {
        return Err(KernelError::NullShape);
    }

    match format {
        ExchangeFormat::Brep => {
            let mut writer = BufWriter::new(File::create(path)?);
            let doc = BrepDocumentRef {
                format: BREP_FORMAT,
                version: BREP_VERSION,
                linear_tolerance,
                angular_tolerance,
                shape,
            };
            serde_json::to_writer(&mut writer, &doc)?;
            writer.flush()?;
            Ok(())
        }
        ExchangeFormat::Stl => write_stl_file(shape, path, linear_tolerance, angular_tolerance),
    }
}

/// Read a shape written by [`export_shape`].
pub fn import_shape(path: &Path, format: ExchangeFormat) -> Result<Shape, KernelError> {
    if !format.is_importable() {
        return Err(KernelError::NotImportable(format.to_string()));
    }
    let reader = BufReader::new(File::open(path)?);
    let doc: BrepDocument = serde_json::from_reader(reader)?;
    if doc.format != BREP_FORMAT {
        return Err(KernelError::Parse(format!("unexpected format '{}'", doc.format)));
    }
    if doc.version > BREP_VERSION {
        return Err(KernelError::Parse(format!(
            "version {} is newer than supported {}",
            doc.version, BREP_VERSION
        )));
    }
    Ok(doc.shape)
}

/// Mesh `shape` and write it as ASCII STL. Cached triangulations are
/// dropped before and after so the file reflects exactly these tolerances.
pub fn write_stl_file(
    shape: &Shape,
    path: &Path,
    linear_tolerance: f64,
    angular_tolerance: f64,
) -> Result<(), KernelError> {
    clean(shape);
    let result = write_stl_inner(shape, path, linear_tolerance, angular_tolerance);
    clean(shape);
    result
}

fn write_stl_inner(
    shape: &Shape,
    path: &Path,
    linear_tolerance: f64,
    angular_tolerance: f64,
) -> Result<(), KernelError> {
    incremental_mesh(shape, linear_tolerance, angular_tolerance)?;
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "solid shape")?;
    for face in shape.faces() {
        let Some((tri, loc)) = face.triangulation() else {
            continue;
        };
        for t in &tri.triangles {
            let [a, b, c] = t.map(|i| loc.transform_point(tri.nodes[i as usize]));
            let (b, c) = if face.is_reversed() { (c, b) } else { (b, c) };
            let n = (b - a).cross(c - a).normalize_or_zero();
            writeln!(out, "  facet normal {} {} {}", n.x, n.y, n.z)?;
            writeln!(out, "    outer loop")?;
            for p in [a, b, c] {
                writeln!(out, "      vertex {} {} {}", p.x, p.y, p.z)?;
            }
            writeln!(out, "    endloop")?;
            writeln!(out, "  endfacet")?;
        }
    }
    writeln!(out, "endsolid shape")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{make_box, make_cylinder};

    #[test]
    fn test_format_parse() {
        assert_eq!("BREP".parse::<ExchangeFormat>().unwrap(), ExchangeFormat::Brep);
        assert_eq!("stl".parse::<ExchangeFormat>().unwrap(), ExchangeFormat::Stl);
        assert!(matches!(
            "step".parse::<ExchangeFormat>(),
            Err(KernelError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_brep_roundtrip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.brep");
        let shape = make_cylinder(1.25, 3.5).unwrap();
        export_shape(&shape, &path, ExchangeFormat::Brep, 0.1, 0.1).unwrap();
        let back = import_shape(&path, ExchangeFormat::Brep).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_stl_is_export_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.stl");
        let shape = make_box(1.0, 2.0, 3.0).unwrap();
        export_shape(&shape, &path, ExchangeFormat::Stl, 0.1, 0.1).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("solid shape"));
        assert_eq!(text.matches("facet normal").count(), 12);
        assert!(shape.faces().iter().all(|f| f.triangulation().is_none()));
        assert!(matches!(
            import_shape(&path, ExchangeFormat::Stl),
            Err(KernelError::NotImportable(_))
        ));
    }

    #[test]
    fn test_export_null_shape_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("null.brep");
        assert!(matches!(
            export_shape(&Shape::Null, &path, ExchangeFormat::Brep, 0.1, 0.1),
            Err(KernelError::NullShape)
        ));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.brep");
        std::fs::write(&path, b"{\"format\":\"other\",\"version\":1,\"shape\":{\"type\":\"null\"}}").unwrap();
        assert!(matches!(
            import_shape(&path, ExchangeFormat::Brep),
            Err(KernelError::Parse(_))
        ));
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            import_shape(&path, ExchangeFormat::Brep),
            Err(KernelError::Json(_))
        ));
    }
}
