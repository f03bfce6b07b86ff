//! Archive codec for assembly trees.
//!
//! An archive is a zip container with a `definition.json` tree description
//! and one exchange file per geometry node, nested in directories named
//! after the ancestors. Export and extraction go through a scratch
//! directory that is removed when the call returns, whether it succeeded
//! or not.

mod paths;

pub use paths::ArchivePathBuilder;

use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use glam::{DQuat, DVec3};
use kernel::{ExchangeFormat, Location};
use shared::{
    ArchiveDefinition, DefinitionDocument, LocationRecord, NodeRecord, Rgb, ARCHIVE_FORMAT,
    ARCHIVE_VERSION, DEFINITION_FILE,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::assembly::{NodeColor, ShapeNode};
use crate::build::BoundingBox;
use crate::error::{ArchiveError, GeometryError};

/// Container file extension.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Export settings for geometry nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub format: ExchangeFormat,
    pub linear_tolerance: f64,
    pub angular_tolerance: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExchangeFormat::Brep,
            linear_tolerance: 0.1,
            angular_tolerance: 0.1,
        }
    }
}

/// Writes and reads archives named `<archive_name>.zip` in `output_dir`.
#[derive(Debug, Clone)]
pub struct Serializer {
    pub output_dir: PathBuf,
    pub archive_name: String,
}

impl Serializer {
    pub fn new(output_dir: impl Into<PathBuf>, archive_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            archive_name: archive_name.into(),
        }
    }

    /// Path of the archive this serializer writes.
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.archive_name, ARCHIVE_EXTENSION))
    }

    /// Encode `root` into the archive file and return its path.
    ///
    /// The file only appears once complete; on error nothing is left behind.
    pub fn serialize(&self, root: &ShapeNode, options: &ExportOptions) -> Result<PathBuf, ArchiveError> {
        let scratch = TempDir::new()?;
        let definition = export_tree(root, options, scratch.path())?;

        fs::create_dir_all(&self.output_dir)?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.output_dir)?;
        write_container(staged.as_file_mut(), &definition, scratch.path())?;
        let path = self.archive_path();
        staged.persist(&path).map_err(|e| ArchiveError::Io(e.error))?;

        tracing::info!(
            "serialized {} nodes into {}",
            definition.root.count(),
            path.display()
        );
        Ok(path)
    }
}

/// Encode `root` into an in-memory archive.
pub fn serialize_to_bytes(root: &ShapeNode, options: &ExportOptions) -> Result<Vec<u8>, ArchiveError> {
    let scratch = TempDir::new()?;
    let definition = export_tree(root, options, scratch.path())?;
    let cursor = write_container(Cursor::new(Vec::new()), &definition, scratch.path())?;
    Ok(cursor.into_inner())
}

/// Decode the archive at `path`.
pub fn deserialize(path: &Path) -> Result<ShapeNode, ArchiveError> {
    read_container(File::open(path)?)
}

/// Decode an in-memory archive.
pub fn deserialize_bytes(bytes: &[u8]) -> Result<ShapeNode, ArchiveError> {
    read_container(Cursor::new(bytes))
}

// ── Location records ────────────────────────────────────────────

pub fn location_to_record(loc: &Location) -> LocationRecord {
    LocationRecord {
        t: loc.translation.to_array(),
        q: loc.rotation.to_array(),
    }
}

/// Exact inverse of [`location_to_record`]; the quaternion is not
/// renormalized.
pub fn location_from_record(record: &LocationRecord) -> Result<Location, ArchiveError> {
    let finite = record.t.iter().chain(record.q.iter()).all(|c| c.is_finite());
    let q = DQuat::from_array(record.q);
    if !finite || q.length_squared() < 1e-12 {
        return Err(ArchiveError::Corrupt(format!(
            "invalid transform t={:?} q={:?}",
            record.t, record.q
        )));
    }
    Ok(Location::new(DVec3::from_array(record.t), q))
}

// ── Export ──────────────────────────────────────────────────────

fn export_tree(root: &ShapeNode, options: &ExportOptions, scratch: &Path) -> Result<ArchiveDefinition, ArchiveError> {
    if !options.format.is_importable() {
        return Err(GeometryError::InvalidInput(format!(
            "export format '{}' cannot be read back",
            options.format
        ))
        .into());
    }
    let mut paths = ArchivePathBuilder::new();
    let record = export_node(root, "", Rgb::DEFAULT, &mut paths, options, scratch)?;
    Ok(ArchiveDefinition::new(options.format.name(), record))
}

fn export_node(
    node: &ShapeNode,
    dir: &str,
    inherited: Rgb,
    paths: &mut ArchivePathBuilder,
    options: &ExportOptions,
    scratch: &Path,
) -> Result<NodeRecord, ArchiveError> {
    let mut record = NodeRecord::group(&node.name);
    // A record without a color reads back as amber, so inherited colors
    // are written out explicitly.
    let color = node.color.resolve(inherited);

    match &node.geometry {
        Some(shape) => {
            if shape.is_null() {
                return Err(GeometryError::InvalidInput(format!(
                    "node '{}' has null geometry",
                    node.name
                ))
                .into());
            }
            let rel = paths.file_path(dir, &node.name, options.format.extension());
            let target = scratch.join(&rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            kernel::export_shape(
                shape,
                &target,
                options.format,
                options.linear_tolerance,
                options.angular_tolerance,
            )?;
            tracing::debug!(
                "exported {} {}",
                rel,
                BoundingBox::of_shape(shape, options.linear_tolerance, false)
            );

            record.filename = rel;
            record.loc = Some(location_to_record(&node.location));
            record.color = Some(color);
        }
        None => {
            if !node.location.is_identity() {
                record.loc = Some(location_to_record(&node.location));
            }
            if color != Rgb::DEFAULT {
                record.color = Some(color);
            }
        }
    }

    let child_dir = ArchivePathBuilder::child_dir(dir, &node.name);
    for child in &node.children {
        record
            .children
            .push(export_node(child, &child_dir, color, paths, options, scratch)?);
    }
    Ok(record)
}

fn write_container<W: Write + Seek>(
    writer: W,
    definition: &ArchiveDefinition,
    scratch: &Path,
) -> Result<W, ArchiveError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(DEFINITION_FILE, options)?;
    serde_json::to_writer_pretty(&mut zip, definition)?;

    for rel in definition.root.filenames() {
        zip.start_file(rel, options)?;
        let mut file = File::open(scratch.join(rel))?;
        std::io::copy(&mut file, &mut zip)?;
    }
    Ok(zip.finish()?)
}

// ── Import ──────────────────────────────────────────────────────

fn read_container<R: Read + Seek>(reader: R) -> Result<ShapeNode, ArchiveError> {
    let mut zip = ZipArchive::new(reader)
        .map_err(|e| ArchiveError::Corrupt(format!("not an archive container: {e}")))?;

    let definition = {
        let file = zip
            .by_name(DEFINITION_FILE)
            .map_err(|_| ArchiveError::Corrupt(format!("{DEFINITION_FILE} is missing")))?;
        let doc: DefinitionDocument = serde_json::from_reader(file)
            .map_err(|e| ArchiveError::Corrupt(format!("invalid {DEFINITION_FILE}: {e}")))?;
        doc.into_definition()
    };
    if definition.format != ARCHIVE_FORMAT {
        return Err(ArchiveError::Corrupt(format!(
            "unknown archive format '{}'",
            definition.format
        )));
    }
    if definition.version > ARCHIVE_VERSION {
        return Err(ArchiveError::FutureVersion {
            found: definition.version,
            supported: ARCHIVE_VERSION,
        });
    }
    let format: ExchangeFormat = definition
        .export_format
        .parse()
        .map_err(|_| ArchiveError::Corrupt(format!("unknown export format '{}'", definition.export_format)))?;
    if !format.is_importable() {
        return Err(ArchiveError::Corrupt(format!(
            "export format '{format}' cannot be imported"
        )));
    }

    let scratch = TempDir::new()?;
    let root = import_node(&definition.root, &mut zip, format, scratch.path())?;
    tracing::debug!(
        "deserialized {} nodes (archive version {})",
        root.count(),
        definition.version
    );
    Ok(root)
}

fn import_node<R: Read + Seek>(
    record: &NodeRecord,
    zip: &mut ZipArchive<R>,
    format: ExchangeFormat,
    scratch: &Path,
) -> Result<ShapeNode, ArchiveError> {
    let mut node = ShapeNode::group(&record.name);

    if !record.is_group() {
        let target = extract(zip, &record.filename, scratch)?;
        node.geometry = Some(kernel::import_shape(&target, format)?);
    }
    node.location = match &record.loc {
        Some(loc) => location_from_record(loc)?,
        None => Location::IDENTITY,
    };
    node.color = NodeColor::Rgb(record.color.unwrap_or(Rgb::DEFAULT));

    for child in &record.children {
        node.children.push(import_node(child, zip, format, scratch)?);
    }
    Ok(node)
}

fn extract<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str, scratch: &Path) -> Result<PathBuf, ArchiveError> {
    let mut entry = zip
        .by_name(name)
        .map_err(|_| ArchiveError::Corrupt(format!("referenced file '{name}' is not in the archive")))?;
    let rel = entry
        .enclosed_name()
        .ok_or_else(|| ArchiveError::Corrupt(format!("unsafe path '{name}'")))?;
    let target = scratch.join(rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(&target)?;
    std::io::copy(&mut entry, &mut out)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use shared::ArchiveDefinition;

    fn zip_with_definition(definition: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file(DEFINITION_FILE, options).unwrap();
        zip.write_all(definition.as_bytes()).unwrap();
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_location_record_is_exact() {
        let loc = Location::new(
            DVec3::new(0.1, -2.5e-7, 1e10),
            DQuat::from_axis_angle(DVec3::new(1.0, 2.0, 3.0).normalize(), 0.3),
        );
        let back = location_from_record(&location_to_record(&loc)).unwrap();
        assert_eq!(back, loc);
    }

    #[test]
    fn test_zero_quaternion_is_corrupt() {
        let record = LocationRecord {
            t: [0.0; 3],
            q: [0.0; 4],
        };
        assert!(matches!(
            location_from_record(&record),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let tree = nested_assembly();
        let bytes = serialize_to_bytes(&tree, &ExportOptions::default()).unwrap();
        let back = deserialize_bytes(&bytes).unwrap();
        assert_eq!(back.names(), tree.names());
        assert_eq!(back.count(), tree.count());
    }

    #[test]
    fn test_group_records_only_non_default_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = ArchivePathBuilder::new();
        let record = export_node(
            &nested_assembly(),
            "",
            Rgb::DEFAULT,
            &mut paths,
            &ExportOptions::default(),
            dir.path(),
        )
        .unwrap();
        assert!(record.loc.is_none());
        assert!(record.color.is_none());
        let part = &record.children[0];
        assert!(part.loc.is_some() && part.color.is_some());
    }

    #[test]
    fn test_stl_export_format_rejected() {
        let options = ExportOptions {
            format: ExchangeFormat::Stl,
            ..ExportOptions::default()
        };
        assert!(matches!(
            serialize_to_bytes(&nested_assembly(), &options),
            Err(ArchiveError::Geometry(GeometryError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_null_geometry_aborts_serialize() {
        let tree = ShapeNode::group("root").with_child(ShapeNode::part("bad", kernel::Shape::Null));
        let dir = tempfile::tempdir().unwrap();
        let serializer = Serializer::new(dir.path(), "out");
        assert!(serializer.serialize(&tree, &ExportOptions::default()).is_err());
        assert!(!serializer.archive_path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_not_a_zip_is_corrupt() {
        assert!(matches!(
            deserialize_bytes(b"definitely not a zip"),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_missing_definition_is_corrupt() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.txt", SimpleFileOptions::default()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(
            deserialize_bytes(&bytes),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_missing_geometry_file_is_corrupt() {
        let def = r#"{"name": "A", "children": [{"name": "B", "filename": "A/B.brep"}]}"#;
        let bytes = zip_with_definition(def, &[]);
        let err = deserialize_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt(ref m) if m.contains("A/B.brep")));
    }

    #[test]
    fn test_missing_name_is_corrupt() {
        let bytes = zip_with_definition(r#"{"children": []}"#, &[]);
        assert!(matches!(
            deserialize_bytes(&bytes),
            Err(ArchiveError::Corrupt(_))
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut def = ArchiveDefinition::new("brep", NodeRecord::group("A"));
        def.version = ARCHIVE_VERSION + 1;
        let bytes = zip_with_definition(&serde_json::to_string(&def).unwrap(), &[]);
        assert!(matches!(
            deserialize_bytes(&bytes),
            Err(ArchiveError::FutureVersion { .. })
        ));
    }

    #[test]
    fn test_bare_definition_accepted() {
        let bytes = zip_with_definition(r#"{"name": "A", "children": [{"name": "G"}]}"#, &[]);
        let root = deserialize_bytes(&bytes).unwrap();
        assert_eq!(root.names(), vec!["A", "G"]);
        assert_eq!(root.children[0].color, NodeColor::Rgb(Rgb::DEFAULT));
        assert_eq!(root.children[0].location, Location::IDENTITY);
    }

    #[test]
    fn test_inherited_color_written_to_records() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let tree = ShapeNode::group("A")
            .with_color(red)
            .with_child(ShapeNode::group("G").with_child(ShapeNode::part("P", unit_box())));
        let dir = tempfile::tempdir().unwrap();
        let mut paths = ArchivePathBuilder::new();
        let record = export_node(&tree, "", Rgb::DEFAULT, &mut paths, &ExportOptions::default(), dir.path()).unwrap();
        let group = &record.children[0];
        assert_eq!(group.color, Some(red));
        assert_eq!(group.children[0].color, Some(red));
    }
}
