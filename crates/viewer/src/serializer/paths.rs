//! Relative file paths inside an archive.

use std::collections::HashSet;

/// Builds normalized, collision-free relative paths for tree nodes.
///
/// Every byte of a node name outside `[A-Za-z0-9_-]` is percent-encoded, so
/// names can never introduce separators, `.`/`..` segments or the `~`
/// used for disambiguation. If two nodes would still map to the same file
/// (duplicate sibling names), later ones get a `~N` suffix.
#[derive(Debug, Default)]
pub struct ArchivePathBuilder {
    used: HashSet<String>,
}

impl ArchivePathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percent-encode a node name into a single path segment.
    pub fn encode_name(name: &str) -> String {
        if name.is_empty() {
            return "%".to_string();
        }
        let mut out = String::with_capacity(name.len());
        for byte in name.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                out.push(byte as char);
            } else {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
        out
    }

    /// Directory holding the children of node `name` under `parent_dir`.
    pub fn child_dir(parent_dir: &str, name: &str) -> String {
        join(parent_dir, &Self::encode_name(name))
    }

    /// Reserve the geometry file path for node `name` in `dir`.
    pub fn file_path(&mut self, dir: &str, name: &str, extension: &str) -> String {
        let stem = join(dir, &Self::encode_name(name));
        let mut candidate = format!("{stem}.{extension}");
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{stem}~{n}.{extension}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

fn join(dir: &str, segment: &str) -> String {
    if dir.is_empty() {
        segment.to_string()
    } else {
        format!("{dir}/{segment}")
    }
}
