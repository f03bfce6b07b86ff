//! Viewer settings

use std::path::{Path, PathBuf};

use kernel::ExchangeFormat;
use serde::{Deserialize, Serialize};
use shared::DEFAULT_PORT;

use crate::build::Tessellator;
use crate::error::GeometryError;
use crate::serializer::ExportOptions;

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "CADVIEW_CONFIG";

/// Where the viewer listens and where clients send to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    /// `host:port`, suitable for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Tolerances for writing exchange files into archives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceSettings {
    pub linear: f64,
    pub angular: f64,
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self {
            linear: 0.1,
            angular: 0.1,
        }
    }
}

/// Tolerances for display meshing and edge sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    pub linear: f64,
    pub angular: f64,
    pub edge_deflection: f64,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            linear: 0.01,
            angular: 0.3,
            edge_deflection: 0.01,
        }
    }
}

impl MeshSettings {
    pub fn tessellator(&self) -> Result<Tessellator, GeometryError> {
        Tessellator::new(self.linear, self.angular)
    }
}

/// All viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub server: ServerSettings,
    /// Archive export tolerances
    pub export: ToleranceSettings,
    /// Display meshing tolerances
    pub display: MeshSettings,
    /// Base name of archive files, without extension
    pub archive_name: String,
    /// Directory for received payloads; system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            export: ToleranceSettings::default(),
            display: MeshSettings::default(),
            archive_name: ".cadview_serialized".to_string(),
            scratch_dir: None,
        }
    }
}

impl ViewerSettings {
    /// Settings file: `$CADVIEW_CONFIG`, else `settings.json` in the
    /// platform config directory.
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("org", "cadview", "cadview")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Where a received payload is persisted before decoding.
    pub fn payload_path(&self) -> PathBuf {
        self.scratch_dir().join(format!(
            "{}.{}",
            self.archive_name,
            crate::serializer::ARCHIVE_EXTENSION
        ))
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            format: ExchangeFormat::Brep,
            linear_tolerance: self.export.linear,
            angular_tolerance: self.export.angular,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ViewerSettings::default();
        assert_eq!(s.server.port, 8842);
        assert_eq!(s.server.address(), "127.0.0.1:8842");
        assert_eq!(s.server.base_url(), "http://127.0.0.1:8842");
        assert_eq!(s.export.linear, 0.1);
        assert!(s.payload_path().ends_with(".cadview_serialized.zip"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 9000}, "archive_name": "x"}"#).unwrap();
        let s = ViewerSettings::load_from(&path);
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.archive_name, "x");
        assert_eq!(s.display, MeshSettings::default());
    }

    #[test]
    fn test_invalid_or_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(ViewerSettings::load_from(&path), ViewerSettings::default());
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ViewerSettings::load_from(&path), ViewerSettings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = ViewerSettings::default();
        s.export.linear = 0.05;
        s.scratch_dir = Some(dir.path().to_path_buf());
        s.save_to(&path).unwrap();
        assert_eq!(ViewerSettings::load_from(&path), s);
    }
}
