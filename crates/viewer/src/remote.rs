//! Client side of the hand-off: serialize an assembly and post it to a
//! running viewer.

use shared::{reply, ARCHIVE_CONTENT_TYPE};
use tracing::info;

use crate::assembly::ShapeNode;
use crate::error::RemoteError;
use crate::serializer::{serialize_to_bytes, ExportOptions};
use crate::settings::{ServerSettings, ToleranceSettings, ViewerSettings};

pub struct RemoteViewer {
    client: reqwest::Client,
    server: ServerSettings,
    tolerance: ToleranceSettings,
}

impl RemoteViewer {
    pub fn new(server: ServerSettings, tolerance: ToleranceSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            server,
            tolerance,
        }
    }

    pub fn from_settings(settings: &ViewerSettings) -> Self {
        Self::new(settings.server.clone(), settings.export)
    }

    /// Point the client at another viewer.
    pub fn set_server(&mut self, host: impl Into<String>, port: u16) {
        self.server = ServerSettings {
            host: host.into(),
            port,
        };
    }

    /// Export tolerances for subsequent `show` calls.
    pub fn set_tolerance(&mut self, linear: f64, angular: f64) {
        self.tolerance = ToleranceSettings { linear, angular };
    }

    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub fn tolerance(&self) -> ToleranceSettings {
        self.tolerance
    }

    /// Serialize `root` and send it for display. Any reply other than
    /// `Done` is returned as [`RemoteError::Rejected`] with the viewer's
    /// message.
    pub async fn show(&self, root: &ShapeNode, reset: bool) -> Result<(), RemoteError> {
        let options = ExportOptions {
            linear_tolerance: self.tolerance.linear,
            angular_tolerance: self.tolerance.angular,
            ..ExportOptions::default()
        };
        let payload = serialize_to_bytes(root, &options)?;
        info!("Sending '{}' ({} bytes)", root.name, payload.len());

        let url = format!("{}/?reset={reset}", self.server.base_url());
        let body = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if body == reply::DONE {
            Ok(())
        } else {
            Err(RemoteError::Rejected(body))
        }
    }

    /// Reply of the status endpoint, `Running` for a live viewer.
    pub async fn status(&self) -> Result<String, RemoteError> {
        self.get("status").await
    }

    /// Ask the viewer to stop listening.
    pub async fn stop(&self) -> Result<String, RemoteError> {
        self.get("stop").await
    }

    async fn get(&self, path: &str) -> Result<String, RemoteError> {
        let url = format!("{}/{path}", self.server.base_url());
        Ok(self.client.get(url).send().await?.error_for_status()?.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_server_and_tolerance() {
        let mut remote = RemoteViewer::from_settings(&ViewerSettings::default());
        assert_eq!(remote.server().port, 8842);
        remote.set_server("10.0.0.2", 9000);
        remote.set_tolerance(0.05, 0.2);
        assert_eq!(remote.server().base_url(), "http://10.0.0.2:9000");
        assert_eq!(
            remote.tolerance(),
            ToleranceSettings {
                linear: 0.05,
                angular: 0.2
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_viewer_is_http_error() {
        let mut remote = RemoteViewer::from_settings(&ViewerSettings::default());
        // Port 9 (discard) on loopback is closed in test environments.
        remote.set_server("127.0.0.1", 9);
        assert!(matches!(remote.status().await, Err(RemoteError::Http(_))));
    }

    #[tokio::test]
    async fn test_invalid_tolerance_fails_before_sending() {
        let mut remote = RemoteViewer::from_settings(&ViewerSettings::default());
        remote.set_server("127.0.0.1", 9);
        remote.set_tolerance(-1.0, 0.1);
        let result = remote.show(&crate::fixtures::nested_assembly(), true).await;
        assert!(matches!(result, Err(RemoteError::Archive(_))));
    }
}
