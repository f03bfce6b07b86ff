//! Viewer surface and the message queue that feeds it.
//!
//! The HTTP listener never touches the surface directly. It sends
//! `ViewerMessage`s over an unbounded channel and the host loop applies them
//! in order with [`apply`].

use std::path::Path;

use tokio::sync::mpsc;
use tracing::info;

use crate::camera::ArcBallCamera;
use crate::display::{DisplayScene, DisplayUpdate};
use crate::export::build_glb;

/// Something that can show scenes and a status line.
pub trait ViewerSurface {
    fn add_shapes(&mut self, update: DisplayUpdate);
    fn set_status(&mut self, text: &str);
}

/// Work queued for the host loop.
#[derive(Debug)]
pub enum ViewerMessage {
    Show(Box<DisplayUpdate>),
    Status(String),
    /// The listener was asked to stop; the host loop should exit.
    Stopped,
}

pub type MessageSender = mpsc::UnboundedSender<ViewerMessage>;
pub type MessageReceiver = mpsc::UnboundedReceiver<ViewerMessage>;

pub fn channel() -> (MessageSender, MessageReceiver) {
    mpsc::unbounded_channel()
}

/// Apply one message. Returns `false` once the surface should shut down.
pub fn apply<S: ViewerSurface + ?Sized>(surface: &mut S, message: ViewerMessage) -> bool {
    match message {
        ViewerMessage::Show(update) => {
            surface.add_shapes(*update);
            true
        }
        ViewerMessage::Status(text) => {
            surface.set_status(&text);
            true
        }
        ViewerMessage::Stopped => {
            surface.set_status("HTTP server stopped");
            false
        }
    }
}

/// Surface without a window: keeps the latest scene, a status history and a
/// camera framed on the scene.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    scene: Option<DisplayScene>,
    status: Vec<String>,
    camera: ArcBallCamera,
    updates: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> Option<&DisplayScene> {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> &ArcBallCamera {
        &self.camera
    }

    /// Status lines, oldest first.
    pub fn status_lines(&self) -> &[String] {
        &self.status
    }

    pub fn last_status(&self) -> Option<&str> {
        self.status.last().map(String::as_str)
    }

    /// Number of scenes shown so far.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    /// Write the current scene and camera as GLB. Returns `false` if there
    /// is nothing to write.
    pub fn write_glb(&self, path: &Path) -> std::io::Result<bool> {
        let Some(scene) = &self.scene else {
            return Ok(false);
        };
        let glb = build_glb(scene, Some(&self.camera))?;
        if glb.is_empty() {
            return Ok(false);
        }
        std::fs::write(path, glb)?;
        Ok(true)
    }
}

impl ViewerSurface for HeadlessSurface {
    fn add_shapes(&mut self, update: DisplayUpdate) {
        let first = self.scene.is_none();
        if first || update.reset_camera() {
            self.camera.frame(&update.scene.bounds);
        }
        info!(
            "Showing {} parts, {} triangles",
            update.scene.shapes.len(),
            update.scene.triangle_count()
        );
        self.scene = Some(update.scene);
        self.updates += 1;
    }

    fn set_status(&mut self, text: &str) {
        info!("Status: {text}");
        self.status.push(text.to_string());
    }
}
