//! POST pipeline: persist → decode → convert → update.
//!
//! Each stage is fault-isolated. A failing stage stops the pipeline and is
//! reported as a [`StageFailure`]; the listener keeps serving.

use std::fmt;

use cadview_lib::display::{DisplayScene, DisplayUpdate};
use cadview_lib::serializer::deserialize;
use cadview_lib::settings::ViewerSettings;
use cadview_lib::surface::{MessageSender, ViewerMessage};
use shared::options_from_pairs;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Persist,
    Decode,
    Convert,
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Persist => "Storing POST data",
            Stage::Decode => "Decoding archive",
            Stage::Convert => "Converting assembly to display parts",
            Stage::Update => "Showing objects",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {message}")]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: Stage, error: impl fmt::Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

/// Run all stages for one received payload. `query` holds the decoded
/// query string pairs.
pub fn process(
    settings: &ViewerSettings,
    messages: &MessageSender,
    query: &[(String, String)],
    body: &[u8],
) -> Result<(), StageFailure> {
    let path = settings.payload_path();
    std::fs::create_dir_all(settings.scratch_dir())
        .and_then(|()| std::fs::write(&path, body))
        .map_err(|e| StageFailure::new(Stage::Persist, e))?;
    info!("Stored {} bytes in {}", body.len(), path.display());

    let root = deserialize(&path).map_err(|e| StageFailure::new(Stage::Decode, e))?;
    info!("Assembly deserialized: {}", root.name);

    let scene = DisplayScene::from_assembly(&root, &settings.display)
        .map_err(|e| StageFailure::new(Stage::Convert, e))?;
    info!(
        "Assembly converted: {} parts, {} triangles",
        scene.shapes.len(),
        scene.triangle_count()
    );
    if let Ok(tree) = serde_json::to_string(&scene.tree) {
        debug!("Navigation tree: {tree}");
    }

    let options = options_from_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    for warning in &options.warnings {
        warn!("{warning}");
    }
    let update = DisplayUpdate {
        scene,
        options: options.into_value(),
    };
    messages
        .send(ViewerMessage::Show(Box::new(update)))
        .map_err(|_| StageFailure::new(Stage::Update, "viewer surface is closed"))?;
    info!("Assembly view updated");
    Ok(())
}
