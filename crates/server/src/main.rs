use std::path::PathBuf;

use cadview_lib::settings::ViewerSettings;
use cadview_lib::surface::{self, HeadlessSurface};
use server::ViewerSession;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,cadview_lib=info".into()),
        )
        .init();

    let mut settings = ViewerSettings::load();
    let args = parse_args();
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    let snapshot = args.glb;

    let (tx, mut rx) = surface::channel();
    let mut session = ViewerSession::new(settings, tx);
    if let Err(e) = session.start() {
        tracing::error!("Failed to start viewer: {e}");
        std::process::exit(1);
    }

    let mut surface = HeadlessSurface::new();
    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                if !surface::apply(&mut surface, message) {
                    break;
                }
                if let Some(path) = &snapshot {
                    match surface.write_glb(path) {
                        Ok(true) => tracing::info!("Scene written to {}", path.display()),
                        Ok(false) => {}
                        Err(e) => tracing::error!("Failed to write {}: {e}", path.display()),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    tokio::task::block_in_place(|| session.stop());
}

#[derive(Default)]
struct Args {
    port: Option<u16>,
    /// Write the current scene as GLB after each update.
    glb: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match (arg.as_str(), iter.next()) {
            ("--port", Some(value)) => match value.parse() {
                Ok(port) => args.port = Some(port),
                Err(e) => tracing::error!("Invalid --port {value}: {e}"),
            },
            ("--glb", Some(value)) => args.glb = Some(PathBuf::from(value)),
            (other, _) => tracing::warn!("Ignoring argument {other}"),
        }
    }
    args
}
