//! Listener lifecycle.
//!
//! A `ViewerSession` owns at most one running listener. The listener runs on
//! its own thread with a current-thread runtime, so requests are handled one
//! at a time.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::JoinHandle;

use cadview_lib::settings::ViewerSettings;
use cadview_lib::surface::{MessageSender, ViewerMessage};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::{router, AppState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot listen on {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("listener setup failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A running listener.
struct ServerHandle {
    address: SocketAddr,
    shutdown: Arc<Notify>,
    thread: JoinHandle<()>,
}

pub struct ViewerSession {
    settings: Arc<ViewerSettings>,
    messages: MessageSender,
    current: Option<ServerHandle>,
}

impl ViewerSession {
    pub fn new(settings: ViewerSettings, messages: MessageSender) -> Self {
        Self {
            settings: Arc::new(settings),
            messages,
            current: None,
        }
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Address of the running listener.
    /// Address of the live listener. `None` once it has stopped, including
    /// after a remote `/stop`.
    pub fn address(&self) -> Option<SocketAddr> {
        self.current
            .as_ref()
            .filter(|h| !h.thread.is_finished())
            .map(|h| h.address)
    }

    pub fn is_running(&self) -> bool {
        self.address().is_some()
    }

    /// Start listening on the configured address, stopping any previous
    /// listener first. Returns the bound address.
    pub fn start(&mut self) -> Result<SocketAddr, SessionError> {
        self.stop();

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address)
            .and_then(|l| l.set_nonblocking(true).map(|()| l))
            .map_err(|source| SessionError::Bind {
                address: address.clone(),
                source,
            })?;
        let bound = listener.local_addr()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let shutdown = Arc::new(Notify::new());
        let state = AppState {
            settings: self.settings.clone(),
            messages: self.messages.clone(),
            shutdown: shutdown.clone(),
            pipeline: Arc::default(),
        };

        let thread = std::thread::Builder::new()
            .name("cadview-http".into())
            .spawn(move || {
                runtime.block_on(async move {
                    let signal = state.shutdown.clone();
                    let result = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => axum::serve(listener, router(state))
                            .with_graceful_shutdown(async move { signal.notified().await })
                            .await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        error!("HTTP server failed: {e}");
                    }
                });
                info!("HTTP server stopped");
            })?;

        info!("HTTP server started on {bound}");
        let _ = self
            .messages
            .send(ViewerMessage::Status("HTTP server started".to_string()));
        self.current = Some(ServerHandle {
            address: bound,
            shutdown,
            thread,
        });
        Ok(bound)
    }

    /// Stop the listener and release its socket. Does nothing when no
    /// listener is running.
    pub fn stop(&mut self) {
        let Some(handle) = self.current.take() else {
            return;
        };
        info!("Stopping HTTP server on {}", handle.address);
        handle.shutdown.notify_one();
        if handle.thread.join().is_err() {
            error!("HTTP server thread panicked");
        }
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.stop();
    }
}
