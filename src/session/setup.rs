//! Session setup and initialization

use crate::backend::BackendClient;
use crate::config::Config;
use crate::consts::cli_consts::EVENT_QUEUE_SIZE;
use crate::environment::Environment;
use crate::events::{Event, EventSender};
use crate::network::ResourceFetcher;
use crate::sync::{Renderer, Section};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Session data for both TUI and headless modes
pub struct SessionData {
    /// Activity events emitted by the renderer
    pub event_receiver: mpsc::Receiver<Event>,
    /// Shutdown sender to stop the session loop
    pub shutdown_sender: broadcast::Sender<()>,
    /// The engine; owned by whichever loop runs the session
    pub renderer: Renderer,
    /// Direct access for one-shot reads and writes outside any section
    pub fetcher: ResourceFetcher,
    /// Sections shown and refreshed, in tab order
    pub sections: Vec<Section>,
    /// Server the session talks to
    pub server_url: String,
    pub environment: Environment,
}

/// Resolves the server URL: explicit flag, then config file, then environment.
pub fn resolve_server_url(
    flag: Option<&str>,
    config: &Config,
    environment: Environment,
) -> String {
    flag.map(str::to_string)
        .or_else(|| config.server_url.clone())
        .unwrap_or_else(|| environment.server_url())
}

/// Builds the fetcher and renderer for one session.
///
/// Nothing is fetched here; the caller decides when the first refresh happens.
pub fn setup_session(
    config: &Config,
    environment: Environment,
    server_url: String,
) -> Result<SessionData, Box<dyn Error>> {
    let client = BackendClient::new(
        &server_url,
        config.session_cookie.clone(),
        config.request_timeout(),
    )?;
    let fetcher = ResourceFetcher::new(Arc::new(client));

    let (events, event_receiver) = EventSender::channel(EVENT_QUEUE_SIZE);
    let renderer = Renderer::new(fetcher.clone(), events, config.renderer_config());

    // Only one shutdown signal needed
    let (shutdown_sender, _) = broadcast::channel(1);

    Ok(SessionData {
        event_receiver,
        shutdown_sender,
        renderer,
        fetcher,
        sections: config.active_sections(),
        server_url,
        environment,
    })
}
