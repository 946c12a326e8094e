//! Stillframe server entry point.

use std::error::Error;
use std::sync::Arc;

use stillframe_content::application::command_handlers::handle_ingest_story;
use stillframe_content::domain::commands::IngestStory;
use stillframe_core::clock::SystemClock;
use stillframe_core::effects::Collaborators;
use stillframe_sequencer::domain::orchestrator::Orchestrator;
use stillframe_server::config::ServerConfig;
use stillframe_server::effects::{ClipLibrary, HeadlessEffects};
use stillframe_server::error::AppError;
use stillframe_server::journal;
use stillframe_server::routes;
use stillframe_server::stage::StageActor;
use stillframe_server::state::AppState;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Stillframe server");

    let config = ServerConfig::from_env()?;

    // Ingest the story.
    let source = tokio::fs::read_to_string(&config.story_path)
        .await
        .map_err(AppError::from)?;
    let clock = Arc::new(SystemClock);
    let ingested = handle_ingest_story(
        &IngestStory {
            correlation_id: Uuid::new_v4(),
            origin: config.story_path.display().to_string(),
            source,
        },
        clock.as_ref(),
    )
    .map_err(AppError::from)?;
    journal::record(&ingested.event);
    let story = ingested.story;

    // Stage the story.
    let effects = Arc::new(HeadlessEffects::new(ClipLibrary::new(story.audio)));
    let termination = effects.termination();
    let orchestrator = Orchestrator::launch(
        story.graph,
        story.stage,
        Collaborators::uniform(&effects),
        clock,
    );
    let (stage, stage_task) = StageActor::spawn(orchestrator, story.triggers, config.tick());

    // Build router.
    // TODO: Replace CorsLayer::permissive() with the headset client origin once it is fixed.
    let app = routes::app(AppState::new(stage, ingested.fingerprint))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr = config.addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(termination))
        .await?;

    stage_task.abort();
    tracing::info!("Stillframe server stopped");

    Ok(())
}

/// Resolves when the session terminates or the process is interrupted.
async fn shutdown(mut termination: watch::Receiver<bool>) {
    tokio::select! {
        result = termination.wait_for(|done| *done) => {
            if result.is_ok() {
                tracing::info!("session terminated, shutting down");
            }
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::warn!(%error, "failed to listen for ctrl-c");
            }
            tracing::info!("interrupt received, shutting down");
        }
    }
}
