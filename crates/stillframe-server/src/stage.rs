//! The stage actor.
//!
//! One tokio task owns the orchestrator and the trigger board. Requests
//! arrive over an mpsc channel and are handled between ticks, so every
//! state change happens on that task in arrival order. Events are
//! re-published on a broadcast channel after each tick and each request.

use std::time::Duration;

use stillframe_core::error::StageError;
use stillframe_sequencer::application::command_handlers;
use stillframe_sequencer::application::triggers::{TriggerBoard, TriggerOutcome};
use stillframe_sequencer::domain::commands::StageCommand;
use stillframe_sequencer::domain::events::StageEvent;
use stillframe_sequencer::domain::orchestrator::{Orchestrator, StagePhase, StageSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::journal;

const REQUEST_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

/// What firing a trigger amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum Fired {
    /// The trigger's command ran and produced these events.
    Handled(Vec<StageEvent>),
    /// The trigger produced nothing, for the given reason.
    Ignored(&'static str),
}

enum StageRequest {
    Command {
        command: StageCommand,
        reply: oneshot::Sender<Result<Vec<StageEvent>, StageError>>,
    },
    Trigger {
        name: String,
        tag: Option<String>,
        correlation_id: Uuid,
        reply: oneshot::Sender<Result<Fired, StageError>>,
    },
    Snapshot {
        reply: oneshot::Sender<StageSnapshot>,
    },
}

/// Cloneable handle used to talk to the stage actor.
#[derive(Debug, Clone)]
pub struct StageHandle {
    requests: mpsc::Sender<StageRequest>,
    events: broadcast::Sender<StageEvent>,
}

impl std::fmt::Debug for StageRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command { command, .. } => f.debug_tuple("Command").field(command).finish(),
            Self::Trigger { name, .. } => f.debug_tuple("Trigger").field(name).finish(),
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

fn stage_stopped() -> StageError {
    StageError::Infrastructure("stage is not running".to_owned())
}

impl StageHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> StageRequest,
    ) -> Result<T, StageError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(build(reply))
            .await
            .map_err(|_| stage_stopped())?;
        response.await.map_err(|_| stage_stopped())
    }

    /// Runs a command on the stage and returns the events it produced.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's rejection, or `StageError::Infrastructure`
    /// when the stage has stopped.
    pub async fn execute(&self, command: StageCommand) -> Result<Vec<StageEvent>, StageError> {
        self.request(|reply| StageRequest::Command { command, reply })
            .await?
    }

    /// Fires a named trigger source.
    ///
    /// # Errors
    ///
    /// Returns `StageError::NotFound` for an unknown trigger, the
    /// orchestrator's rejection of the resulting command, or
    /// `StageError::Infrastructure` when the stage has stopped.
    pub async fn fire_trigger(
        &self,
        name: String,
        tag: Option<String>,
        correlation_id: Uuid,
    ) -> Result<Fired, StageError> {
        self.request(|reply| StageRequest::Trigger {
            name,
            tag,
            correlation_id,
            reply,
        })
        .await?
    }

    /// Reads the current state of the stage.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Infrastructure` when the stage has stopped.
    pub async fn snapshot(&self) -> Result<StageSnapshot, StageError> {
        self.request(|reply| StageRequest::Snapshot { reply }).await
    }

    /// Subscribes to every event the stage records from now on. Dropping
    /// the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.events.subscribe()
    }
}

/// The task that owns the orchestrator.
pub struct StageActor {
    orchestrator: Orchestrator,
    triggers: TriggerBoard,
    requests: mpsc::Receiver<StageRequest>,
    events: broadcast::Sender<StageEvent>,
    tick: Duration,
}

impl StageActor {
    /// Spawns the actor, ticking the orchestrator every `tick` of wall time.
    #[must_use]
    pub fn spawn(
        orchestrator: Orchestrator,
        triggers: TriggerBoard,
        tick: Duration,
    ) -> (StageHandle, JoinHandle<()>) {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = StageHandle {
            requests: request_tx,
            events: event_tx.clone(),
        };
        let actor = Self {
            orchestrator,
            triggers,
            requests: request_rx,
            events: event_tx,
            tick,
        };
        (handle, tokio::spawn(actor.run()))
    }

    async fn run(mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();
        info!(tick_ms = self.tick.as_millis(), "stage actor started");

        loop {
            tokio::select! {
                now = ticker.tick() => {
                    self.orchestrator.advance(now.duration_since(last_tick));
                    last_tick = now;
                    self.publish();
                    if self.orchestrator.phase() == StagePhase::Terminated {
                        break;
                    }
                }
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    self.handle(request);
                }
            }
        }
        info!("stage actor stopped");
    }

    fn handle(&mut self, request: StageRequest) {
        debug!(?request, "stage request");
        match request {
            StageRequest::Command { command, reply } => {
                let result = self.execute(&command);
                let _ = reply.send(result);
            }
            StageRequest::Trigger {
                name,
                tag,
                correlation_id,
                reply,
            } => {
                let result = self.fire(&name, tag.as_deref(), correlation_id);
                let _ = reply.send(result);
            }
            StageRequest::Snapshot { reply } => {
                let _ = reply.send(self.orchestrator.snapshot());
            }
        }
    }

    fn execute(&mut self, command: &StageCommand) -> Result<Vec<StageEvent>, StageError> {
        // Anything recorded since the last tick belongs to nobody's response.
        self.publish();
        let events = command_handlers::handle(command, &mut self.orchestrator)?;
        for event in &events {
            journal::record(event);
            let _ = self.events.send(event.clone());
        }
        Ok(events)
    }

    fn fire(
        &mut self,
        name: &str,
        tag: Option<&str>,
        correlation_id: Uuid,
    ) -> Result<Fired, StageError> {
        let outcome = self
            .triggers
            .fire(name, tag, correlation_id)
            .inspect_err(|error| warn!(trigger = name, %error, "trigger rejected"))?;
        match outcome {
            TriggerOutcome::Command(command) => {
                let events = self.execute(&command)?;
                self.triggers.confirm(name);
                Ok(Fired::Handled(events))
            }
            TriggerOutcome::Ignored(reason) => {
                info!(trigger = name, reason, "trigger ignored");
                Ok(Fired::Ignored(reason))
            }
        }
    }

    fn publish(&mut self) {
        // Sending fails only when nobody is subscribed.
        for event in self.orchestrator.drain_events() {
            journal::record(&event);
            let _ = self.events.send(event);
        }
    }
}

impl std::fmt::Debug for StageActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageActor")
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
