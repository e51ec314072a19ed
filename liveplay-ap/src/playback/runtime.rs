//! Engine task
//!
//! The [`CueEngine`] is owned by a single tokio task. Callers talk to it
//! through a cloneable [`EngineHandle`]: every request is an
//! [`EngineCommand`] with a oneshot reply. The task also ticks the engine
//! clock on a fixed interval and, when enabled, broadcasts the debug state
//! inspector snapshot.

use chrono::Utc;
use liveplay_common::events::LiveplayEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::engine::{CueEngine, TriggerTarget, POLL_INTERVAL};
use super::types::EngineSnapshot;
use crate::error::{Error, Result};
use crate::state::SharedState;

/// Queued commands before senders wait
const COMMAND_BUFFER: usize = 64;

/// Engine task settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Engine clock tick
    pub tick_interval: Duration,

    /// State inspector cadence; `None` disables it
    pub inspector_interval: Option<Duration>,
}

impl RuntimeOptions {
    /// Options with the inspector set from milliseconds (0 = off)
    pub fn with_inspector_ms(inspector_interval_ms: u64) -> Self {
        Self {
            inspector_interval: (inspector_interval_ms > 0)
                .then(|| Duration::from_millis(inspector_interval_ms)),
            ..Self::default()
        }
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: POLL_INTERVAL,
            inspector_interval: Some(Duration::from_millis(
                liveplay_common::config::DEFAULT_INSPECTOR_INTERVAL_MS,
            )),
        }
    }
}

/// Requests handled by the engine task
#[derive(Debug)]
pub enum EngineCommand {
    Trigger {
        target: TriggerTarget,
        reply: oneshot::Sender<bool>,
    },
    Stop {
        uuid: Uuid,
        reply: oneshot::Sender<bool>,
    },
    StopAll {
        reply: oneshot::Sender<()>,
    },
    Panic {
        reply: oneshot::Sender<()>,
    },
    Pause {
        uuid: Uuid,
        reply: oneshot::Sender<bool>,
    },
    Resume {
        uuid: Uuid,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
}

/// Cloneable handle to the engine task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::EngineUnavailable("engine task has stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::EngineUnavailable("engine dropped the request".to_string()))
    }

    /// `true` if something started
    pub async fn trigger(&self, target: TriggerTarget) -> Result<bool> {
        self.request(|reply| EngineCommand::Trigger { target, reply })
            .await
    }

    /// `true` if the cue was active
    pub async fn stop(&self, uuid: Uuid) -> Result<bool> {
        self.request(|reply| EngineCommand::Stop { uuid, reply })
            .await
    }

    pub async fn stop_all(&self) -> Result<()> {
        self.request(|reply| EngineCommand::StopAll { reply }).await
    }

    pub async fn panic(&self) -> Result<()> {
        self.request(|reply| EngineCommand::Panic { reply }).await
    }

    pub async fn pause(&self, uuid: Uuid) -> Result<bool> {
        self.request(|reply| EngineCommand::Pause { uuid, reply })
            .await
    }

    pub async fn resume(&self, uuid: Uuid) -> Result<bool> {
        self.request(|reply| EngineCommand::Resume { uuid, reply })
            .await
    }

    /// Snapshot taken inside the engine task, after a clock tick
    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        self.request(|reply| EngineCommand::Snapshot { reply })
            .await
    }
}

/// Move the engine onto its own task
///
/// The task ends when every [`EngineHandle`] has been dropped.
pub fn spawn_engine(
    engine: CueEngine,
    state: Arc<SharedState>,
    options: RuntimeOptions,
) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run_engine(engine, state, options, rx));
    (EngineHandle { tx }, task)
}

async fn run_engine(
    mut engine: CueEngine,
    state: Arc<SharedState>,
    options: RuntimeOptions,
    mut rx: mpsc::Receiver<EngineCommand>,
) {
    let start = Instant::now();
    let mut tick = interval(options.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut inspector = options
        .inspector_interval
        .map(|period| interval_at(start + period, period));

    info!(
        "Engine task started (tick {:?}, inspector {:?})",
        options.tick_interval, options.inspector_interval
    );

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                engine.tick(start.elapsed());
                handle_command(&mut engine, command);
            }
            _ = tick.tick() => {
                engine.tick(start.elapsed());
            }
            _ = next_inspection(&mut inspector) => {
                inspect(&engine, &state);
            }
        }

        publish(&mut engine, &state).await;
    }

    info!("Engine task stopped");
}

fn handle_command(engine: &mut CueEngine, command: EngineCommand) {
    // A dropped reply receiver only means the caller gave up
    match command {
        EngineCommand::Trigger { target, reply } => {
            let _ = reply.send(engine.trigger(&target));
        }
        EngineCommand::Stop { uuid, reply } => {
            let active = engine.session().contains_cue(uuid);
            engine.stop_cue(uuid);
            let _ = reply.send(active);
        }
        EngineCommand::StopAll { reply } => {
            engine.stop_all_cues();
            let _ = reply.send(());
        }
        EngineCommand::Panic { reply } => {
            engine.panic_stop();
            let _ = reply.send(());
        }
        EngineCommand::Pause { uuid, reply } => {
            let _ = reply.send(engine.pause_cue(uuid));
        }
        EngineCommand::Resume { uuid, reply } => {
            let _ = reply.send(engine.resume_cue(uuid));
        }
        EngineCommand::Snapshot { reply } => {
            let _ = reply.send(engine.snapshot());
        }
    }
}

async fn next_inspection(inspector: &mut Option<Interval>) {
    match inspector {
        Some(inspector) => {
            inspector.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Broadcast the active maps as a `StateSnapshot` event
fn inspect(engine: &CueEngine, state: &SharedState) {
    match serde_json::to_value(engine.snapshot()) {
        Ok(value) => state.broadcast_event(LiveplayEvent::StateSnapshot {
            state: value,
            timestamp: Utc::now(),
        }),
        Err(e) => warn!("Failed to serialize engine state: {}", e),
    }
}

async fn publish(engine: &mut CueEngine, state: &SharedState) {
    let events = engine.drain_events();
    if !events.is_empty() {
        debug!("Publishing {} engine events", events.len());
    }
    for event in events {
        state.broadcast_event(event);
    }
    state.set_snapshot(engine.snapshot()).await;
}
