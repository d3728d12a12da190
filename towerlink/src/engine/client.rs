//! The protocol client: one background task owning both engine channels.
//!
//! # Design Notes
//!
//! The task is the single writer of the raw link state. Stream payloads
//! overwrite their cache wholesale (last-write-wins); event frames flip
//! confirmation flags; a fixed tick resolves command echo windows and checks
//! broadcast staleness. Callers interact through [`EngineHandle`]:
//! snapshot reads, a serialized command queue, and bounded waits that wake
//! on [`LinkUpdate`] notifications.
//!
//! Commands are confirmed by silence. Exactly one command is in flight at a
//! time: the task sends the frame, collects echo lines until the echo-window
//! deadline, then resolves the request. No lines means success; lines for a
//! silence-expected command mean rejection with the lines preserved
//! verbatim. Serializing issuance through the queue is what makes echo
//! attribution unambiguous.
//!
//! The handle holds a *receiver* of the update channel, never the sender.
//! When the task exits the channel closes, so every bounded wait observes
//! the closure and fails fast with [`EngineError::LinkClosed`] instead of
//! running out its timeout.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::model::{Callsign, RunState};
use crate::protocol::payload::SimulationBroadcast;
use crate::protocol::{Frame, ProtocolError, RawAircraft};

use super::events::{self, EngineEvent, StreamEvent};
use super::transport::{self, EngineChannels};
use super::{EngineConfig, EngineError};

/// Queue depth for pending command requests.
const COMMAND_QUEUE_DEPTH: usize = 32;
/// Capacity of the update notification channel.
const UPDATE_CHANNEL_CAPACITY: usize = 64;
/// Bound on waiting for the client task to exit during shutdown.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

/// Lightweight notification published whenever the link state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkUpdate {
    AircraftData,
    SimulationData,
    ResetConfirmed,
    ScenarioStored,
    ShutdownConfirmed,
}

/// Engine-reported simulation state as last broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSimulation {
    pub state: RunState,
    pub elapsed_sec: f64,
    pub utc: String,
    pub step_size_sec: f64,
    pub speed_multiplier: f64,
    pub aircraft_count: u32,
    /// Scenario name as broadcast; empty when none is loaded.
    pub scenario_name: String,
}

impl Default for RawSimulation {
    fn default() -> Self {
        Self {
            state: RunState::Init,
            elapsed_sec: 0.0,
            utc: "00:00:00".to_string(),
            step_size_sec: 1.0,
            speed_multiplier: 1.0,
            aircraft_count: 0,
            scenario_name: String::new(),
        }
    }
}

impl TryFrom<&SimulationBroadcast> for RawSimulation {
    type Error = ProtocolError;

    fn try_from(broadcast: &SimulationBroadcast) -> Result<Self, ProtocolError> {
        Ok(Self {
            state: broadcast.run_state()?,
            elapsed_sec: broadcast.elapsed_sec(),
            utc: broadcast.utc().to_string(),
            step_size_sec: broadcast.step_size_sec(),
            speed_multiplier: broadcast.speed_multiplier(),
            aircraft_count: broadcast.aircraft_count(),
            scenario_name: broadcast.scenario_name().to_string(),
        })
    }
}

/// Raw engine state. Written only by the client task; flags are consumed by
/// controllers through the handle.
#[derive(Debug, Default)]
struct LinkState {
    aircraft: Option<HashMap<Callsign, RawAircraft>>,
    simulation: Option<RawSimulation>,
    nodes: Vec<String>,
    last_broadcast: Option<Instant>,
    reset_confirmed: bool,
    scenario_stored: Option<crate::protocol::ScenarioStored>,
    shutdown_confirmed: bool,
}

/// One queued command and its completion channel.
struct CommandRequest {
    line: String,
    expects_reply: bool,
    done: oneshot::Sender<Result<Vec<String>, EngineError>>,
}

/// The command currently inside its echo window.
struct InFlight {
    expects_reply: bool,
    deadline: Instant,
    lines: Vec<String>,
    done: oneshot::Sender<Result<Vec<String>, EngineError>>,
}

/// Decide a command's outcome from the echo collected inside its window.
fn resolve_echo(expects_reply: bool, lines: Vec<String>) -> Result<Vec<String>, EngineError> {
    if expects_reply || lines.is_empty() {
        Ok(lines)
    } else {
        Err(EngineError::Rejected(lines.join("\n")))
    }
}

/// A running engine link: the caller-facing handle plus task lifecycle.
#[derive(Debug)]
pub struct EngineLink {
    handle: EngineHandle,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), EngineError>>,
}

impl EngineLink {
    /// A cloneable handle for controllers.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel the client task and await its exit, bounded.
    ///
    /// Returns the task's terminal error if it had already failed (for
    /// example with [`EngineError::ConnectionLost`]).
    pub async fn shutdown(mut self) -> Result<(), EngineError> {
        self.cancel.cancel();
        match tokio::time::timeout(SHUTDOWN_WAIT, &mut self.task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::error!(error = %join_error, "engine client task did not join cleanly");
                Err(EngineError::LinkClosed)
            }
            Err(_) => {
                self.task.abort();
                Err(EngineError::LinkClosed)
            }
        }
    }
}

/// The background task owning both channels and all raw-state writes.
pub struct EngineClient {
    config: EngineConfig,
    state: Arc<RwLock<LinkState>>,
    update_tx: broadcast::Sender<LinkUpdate>,
    cmd_rx: mpsc::Receiver<CommandRequest>,
    event_rx: mpsc::Receiver<Result<Frame, EngineError>>,
    stream_rx: mpsc::Receiver<Result<Frame, EngineError>>,
    event_writer: OwnedWriteHalf,
    in_flight: Option<InFlight>,
}

impl EngineClient {
    /// Establish both channels, spawn the client task, and wait for the
    /// first stream broadcast.
    ///
    /// A successful return means live data is flowing; the returned link's
    /// handle can serve snapshots immediately after the corresponding
    /// broadcast kind has arrived.
    pub async fn connect(config: EngineConfig) -> Result<EngineLink, EngineError> {
        let channels = EngineChannels::connect(&config).await?;
        let cancel = CancellationToken::new();

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (update_tx, update_rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let state = Arc::new(RwLock::new(LinkState::default()));

        let event_rx =
            transport::spawn_frame_reader(channels.event_reader, "event", cancel.child_token());
        let stream_rx =
            transport::spawn_frame_reader(channels.stream_reader, "stream", cancel.child_token());

        let handle = EngineHandle {
            state: Arc::clone(&state),
            cmd_tx,
            update_rx,
            command_timeout: config.command_timeout,
        };

        let client = EngineClient {
            config: config.clone(),
            state,
            update_tx,
            cmd_rx,
            event_rx,
            stream_rx,
            event_writer: channels.event_writer,
            in_flight: None,
        };

        // Subscribe before the task starts so the first broadcast cannot
        // slip past unobserved.
        let mut updates = handle.subscribe();
        let task = tokio::spawn(client.run(cancel.clone()));

        let first = tokio::time::timeout(config.connect_timeout, async {
            loop {
                match updates.recv().await {
                    Ok(LinkUpdate::AircraftData | LinkUpdate::SimulationData) => break Ok(()),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break Err(()),
                }
            }
        })
        .await;

        match first {
            Ok(Ok(())) => Ok(EngineLink {
                handle,
                cancel,
                task,
            }),
            // Task already failed; surface its terminal error.
            Ok(Err(())) => {
                cancel.cancel();
                match task.await {
                    Ok(Err(run_error)) => Err(run_error),
                    _ => Err(EngineError::LinkClosed),
                }
            }
            Err(_) => {
                cancel.cancel();
                let _ = task.await;
                Err(EngineError::ConnectTimeout(config.connect_timeout))
            }
        }
    }

    async fn run(mut self, cancel: CancellationToken) -> Result<(), EngineError> {
        tracing::info!(host = %self.config.host, "engine client task starting");

        let result = self.run_inner(&cancel).await;
        if let Err(error) = &result {
            tracing::error!(%error, "engine client task failed");
        }
        self.fail_pending();

        tracing::debug!("engine client task stopped");
        result
    }

    async fn run_inner(&mut self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let mut tick = tokio::time::interval(self.config.tick_interval);
        // Don't let missed ticks pile up
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            // A new command is accepted only once the previous one resolved.
            let idle = self.in_flight.is_none();

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!("engine client task shutting down");
                    return Ok(());
                }

                received = self.stream_rx.recv() => {
                    match received {
                        Some(Ok(frame)) => self.handle_stream_frame(frame),
                        Some(Err(error)) => return Err(error),
                        None => return Ok(()),
                    }
                }

                received = self.event_rx.recv() => {
                    match received {
                        Some(Ok(frame)) => self.handle_event_frame(frame),
                        Some(Err(error)) => return Err(error),
                        None => return Ok(()),
                    }
                }

                request = self.cmd_rx.recv(), if idle => {
                    match request {
                        Some(request) => self.begin_command(request).await?,
                        // All handles dropped: nothing left to serve.
                        None => return Ok(()),
                    }
                }

                _ = tick.tick() => {
                    self.resolve_expired_command();
                    self.check_staleness()?;
                }
            }
        }
    }

    async fn begin_command(&mut self, request: CommandRequest) -> Result<(), EngineError> {
        tracing::debug!(command = %request.line, "sending command");

        let frame = Frame::tagged(events::TOPIC_COMMAND.as_bytes(), request.line.into_bytes());
        if let Err(error) = transport::write_frame(&mut self.event_writer, &frame).await {
            let _ = request.done.send(Err(EngineError::LinkClosed));
            return Err(error);
        }

        self.in_flight = Some(InFlight {
            expects_reply: request.expects_reply,
            deadline: Instant::now() + self.config.echo_window,
            lines: Vec::new(),
            done: request.done,
        });
        Ok(())
    }

    fn handle_event_frame(&mut self, frame: Frame) {
        let event = match EngineEvent::decode(&frame) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(%error, "dropping undecodable event frame");
                return;
            }
        };

        match event {
            EngineEvent::Nodes(nodes) => {
                tracing::debug!(count = nodes.len(), "node list updated");
                self.state.write().unwrap().nodes = nodes;
            }
            EngineEvent::Echo(lines) => self.collect_echo(lines),
            EngineEvent::ResetConfirmed => {
                self.state.write().unwrap().reset_confirmed = true;
                let _ = self.update_tx.send(LinkUpdate::ResetConfirmed);
            }
            EngineEvent::ScenarioStored(stored) => {
                self.state.write().unwrap().scenario_stored = Some(stored);
                let _ = self.update_tx.send(LinkUpdate::ScenarioStored);
            }
            EngineEvent::ShutdownConfirmed => {
                self.state.write().unwrap().shutdown_confirmed = true;
                let _ = self.update_tx.send(LinkUpdate::ShutdownConfirmed);
            }
            EngineEvent::Unrecognized(topic) => {
                tracing::debug!(topic, "ignoring unrecognized event");
            }
        }
    }

    fn collect_echo(&mut self, lines: Vec<String>) {
        let Some(pending) = &mut self.in_flight else {
            for line in lines {
                tracing::debug!(%line, "unsolicited echo");
            }
            return;
        };

        for line in lines {
            if !pending.expects_reply && events::is_benign_echo(&line) {
                tracing::debug!(%line, "benign echo");
                continue;
            }
            pending.lines.push(line);
        }
    }

    fn handle_stream_frame(&mut self, frame: Frame) {
        match StreamEvent::decode(&frame) {
            Ok(StreamEvent::Aircraft(broadcast)) => match broadcast.rows() {
                Ok(rows) => {
                    let table = rows
                        .into_iter()
                        .map(|row| (Callsign::new(&row.callsign), row))
                        .collect();
                    {
                        let mut state = self.state.write().unwrap();
                        state.aircraft = Some(table);
                        state.last_broadcast = Some(Instant::now());
                    }
                    let _ = self.update_tx.send(LinkUpdate::AircraftData);
                }
                Err(error) => tracing::warn!(%error, "dropping malformed aircraft broadcast"),
            },
            Ok(StreamEvent::Simulation(broadcast)) => match RawSimulation::try_from(&broadcast) {
                Ok(raw) => {
                    {
                        let mut state = self.state.write().unwrap();
                        state.simulation = Some(raw);
                        state.last_broadcast = Some(Instant::now());
                    }
                    let _ = self.update_tx.send(LinkUpdate::SimulationData);
                }
                Err(error) => tracing::warn!(%error, "dropping malformed simulation broadcast"),
            },
            Ok(StreamEvent::Unrecognized(topic)) => {
                tracing::debug!(topic, "ignoring unrecognized stream frame");
            }
            Err(error) => tracing::warn!(%error, "dropping undecodable stream frame"),
        }
    }

    fn resolve_expired_command(&mut self) {
        let due = self
            .in_flight
            .as_ref()
            .is_some_and(|pending| Instant::now() >= pending.deadline);
        if !due {
            return;
        }

        if let Some(pending) = self.in_flight.take() {
            let _ = pending
                .done
                .send(resolve_echo(pending.expects_reply, pending.lines));
        }
    }

    /// Broadcast silence past the threshold is the only connection-loss
    /// signal; the engine never announces a disconnect.
    fn check_staleness(&mut self) -> Result<(), EngineError> {
        let last = self.state.read().unwrap().last_broadcast;
        if let Some(last) = last {
            let stale_for = last.elapsed();
            if stale_for > self.config.staleness_threshold {
                tracing::warn!(?stale_for, "broadcast stream went silent");
                return Err(EngineError::ConnectionLost { stale_for });
            }
        }
        Ok(())
    }

    /// Fail the in-flight command and everything still queued.
    fn fail_pending(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            let _ = pending.done.send(Err(EngineError::LinkClosed));
        }
        self.cmd_rx.close();
        while let Ok(request) = self.cmd_rx.try_recv() {
            let _ = request.done.send(Err(EngineError::LinkClosed));
        }
    }
}

/// Cheap cloneable handle to a running engine link.
pub struct EngineHandle {
    state: Arc<RwLock<LinkState>>,
    cmd_tx: mpsc::Sender<CommandRequest>,
    update_rx: broadcast::Receiver<LinkUpdate>,
    command_timeout: Duration,
}

impl Clone for EngineHandle {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            cmd_tx: self.cmd_tx.clone(),
            update_rx: self.update_rx.resubscribe(),
            command_timeout: self.command_timeout,
        }
    }
}

impl EngineHandle {
    /// Queue a command expected to pass silently; any non-benign echo is a
    /// rejection.
    pub async fn send_expect_silence(&self, line: impl Into<String>) -> Result<(), EngineError> {
        self.send(line.into(), false).await.map(|_| ())
    }

    /// Queue a command whose echo lines are its reply.
    pub async fn send_expect_reply(
        &self,
        line: impl Into<String>,
    ) -> Result<Vec<String>, EngineError> {
        self.send(line.into(), true).await
    }

    async fn send(&self, line: String, expects_reply: bool) -> Result<Vec<String>, EngineError> {
        let (done_tx, done_rx) = oneshot::channel();
        let request = CommandRequest {
            line,
            expects_reply,
            done: done_tx,
        };
        self.cmd_tx
            .send(request)
            .await
            .map_err(|_| EngineError::LinkClosed)?;
        done_rx.await.map_err(|_| EngineError::LinkClosed)?
    }

    /// Current raw aircraft table, keyed by callsign.
    pub fn aircraft_table(&self) -> Result<HashMap<Callsign, RawAircraft>, EngineError> {
        self.state
            .read()
            .unwrap()
            .aircraft
            .clone()
            .ok_or(EngineError::NoData)
    }

    /// Current raw simulation state.
    pub fn simulation(&self) -> Result<RawSimulation, EngineError> {
        self.state
            .read()
            .unwrap()
            .simulation
            .clone()
            .ok_or(EngineError::NoData)
    }

    /// Compute nodes last reported by the engine.
    pub fn nodes(&self) -> Vec<String> {
        self.state.read().unwrap().nodes.clone()
    }

    /// Whether the client task is still serving this handle.
    pub fn is_live(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    /// Subscribe to link update notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkUpdate> {
        self.update_rx.resubscribe()
    }

    pub fn clear_reset_confirmed(&self) {
        self.state.write().unwrap().reset_confirmed = false;
    }

    pub fn clear_scenario_stored(&self) {
        self.state.write().unwrap().scenario_stored = None;
    }

    pub fn clear_shutdown_confirmed(&self) {
        self.state.write().unwrap().shutdown_confirmed = false;
    }

    /// Wait until the elapsed scenario time strictly exceeds `after_sec`.
    ///
    /// The echo of a step command proves nothing; only an advanced broadcast
    /// does.
    pub async fn wait_elapsed_beyond(&self, after_sec: f64) -> Result<(), EngineError> {
        self.wait_until(|state| {
            let advanced = state
                .simulation
                .as_ref()
                .is_some_and(|sim| sim.elapsed_sec > after_sec);
            advanced.then_some(())
        })
        .await
    }

    /// Wait for (and consume) the reset confirmation flag.
    pub async fn wait_reset_confirmed(&self) -> Result<(), EngineError> {
        self.wait_until(|state| {
            if state.reset_confirmed {
                state.reset_confirmed = false;
                Some(())
            } else {
                None
            }
        })
        .await
    }

    /// Wait for (and consume) the scenario-stored result.
    pub async fn wait_scenario_stored(
        &self,
    ) -> Result<crate::protocol::ScenarioStored, EngineError> {
        self.wait_until(|state| state.scenario_stored.take()).await
    }

    /// Wait for (and consume) the shutdown confirmation flag.
    pub async fn wait_shutdown_confirmed(&self) -> Result<(), EngineError> {
        self.wait_until(|state| {
            if state.shutdown_confirmed {
                state.shutdown_confirmed = false;
                Some(())
            } else {
                None
            }
        })
        .await
    }

    /// Re-check `condition` on every link update until it yields a value,
    /// the command timeout passes, or the link closes.
    async fn wait_until<T>(
        &self,
        mut condition: impl FnMut(&mut LinkState) -> Option<T>,
    ) -> Result<T, EngineError> {
        let mut updates = self.subscribe();
        let deadline = tokio::time::Instant::now() + self.command_timeout;

        loop {
            // Never hold the lock across an await.
            let found = {
                let mut state = self.state.write().unwrap();
                condition(&mut state)
            };
            if let Some(value) = found {
                return Ok(value);
            }

            match tokio::time::timeout_at(deadline, updates.recv()).await {
                Ok(Ok(_)) => {}
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "update stream lagged");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(EngineError::LinkClosed)
                }
                Err(_) => return Err(EngineError::CommandTimeout(self.command_timeout)),
            }
        }
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
