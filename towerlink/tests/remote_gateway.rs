//! Integration tests for the remote engine path.
//!
//! A fake engine speaks the real wire protocol over two TCP channels on
//! ephemeral ports: periodic aircraft and simulation broadcasts on the
//! stream channel, and command handling on the event channel with the
//! engine's acknowledgement discipline (silence for accepted commands,
//! echo lines for complaints, confirmation events for reset, scenario
//! storage, and shutdown). The tests drive the stack at two levels, the
//! protocol client directly and the full gateway facade, and verify the
//! behaviors only a live link exhibits: first-broadcast gating, echo
//! attribution, staleness detection, and creation-visibility polling.
//!
//! Run with: `cargo test --test remote_gateway`

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use towerlink::catalog::{scenario_from_json, DefinitionStore, ScenarioDefinition, SectorDefinition};
use towerlink::control::BackendKind;
use towerlink::coordinator::{ModeError, OperatingMode};
use towerlink::engine::events::{
    TOPIC_AIRCRAFT_DATA, TOPIC_ECHO, TOPIC_NODES, TOPIC_RESET_CONFIRMED, TOPIC_SCENARIO_STORED,
    TOPIC_SHUTDOWN_CONFIRMED, TOPIC_SIMULATION_DATA,
};
use towerlink::engine::transport::{read_frame, write_frame};
use towerlink::engine::{EngineClient, EngineConfig, EngineError};
use towerlink::gateway::{Gateway, GatewayConfig, GatewayError};
use towerlink::model::{AircraftSpawn, Callsign, Position, Route, RouteLeg, RunState, Waypoint};
use towerlink::protocol::payload::{self, AircraftBroadcast, ScenarioStored, SimulationBroadcast};
use towerlink::protocol::{Frame, RawAircraft};
use towerlink::proxy::{ProxyConfig, ProxyError};

// ============================================================================
// Fake engine
// ============================================================================

/// Cadence of the fake engine's state broadcasts.
const BROADCAST_INTERVAL: Duration = Duration::from_millis(20);

/// Mutable world state behind the fake engine, shared by both channel tasks.
struct FakeState {
    rows: Vec<RawAircraft>,
    /// Created aircraft held back for N more broadcasts before appearing.
    pending: Vec<(RawAircraft, u32)>,
    elapsed_sec: f64,
    step_size_sec: f64,
    run_state: RunState,
    scenario_name: String,
    nodes: Vec<String>,
    scenarios: HashMap<String, ScenarioDefinition>,
    waypoints: HashSet<String>,
    /// Every command line received, in order.
    commands: Vec<String>,
    /// Stop broadcasting; the event channel stays responsive.
    silent: bool,
    /// Acknowledge creations with informational echo lines.
    chatty: bool,
    /// Accept STEP but never advance the clock.
    freeze_clock: bool,
    /// Broadcasts a freshly created aircraft must wait out before showing.
    create_delay_broadcasts: u32,
    /// Accept CRE silently but never materialize the aircraft.
    drop_creates: bool,
    /// Refuse every scenario upload.
    reject_uploads: bool,
    quit: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            pending: Vec::new(),
            elapsed_sec: 0.0,
            step_size_sec: 0.5,
            run_state: RunState::Running,
            scenario_name: String::new(),
            nodes: vec!["sim-alpha".to_string(), "sim-beta".to_string()],
            scenarios: HashMap::new(),
            waypoints: HashSet::new(),
            commands: Vec::new(),
            silent: false,
            chatty: false,
            freeze_clock: false,
            create_delay_broadcasts: 0,
            drop_creates: false,
            reject_uploads: false,
            quit: false,
        }
    }
}

impl FakeState {
    fn admit(&mut self, row: RawAircraft) {
        if self.create_delay_broadcasts > 0 {
            self.pending.push((row, self.create_delay_broadcasts));
        } else {
            self.rows.push(row);
        }
    }

    fn mature_pending(&mut self) {
        let mut index = 0;
        while index < self.pending.len() {
            self.pending[index].1 -= 1;
            if self.pending[index].1 == 0 {
                let (row, _) = self.pending.remove(index);
                self.rows.push(row);
            } else {
                index += 1;
            }
        }
    }

    fn knows(&self, callsign: &str) -> bool {
        self.rows.iter().any(|row| row.callsign == callsign)
    }

    /// Apply one command line and return the event frames to send back.
    fn apply_command(&mut self, line: &str) -> Vec<Frame> {
        self.commands.push(line.to_string());
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default();

        match verb {
            "CRE" => {
                let fields: Vec<&str> = parts.collect();
                if fields.len() < 7 {
                    return vec![echo("Syntax error: CRE")];
                }
                if !self.drop_creates {
                    self.admit(RawAircraft {
                        callsign: fields[0].to_string(),
                        aircraft_type: fields[1].to_string(),
                        position: Position::new(
                            fields[2].parse().unwrap_or(0.0),
                            fields[3].parse().unwrap_or(0.0),
                        ),
                        heading_deg: fields[4].parse().unwrap_or(0.0),
                        altitude_ft: flight_level_feet(fields[5]),
                        ground_speed_kt: fields[6].parse().unwrap_or(0.0),
                        vertical_speed_fpm: 0.0,
                    });
                }
                if self.chatty {
                    vec![echo(&format!(
                        "OK created {}\nINFO: total aircraft {}",
                        fields[0],
                        self.rows.len() + self.pending.len()
                    ))]
                } else {
                    Vec::new()
                }
            }
            "DEL" => {
                let callsign = parts.next().unwrap_or_default();
                if self.knows(callsign) {
                    self.rows.retain(|row| row.callsign != callsign);
                    Vec::new()
                } else {
                    vec![echo(&format!("unknown callsign {callsign}"))]
                }
            }
            "HDG" | "ALT" | "SPD" | "VS" | "DCT" | "ADDWPT" => {
                let callsign = parts.next().unwrap_or_default();
                if self.knows(callsign) {
                    Vec::new()
                } else {
                    vec![echo(&format!("unknown callsign {callsign}\nuse CRE first"))]
                }
            }
            "LISTRTE" => vec![echo("LEG 1: SUGOL\nLEG 2: RIVER")],
            "DEFWPT" => {
                let name = parts.next().unwrap_or_default().to_string();
                if self.waypoints.insert(name.clone()) {
                    Vec::new()
                } else {
                    vec![echo(&format!("waypoint {name} already defined"))]
                }
            }
            "DT" => {
                if let Some(seconds) = parts.next().and_then(|v| v.parse().ok()) {
                    self.step_size_sec = seconds;
                }
                Vec::new()
            }
            "DTMULT" | "SEED" => Vec::new(),
            "HOLD" => {
                self.run_state = RunState::Hold;
                Vec::new()
            }
            "OP" => {
                self.run_state = RunState::Running;
                Vec::new()
            }
            "STEP" => {
                if !self.freeze_clock {
                    self.elapsed_sec += self.step_size_sec;
                }
                Vec::new()
            }
            "RESET" => {
                self.rows.clear();
                self.pending.clear();
                self.elapsed_sec = 0.0;
                self.scenario_name.clear();
                self.run_state = RunState::Init;
                vec![Frame::tag_only(TOPIC_RESET_CONFIRMED.as_bytes())]
            }
            "SCEN" => {
                let mut pieces = line.splitn(3, ' ');
                pieces.next();
                let name = pieces.next().unwrap_or_default().to_string();
                let json = pieces.next().unwrap_or_default();
                let stored = if self.reject_uploads {
                    ScenarioStored {
                        accepted: false,
                        detail: format!("scenario {name} rejected by policy"),
                    }
                } else {
                    match scenario_from_json(json) {
                        Ok(definition) => {
                            self.scenarios.insert(name.clone(), definition);
                            ScenarioStored {
                                accepted: true,
                                detail: format!("stored {name}"),
                            }
                        }
                        Err(error) => ScenarioStored {
                            accepted: false,
                            detail: error.to_string(),
                        },
                    }
                };
                let body = payload::encode(&stored).expect("encode scenario result");
                vec![Frame::tagged(TOPIC_SCENARIO_STORED.as_bytes(), body)]
            }
            "IC" => {
                let name = parts.next().unwrap_or_default();
                match self.scenarios.get(name).cloned() {
                    Some(definition) => {
                        self.rows.clear();
                        self.pending.clear();
                        self.elapsed_sec = 0.0;
                        self.scenario_name = name.to_string();
                        self.run_state = RunState::Running;
                        for spawn in &definition.spawns {
                            self.admit(row_from_spawn(spawn));
                        }
                        vec![Frame::tag_only(TOPIC_RESET_CONFIRMED.as_bytes())]
                    }
                    None => vec![echo(&format!("no stored scenario {name}"))],
                }
            }
            "QUIT" => {
                self.quit = true;
                vec![Frame::tag_only(TOPIC_SHUTDOWN_CONFIRMED.as_bytes())]
            }
            other => vec![echo(&format!("unknown command: {other}"))],
        }
    }
}

fn echo(text: &str) -> Frame {
    Frame::tagged(TOPIC_ECHO.as_bytes(), text.as_bytes().to_vec())
}

/// Parse a `FLxxx` argument back into feet.
fn flight_level_feet(text: &str) -> f64 {
    text.strip_prefix("FL")
        .and_then(|digits| digits.parse::<f64>().ok())
        .map(|level| level * 100.0)
        .unwrap_or(0.0)
}

fn row_from_spawn(spawn: &AircraftSpawn) -> RawAircraft {
    RawAircraft {
        callsign: spawn.callsign.as_str().to_string(),
        position: spawn.position,
        altitude_ft: spawn.altitude_ft,
        ground_speed_kt: spawn.ground_speed_kt,
        heading_deg: spawn.heading_deg,
        vertical_speed_fpm: 0.0,
        aircraft_type: spawn.aircraft_type.clone(),
    }
}

/// A fake engine listening on two ephemeral ports.
struct FakeEngine {
    event_port: u16,
    stream_port: u16,
    state: Arc<Mutex<FakeState>>,
    _tasks: Vec<JoinHandle<()>>,
}

impl FakeEngine {
    async fn start(state: FakeState) -> FakeEngine {
        let event_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind event");
        let stream_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stream");
        let event_port = event_listener.local_addr().expect("event addr").port();
        let stream_port = stream_listener.local_addr().expect("stream addr").port();
        let state = Arc::new(Mutex::new(state));

        let event_state = Arc::clone(&state);
        let event_task = tokio::spawn(async move {
            if let Ok((socket, _)) = event_listener.accept().await {
                serve_events(socket, event_state).await;
            }
        });

        let stream_state = Arc::clone(&state);
        let stream_task = tokio::spawn(async move {
            if let Ok((socket, _)) = stream_listener.accept().await {
                serve_stream(socket, stream_state).await;
            }
        });

        FakeEngine {
            event_port,
            stream_port,
            state,
            _tasks: vec![event_task, stream_task],
        }
    }

    /// Client configuration pointed at this fake, with test-fast timings.
    fn config(&self) -> EngineConfig {
        EngineConfig {
            host: "127.0.0.1".to_string(),
            event_port: self.event_port,
            stream_port: self.stream_port,
            connect_timeout: Duration::from_secs(2),
            tick_interval: Duration::from_millis(5),
            echo_window: Duration::from_millis(40),
            command_timeout: Duration::from_millis(600),
            staleness_threshold: Duration::from_millis(400),
        }
    }

    fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    fn set_silent(&self, silent: bool) {
        self.state.lock().unwrap().silent = silent;
    }
}

/// Event channel: greet with the node list, then answer command frames.
async fn serve_events(socket: TcpStream, state: Arc<Mutex<FakeState>>) {
    let (mut reader, mut writer) = socket.into_split();

    let nodes = state.lock().unwrap().nodes.clone();
    let body = payload::encode(&nodes).expect("encode nodes");
    let greeting = Frame::tagged(TOPIC_NODES.as_bytes(), body);
    if write_frame(&mut writer, &greeting).await.is_err() {
        return;
    }

    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(_) => return,
        };
        let line = String::from_utf8_lossy(frame.payload().unwrap_or_default()).to_string();
        let replies = state.lock().unwrap().apply_command(&line);
        for reply in replies {
            if write_frame(&mut writer, &reply).await.is_err() {
                return;
            }
        }
        if state.lock().unwrap().quit {
            return;
        }
    }
}

/// Stream channel: broadcast the aircraft table and simulation tuple on a
/// fixed cadence until told to quit.
async fn serve_stream(mut socket: TcpStream, state: Arc<Mutex<FakeState>>) {
    let mut ticker = tokio::time::interval(BROADCAST_INTERVAL);
    loop {
        ticker.tick().await;
        let frames = {
            let mut state = state.lock().unwrap();
            if state.quit {
                return;
            }
            if state.silent {
                None
            } else {
                state.mature_pending();
                let aircraft = AircraftBroadcast::from_rows(state.rows.iter());
                let simulation = SimulationBroadcast::new(
                    1.0,
                    state.step_size_sec,
                    state.elapsed_sec,
                    "10:00:00".to_string(),
                    state.rows.len() as u32,
                    state.run_state,
                    state.scenario_name.clone(),
                );
                Some(vec![
                    Frame::tagged(
                        TOPIC_AIRCRAFT_DATA.as_bytes(),
                        payload::encode(&aircraft).expect("encode aircraft"),
                    ),
                    Frame::tagged(
                        TOPIC_SIMULATION_DATA.as_bytes(),
                        payload::encode(&simulation).expect("encode simulation"),
                    ),
                ])
            }
        };
        let Some(frames) = frames else { continue };
        for frame in frames {
            if write_frame(&mut socket, &frame).await.is_err() {
                return;
            }
        }
    }
}

// ============================================================================
// Test helpers
// ============================================================================

async fn start_engine() -> FakeEngine {
    FakeEngine::start(FakeState::default()).await
}

async fn connect_gateway(fake: &FakeEngine) -> Gateway {
    let config = GatewayConfig::default()
        .with_backend(BackendKind::Remote)
        .with_engine(fake.config())
        .with_proxy(
            ProxyConfig::default()
                .with_create_poll_attempts(10)
                .with_create_poll_interval(Duration::from_millis(25)),
        );
    Gateway::connect(config).await.expect("gateway connect")
}

fn spawn(callsign: &str) -> AircraftSpawn {
    AircraftSpawn::new(
        callsign,
        "B738",
        Position::new(52.3, 4.76),
        270.0,
        12_000.0,
        250.0,
    )
}

fn sector() -> SectorDefinition {
    SectorDefinition {
        name: "EHAA".to_string(),
        waypoints: vec![
            Waypoint::new("SUGOL", Position::new(52.5, 4.0)),
            Waypoint::new("RIVER", Position::new(52.2, 4.5)),
        ],
        routes: vec![Route::new(
            "ARTIP2A",
            vec![RouteLeg::new("SUGOL"), RouteLeg::new("RIVER")],
        )],
    }
}

fn scenario() -> ScenarioDefinition {
    ScenarioDefinition {
        name: "alpha".to_string(),
        seed: Some(7),
        sector: Some("EHAA".to_string()),
        spawns: vec![spawn("KL204")
            .with_route("ARTIP2A")
            .with_flight_levels(Some(120), Some(240))],
    }
}

// ============================================================================
// Client-level tests
// ============================================================================

/// Connecting succeeds once the first broadcast arrives, and the snapshots
/// and node list reflect what the engine sent.
#[tokio::test]
async fn test_connect_sees_first_broadcast_and_nodes() {
    let fake = start_engine().await;
    let link = EngineClient::connect(fake.config()).await.expect("connect");
    let handle = link.handle();

    // A few broadcast cycles so both payload kinds and the node greeting
    // have been processed.
    tokio::time::sleep(BROADCAST_INTERVAL * 3).await;

    let simulation = handle.simulation().expect("simulation snapshot");
    assert_eq!(simulation.state, RunState::Running);
    assert_eq!(simulation.utc, "10:00:00");
    assert_eq!(simulation.step_size_sec, 0.5);
    assert_eq!(simulation.aircraft_count, 0);

    assert!(handle.aircraft_table().expect("aircraft table").is_empty());
    assert_eq!(
        handle.nodes(),
        vec!["sim-alpha".to_string(), "sim-beta".to_string()]
    );
    assert!(link.is_running());

    link.shutdown().await.expect("shutdown");
}

/// An engine that accepts connections but never broadcasts is not usable;
/// connect gives up after the configured bound.
#[tokio::test]
async fn test_connect_times_out_when_engine_never_broadcasts() {
    let mut state = FakeState::default();
    state.silent = true;
    let fake = FakeEngine::start(state).await;

    let mut config = fake.config();
    config.connect_timeout = Duration::from_millis(300);

    let started = Instant::now();
    let result = EngineClient::connect(config).await;

    assert!(matches!(result, Err(EngineError::ConnectTimeout(_))));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(2));
}

/// Nothing listening on the ports surfaces as a transport error, not a
/// timeout.
#[tokio::test]
async fn test_connect_fails_fast_when_nothing_listens() {
    let event = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let stream = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let event_port = event.local_addr().expect("addr").port();
    let stream_port = stream.local_addr().expect("addr").port();
    drop((event, stream));

    let config = EngineConfig::default()
        .with_ports(event_port, stream_port)
        .with_connect_timeout(Duration::from_secs(1));
    let result = EngineClient::connect(config).await;

    assert!(matches!(result, Err(EngineError::Io(_))));
}

/// Echo answering a silence-expected command is a rejection, and the text
/// reaches the caller verbatim, line breaks included.
#[tokio::test]
async fn test_rejection_echo_preserved_verbatim() {
    let fake = start_engine().await;
    let link = EngineClient::connect(fake.config()).await.expect("connect");
    let handle = link.handle();

    let result = handle.send_expect_silence("HDG KL999 90").await;

    match result {
        Err(EngineError::Rejected(text)) => {
            assert_eq!(text, "unknown callsign KL999\nuse CRE first");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    link.shutdown().await.expect("shutdown");
}

/// Informational chatter ("OK ...", "INFO: ...") does not fail a
/// silence-expected command.
#[tokio::test]
async fn test_benign_chatter_does_not_fail_silence_commands() {
    let mut state = FakeState::default();
    state.chatty = true;
    let fake = FakeEngine::start(state).await;
    let link = EngineClient::connect(fake.config()).await.expect("connect");

    link.handle()
        .send_expect_silence("CRE KL204 B738 52.3 4.76 270 FL120 250")
        .await
        .expect("chatty creation still succeeds");

    link.shutdown().await.expect("shutdown");
}

/// A reply-expected command collects its echo lines as the answer.
#[tokio::test]
async fn test_reply_expected_command_collects_echo_lines() {
    let fake = start_engine().await;
    let link = EngineClient::connect(fake.config()).await.expect("connect");

    let lines = link
        .handle()
        .send_expect_reply("LISTRTE KL204")
        .await
        .expect("route listing");

    assert_eq!(
        lines,
        vec!["LEG 1: SUGOL".to_string(), "LEG 2: RIVER".to_string()]
    );

    link.shutdown().await.expect("shutdown");
}

/// When the broadcast stream goes silent past the staleness threshold the
/// client task fails, pending callers fail fast, and the terminal error
/// names how long the stream was stale.
#[tokio::test]
async fn test_broadcast_silence_fails_the_link() {
    let fake = start_engine().await;
    let link = EngineClient::connect(fake.config()).await.expect("connect");
    let handle = link.handle();

    fake.set_silent(true);
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(!link.is_running());
    assert!(!handle.is_live());
    assert!(matches!(
        handle.send_expect_silence("HOLD").await,
        Err(EngineError::LinkClosed)
    ));

    match link.shutdown().await {
        Err(EngineError::ConnectionLost { stale_for }) => {
            assert!(stale_for >= Duration::from_millis(400), "stale for {stale_for:?}");
        }
        other => panic!("expected connection-lost, got {other:?}"),
    }
}

// ============================================================================
// Gateway-level tests
// ============================================================================

/// Creation polls the broadcast table until the new aircraft shows up,
/// then seeds the proxy-tracked fields from the request.
#[tokio::test]
async fn test_gateway_create_waits_out_broadcast_lag() {
    let mut state = FakeState::default();
    state.create_delay_broadcasts = 3;
    let fake = FakeEngine::start(state).await;
    let gateway = connect_gateway(&fake).await;

    let request = spawn("KL204").with_flight_levels(Some(180), Some(320));
    gateway.aircraft().create(&request).await.expect("create");

    let entry = gateway
        .aircraft()
        .properties(&Callsign::new("KL204"))
        .await
        .expect("properties");
    assert_eq!(entry.aircraft_type, "B738");
    assert_eq!(entry.cleared_flight_level, Some(180));
    assert_eq!(entry.requested_flight_level, Some(320));

    assert!(fake
        .commands()
        .iter()
        .any(|command| command.starts_with("CRE KL204 ")));
}

/// An engine that swallows the creation silently is caught by the
/// visibility poll, not trusted on its acknowledgement.
#[tokio::test]
async fn test_gateway_create_times_out_when_engine_drops_it() {
    let mut state = FakeState::default();
    state.drop_creates = true;
    let fake = FakeEngine::start(state).await;

    let config = GatewayConfig::default()
        .with_backend(BackendKind::Remote)
        .with_engine(fake.config())
        .with_proxy(
            ProxyConfig::default()
                .with_create_poll_attempts(3)
                .with_create_poll_interval(Duration::from_millis(20)),
        );
    let gateway = Gateway::connect(config).await.expect("gateway connect");

    let result = gateway.aircraft().create(&spawn("GHOST1")).await;

    match result {
        Err(ProxyError::CreationNotVisible { callsign, waited }) => {
            assert_eq!(callsign, Callsign::new("GHOST1"));
            assert_eq!(waited, Duration::from_millis(60));
        }
        other => panic!("expected creation-not-visible, got {other:?}"),
    }
    // The command did reach the engine; the aircraft just never appeared.
    assert!(fake
        .commands()
        .iter()
        .any(|command| command.starts_with("CRE GHOST1 ")));
}

/// Full scenario load over the wire: upload, initialize, seed, sector
/// waypoints pushed (duplicates tolerated), spawn list primed.
#[tokio::test]
async fn test_gateway_scenario_load_end_to_end() {
    let mut state = FakeState::default();
    // The engine already knows SUGOL from its own data; the duplicate
    // definition must be tolerated.
    state.waypoints.insert("SUGOL".to_string());
    let fake = FakeEngine::start(state).await;
    let gateway = connect_gateway(&fake).await;

    gateway
        .simulation()
        .store()
        .store_sector(sector())
        .await
        .expect("store sector");

    let definition = gateway
        .load_scenario("alpha", Some(scenario()))
        .await
        .expect("scenario load");
    assert_eq!(definition.spawns.len(), 1);

    let entry = gateway
        .aircraft()
        .properties(&Callsign::new("KL204"))
        .await
        .expect("scenario aircraft");
    assert_eq!(entry.route_name.as_deref(), Some("ARTIP2A"));
    assert_eq!(entry.cleared_flight_level, Some(120));

    let props = gateway.simulation().properties().await.expect("properties");
    assert_eq!(props.scenario_name.as_deref(), Some("alpha"));
    assert_eq!(props.sector_name.as_deref(), Some("EHAA"));
    assert_eq!(props.seed, Some(7));
    assert_eq!(props.state, RunState::Running);

    // Upload before initialization, seed only after; waypoints defined for
    // the whole sector.
    let commands = fake.commands();
    let upload = commands
        .iter()
        .position(|c| c.starts_with("SCEN alpha "))
        .expect("SCEN sent");
    let init = commands
        .iter()
        .position(|c| c == "IC alpha")
        .expect("IC sent");
    let seed = commands
        .iter()
        .position(|c| c == "SEED 7")
        .expect("SEED sent");
    assert!(upload < init && init < seed, "command order: {commands:?}");
    let defined = commands
        .iter()
        .filter(|c| c.starts_with("DEFWPT "))
        .count();
    assert_eq!(defined, 2);

    assert_eq!(
        gateway.nodes(),
        vec!["sim-alpha".to_string(), "sim-beta".to_string()]
    );

    // On-route direct-to passes validation and reaches the engine.
    gateway
        .aircraft()
        .direct_to(&Callsign::new("KL204"), "RIVER")
        .await
        .expect("direct to");
    assert!(fake.commands().iter().any(|c| c == "DCT KL204 RIVER"));
}

/// A refused upload surfaces the engine's detail and aborts the load
/// before any initialization command is sent.
#[tokio::test]
async fn test_gateway_scenario_upload_rejection_surfaces_detail() {
    let mut state = FakeState::default();
    state.reject_uploads = true;
    let fake = FakeEngine::start(state).await;
    let gateway = connect_gateway(&fake).await;

    let result = gateway.load_scenario("alpha", Some(scenario())).await;

    match result {
        Err(GatewayError::Proxy(ProxyError::Engine(EngineError::Rejected(detail)))) => {
            assert!(detail.contains("rejected by policy"), "detail: {detail}");
        }
        other => panic!("expected upload rejection, got {other:?}"),
    }
    let commands = fake.commands();
    assert!(commands.iter().any(|c| c.starts_with("SCEN alpha ")));
    assert!(!commands.iter().any(|c| c.starts_with("IC ")));
}

/// Stepped mode over the wire: hold the clock, step twice, watch the
/// broadcast elapsed time advance by exactly two steps, then resume.
#[tokio::test]
async fn test_gateway_stepped_cycle_advances_engine_clock() {
    let fake = start_engine().await;
    let gateway = connect_gateway(&fake).await;

    gateway
        .coordinator()
        .set_mode(OperatingMode::Stepped)
        .await
        .expect("stepped mode");
    let props = gateway.simulation().properties().await.expect("properties");
    assert_eq!(props.state, RunState::Hold);

    gateway.coordinator().step().await.expect("first step");
    gateway.coordinator().step().await.expect("second step");

    let props = gateway.simulation().properties().await.expect("properties");
    assert!(
        (props.elapsed_sec - 1.0).abs() < 1e-9,
        "elapsed after two 0.5 s steps: {}",
        props.elapsed_sec
    );
    assert_eq!(
        fake.commands().iter().filter(|c| *c == "STEP").count(),
        2
    );

    gateway
        .coordinator()
        .set_mode(OperatingMode::Continuous)
        .await
        .expect("continuous mode");
    let props = gateway.simulation().properties().await.expect("properties");
    assert_eq!(props.state, RunState::Running);
}

/// A step whose broadcast clock never advances is a confirmation timeout;
/// the echo acknowledging STEP proves nothing.
#[tokio::test]
async fn test_gateway_step_times_out_when_clock_stalls() {
    let mut state = FakeState::default();
    state.freeze_clock = true;
    let fake = FakeEngine::start(state).await;
    let gateway = connect_gateway(&fake).await;

    gateway
        .coordinator()
        .set_mode(OperatingMode::Stepped)
        .await
        .expect("stepped mode");

    let started = Instant::now();
    let result = gateway.coordinator().step().await;

    match result {
        Err(ModeError::Proxy(ProxyError::Engine(EngineError::CommandTimeout(_)))) => {}
        other => panic!("expected confirmation timeout, got {other:?}"),
    }
    // The full confirmation bound was waited out while broadcasts kept
    // flowing with a frozen clock.
    assert!(started.elapsed() >= Duration::from_millis(500));
}

/// Shutdown sends the quit command and tears the link down cleanly.
#[tokio::test]
async fn test_gateway_shutdown_sends_quit() {
    let fake = start_engine().await;
    let gateway = connect_gateway(&fake).await;

    gateway.shutdown().await.expect("shutdown");

    assert!(fake.commands().iter().any(|c| c == "QUIT"));
}
