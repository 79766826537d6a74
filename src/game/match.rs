//! Match state machine and authoritative tick loop

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::util::time::{tick_duration, unix_millis};
use crate::ws::protocol::{ClientMsg, ServerMsg, Welcome};

use super::combat::CombatSystem;
use super::items::{ItemSystem, ItemType};
use super::obstacles::ObstacleField;
use super::physics::PhysicsSystem;
use super::player::{sanitize_name, InputState, Player};
use super::snapshot::{GameState, SnapshotBuilder};
use super::standings::StandingsTracker;
use super::zone::ZoneController;
use super::{ActionRejected, SessionEvent, SessionEventKind};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Waiting for enough players
    Lobby,
    /// Countdown before start
    Countdown,
    /// Match in progress
    InGame,
    /// Winner screen before returning to the lobby
    GameOver,
}

/// The whole simulation context (owned by the match task)
pub struct MatchState {
    /// Changes every time a round starts, used to correlate logs
    pub round_id: Uuid,
    pub config: Arc<GameConfig>,
    pub phase: MatchPhase,
    /// Seconds left in countdown/game-over. May dip below zero before the transition fires.
    pub phase_timer: f32,
    pub winner_id: Option<Uuid>,
    pub tick: u64,
    pub players: BTreeMap<Uuid, Player>,
    pub inputs: HashMap<Uuid, InputState>,
    pub last_shot_ms: HashMap<Uuid, u64>,
    pub obstacles: ObstacleField,
    pub items: ItemSystem,
    pub combat: CombatSystem,
    pub zone: ZoneController,
    pub standings: StandingsTracker,
    pub rng: ChaCha8Rng,
    /// Kill logs, effects and roster changes waiting to be broadcast
    events: Vec<ServerMsg>,
}

impl MatchState {
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let obstacles = ObstacleField::generate(&mut rng, config.world_width, config.world_height);
        Self::with_obstacles(config, obstacles, rng)
    }

    pub fn with_obstacles(config: Arc<GameConfig>, obstacles: ObstacleField, rng: ChaCha8Rng) -> Self {
        Self {
            round_id: Uuid::new_v4(),
            phase: MatchPhase::Lobby,
            phase_timer: 0.0,
            winner_id: None,
            tick: 0,
            players: BTreeMap::new(),
            inputs: HashMap::new(),
            last_shot_ms: HashMap::new(),
            obstacles,
            items: ItemSystem::new(config.max_items),
            combat: CombatSystem::new(),
            zone: ZoneController::new(&config),
            standings: StandingsTracker::new(),
            rng,
            events: Vec::new(),
            config,
        }
    }

    /// Snapshot of the current world
    pub fn game_state(&self, now_ms: u64) -> GameState {
        SnapshotBuilder::build(self, now_ms)
    }

    /// Drain messages produced since the last call
    pub fn take_events(&mut self) -> Vec<ServerMsg> {
        std::mem::take(&mut self.events)
    }

    /// Apply one queued session event. A welcome carries the snapshot time
    /// of the tick that applied the join.
    pub fn apply(&mut self, event: SessionEvent, now_ms: u64) {
        let SessionEvent {
            session_id,
            kind,
            received_at,
        } = event;

        match kind {
            SessionEventKind::Join { reply } => {
                let welcome = self.handle_join(session_id, now_ms);
                if reply.send(welcome).is_err() {
                    debug!(session_id = %session_id, "Session gone before welcome");
                }
            }
            SessionEventKind::Message(msg) => {
                if let Err(reason) = self.handle_message(session_id, msg, received_at) {
                    debug!(session_id = %session_id, reason = %reason, "Session action rejected");
                }
            }
            SessionEventKind::Disconnect => self.handle_leave(session_id),
        }
    }

    /// Add a player for a new session and build its welcome message
    pub fn handle_join(&mut self, session_id: Uuid, now_ms: u64) -> ServerMsg {
        if self.players.contains_key(&session_id) {
            warn!(session_id = %session_id, "Session already joined");
        } else {
            let player = Player::spawn(session_id, None, &self.obstacles, &self.config, &mut self.rng);
            self.events.push(ServerMsg::PlayerJoin(player.clone()));
            self.players.insert(session_id, player);
            self.inputs.insert(session_id, InputState::default());

            info!(
                session_id = %session_id,
                player_count = self.players.len(),
                "Player joined"
            );
        }

        ServerMsg::Welcome(Welcome {
            session_id,
            game_state: Arc::new(self.game_state(now_ms)),
        })
    }

    /// Remove a session from every map. Standings survive while a match is active.
    pub fn handle_leave(&mut self, session_id: Uuid) {
        let Some(player) = self.players.remove(&session_id) else {
            return;
        };

        match self.phase {
            MatchPhase::InGame | MatchPhase::GameOver => self.standings.retire(&player),
            MatchPhase::Lobby | MatchPhase::Countdown => self.standings.remove(&session_id),
        }
        self.inputs.remove(&session_id);
        self.last_shot_ms.remove(&session_id);
        self.events.push(ServerMsg::PlayerLeave { id: session_id });

        info!(
            session_id = %session_id,
            player_count = self.players.len(),
            "Player left"
        );
    }

    pub fn handle_message(&mut self, session_id: Uuid, msg: ClientMsg, received_at: u64) -> Result<(), ActionRejected> {
        match msg {
            ClientMsg::SetName(raw) => self.set_name(session_id, &raw),
            ClientMsg::PlayerInput(input) => {
                if !self.players.contains_key(&session_id) {
                    return Err(ActionRejected::UnknownSession);
                }
                self.inputs.insert(session_id, input);
                Ok(())
            }
            ClientMsg::Shoot(angle) => self.shoot(session_id, angle, received_at),
            ClientMsg::UseItem(item) => self.use_item(session_id, item),
        }
    }

    fn set_name(&mut self, session_id: Uuid, raw: &str) -> Result<(), ActionRejected> {
        let player = self
            .players
            .get_mut(&session_id)
            .ok_or(ActionRejected::UnknownSession)?;
        player.name = sanitize_name(raw).ok_or(ActionRejected::EmptyName)?;
        Ok(())
    }

    fn shoot(&mut self, session_id: Uuid, angle: f32, now_ms: u64) -> Result<(), ActionRejected> {
        let player = self
            .players
            .get_mut(&session_id)
            .ok_or(ActionRejected::UnknownSession)?;
        if !player.alive {
            return Err(ActionRejected::Dead);
        }
        if self.phase != MatchPhase::InGame {
            return Err(ActionRejected::WrongPhase);
        }

        let last_shot = self.last_shot_ms.get(&session_id).copied();
        self.combat
            .fire(player, angle, last_shot, now_ms, &mut self.rng, &mut self.events)?;
        self.last_shot_ms.insert(session_id, now_ms);
        Ok(())
    }

    fn use_item(&mut self, session_id: Uuid, item: ItemType) -> Result<(), ActionRejected> {
        let player = self
            .players
            .get_mut(&session_id)
            .ok_or(ActionRejected::UnknownSession)?;

        match item {
            ItemType::Medkit => ItemSystem::use_medkit(player, &self.config),
            _ => Err(ActionRejected::NotUsable),
        }
    }

    /// Run a single simulation tick with `dt` seconds elapsed
    pub fn tick(&mut self, dt: f32, now_ms: u64) {
        self.tick += 1;

        let zone_damage_due = self.update_phase(dt);

        if matches!(self.phase, MatchPhase::Countdown | MatchPhase::InGame) {
            self.items.replenish(&self.obstacles, &self.config, &mut self.rng);
        }

        for player in self.players.values_mut() {
            let input = self.inputs.get(&player.id).copied().unwrap_or_default();
            PhysicsSystem::step_player(player, &input, dt, &self.obstacles, &self.config);
            self.items.collect_pickups(player, &self.config);
        }

        if zone_damage_due {
            self.zone.apply_damage(&mut self.players, now_ms, &mut self.events);
        }

        self.combat.update(
            dt,
            &mut self.players,
            &self.obstacles,
            &self.config,
            now_ms,
            &mut self.events,
        );

        if self.phase == MatchPhase::InGame {
            self.standings.sync(&self.players);
        }
    }

    /// Advance the phase machine. Returns true when zone damage applies this tick.
    fn update_phase(&mut self, dt: f32) -> bool {
        match self.phase {
            MatchPhase::Lobby => {
                self.zone.hold();
                if self.players.len() >= self.config.lobby_min_players {
                    self.phase = MatchPhase::Countdown;
                    self.phase_timer = self.config.countdown_duration;
                    info!(player_count = self.players.len(), "Countdown started");
                }
                false
            }
            MatchPhase::Countdown => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.start_round();
                }
                false
            }
            MatchPhase::InGame => {
                self.zone.shrink(dt);

                let alive: Vec<Uuid> = self
                    .players
                    .values()
                    .filter(|p| p.alive)
                    .map(|p| p.id)
                    .collect();

                if alive.len() <= 1 && !self.players.is_empty() {
                    self.winner_id = alive.first().copied().filter(|_| alive.len() == 1);
                    self.phase = MatchPhase::GameOver;
                    self.phase_timer = self.config.game_over_duration;
                    info!(
                        round_id = %self.round_id,
                        winner_id = ?self.winner_id,
                        "Match over"
                    );
                    return false;
                }

                self.zone.damage_due(dt)
            }
            MatchPhase::GameOver => {
                self.phase_timer -= dt;
                if self.phase_timer <= 0.0 {
                    self.reset_to_lobby();
                }
                false
            }
        }
    }

    fn start_round(&mut self) {
        self.phase = MatchPhase::InGame;
        self.phase_timer = 0.0;
        self.round_id = Uuid::new_v4();

        for player in self.players.values_mut() {
            player.revive();
        }
        self.standings.seed(&self.players);
        self.zone.reset_damage_timer();

        info!(
            round_id = %self.round_id,
            participants = self.standings.len(),
            "Match started"
        );
    }

    fn reset_to_lobby(&mut self) {
        self.phase = MatchPhase::Lobby;
        self.phase_timer = 0.0;
        self.winner_id = None;
        self.zone.hold();
        debug!(
            round_id = %self.round_id,
            items = self.items.len(),
            projectiles = self.combat.len(),
            "Clearing round state"
        );
        self.items.clear();
        self.combat.clear();
        self.standings.clear();

        for player in self.players.values_mut() {
            let name = std::mem::take(&mut player.name);
            *player = Player::spawn(player.id, None, &self.obstacles, &self.config, &mut self.rng);
            player.name = name;
        }

        info!(player_count = self.players.len(), "Returned to lobby");
    }
}

/// Handle to the running match, shared by every session
#[derive(Clone)]
pub struct MatchHandle {
    pub event_tx: mpsc::Sender<SessionEvent>,
    broadcast_tx: broadcast::Sender<ServerMsg>,
    latest_rx: watch::Receiver<Option<Arc<GameState>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl MatchHandle {
    /// Receive every broadcast message from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.broadcast_tx.subscribe()
    }

    /// Most recent snapshot, if a tick has run
    pub fn latest(&self) -> Option<Arc<GameState>> {
        self.latest_rx.borrow().clone()
    }

    /// Stop the tick loop
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// The authoritative game match
pub struct GameMatch {
    state: MatchState,
    event_rx: mpsc::Receiver<SessionEvent>,
    broadcast_tx: broadcast::Sender<ServerMsg>,
    latest_tx: watch::Sender<Option<Arc<GameState>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GameMatch {
    pub fn new(state: MatchState) -> (Self, MatchHandle) {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (broadcast_tx, _) = broadcast::channel(256);
        let (latest_tx, latest_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = MatchHandle {
            event_tx,
            broadcast_tx: broadcast_tx.clone(),
            latest_rx,
            shutdown_tx: Arc::new(shutdown_tx),
        };

        let game_match = Self {
            state,
            event_rx,
            broadcast_tx,
            latest_tx,
            shutdown_rx,
        };

        (game_match, handle)
    }

    /// Run the authoritative tick loop until shutdown
    pub async fn run(mut self) {
        let tick_rate = self.state.config.tick_rate;
        info!(tick_rate, "Match loop started");

        let mut tick_interval = interval(tick_duration(tick_rate));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {}
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            if *self.shutdown_rx.borrow() {
                break;
            }

            let now = Instant::now();
            let dt = now.duration_since(last_tick).as_secs_f32();
            last_tick = now;

            self.step(dt, unix_millis());
        }

        info!(ticks = self.state.tick, "Match loop stopped");
    }

    /// Apply queued session events, simulate one tick and broadcast the result
    pub fn step(&mut self, dt: f32, now_ms: u64) -> Arc<GameState> {
        while let Ok(event) = self.event_rx.try_recv() {
            self.state.apply(event, now_ms);
        }

        self.state.tick(dt, now_ms);

        // No receivers is fine, sessions come and go
        for event in self.state.take_events() {
            let _ = self.broadcast_tx.send(event);
        }

        let snapshot = Arc::new(self.state.game_state(now_ms));
        let _ = self.broadcast_tx.send(ServerMsg::GameState(Arc::clone(&snapshot)));
        self.latest_tx.send_replace(Some(Arc::clone(&snapshot)));

        snapshot
    }
}
