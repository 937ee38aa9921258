//! Headless skirmish run
//!
//! Builds a straight arena with a spawn room at each end and a control point
//! in the middle, lets the population loop fill both teams and plays the
//! bots against each other. Prints every bot event as JSON or text.

use std::path::PathBuf;

use ahash::AHashMap;
use clap::Parser;
use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use skirmish_bots::core::types::{AreaId, EntityHandle, PerTeam, Role, Seconds, Team};
use skirmish_bots::core::BotConfig;
use skirmish_bots::nav::{NavArea, NavMesh};
use skirmish_bots::population::QuotaMode;
use skirmish_bots::simulation::{BotEvent, BotSimulation, TimedEvent};
use skirmish_bots::world::{
    DamageEvent, Loadout, ObjectKind, ObjectiveKind, Participant, Weapon, WeaponCategory, WeaponId,
    WeaponSlot, WorldObject, WorldQuery, WorldSnapshot,
};

const AREA_COUNT: u32 = 12;
const AREA_SPACING: f32 = 400.0;
const RUN_SPEED: f32 = 300.0;
const MAX_HEALTH: f32 = 150.0;
const RESPAWN_DELAY: Seconds = 5.0;

#[derive(Parser, Debug)]
#[command(name = "bot_sim")]
#[command(about = "Run a headless bot skirmish and print what the bots did")]
struct Args {
    /// Bot configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.1)]
    dt: f32,

    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Idle human participants placed on the red team
    #[arg(long, default_value_t = 0)]
    humans: u32,

    /// Output format (json or text)
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct AgentReport {
    handle: EntityHandle,
    name: String,
    team: Team,
    role: Role,
    alive: bool,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    ticks: u64,
    events: Vec<TimedEvent>,
    agents: Vec<AgentReport>,
}

/// Bodies, health and respawns the bots play in
struct Arena {
    world: WorldSnapshot,
    nav: NavMesh,
    health: AHashMap<EntityHandle, f32>,
    respawn_at: AHashMap<EntityHandle, Seconds>,
    rng: ChaCha8Rng,
}

impl Arena {
    fn new(seed: u64, humans: u32) -> Self {
        let mut nav = NavMesh::new();
        let last = AREA_COUNT - 1;
        for i in 0..AREA_COUNT {
            let mut area = NavArea::new(AreaId(i), Vec3::new(i as f32 * AREA_SPACING, 0.0, 0.0));
            area.half_extent = Vec2::splat(AREA_SPACING / 2.0);
            area.incursion = PerTeam {
                red: i as f32 * AREA_SPACING,
                blue: (last - i) as f32 * AREA_SPACING,
            };
            if i == 0 {
                area.spawn_room = Some(Team::Red);
            } else if i == last {
                area.spawn_room = Some(Team::Blue);
            }
            nav.add_area(area);
        }
        for i in 1..AREA_COUNT {
            nav.connect(AreaId(i - 1), AreaId(i));
        }

        let mut world = WorldSnapshot::new();
        world.objects.push(WorldObject::new(
            EntityHandle(1),
            ObjectKind::Objective(ObjectiveKind::ControlPoint),
            Team::Unassigned,
            Vec3::new(AREA_SPACING * (AREA_COUNT / 2) as f32, 0.0, 0.0),
        ));

        let mut arena = Self {
            world,
            nav,
            health: AHashMap::new(),
            respawn_at: AHashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for i in 0..humans {
            let handle = EntityHandle(100 + i);
            let position = arena.spawn_point(Team::Red);
            arena.world.upsert(Participant::human(handle, Team::Red, Role::Soldier, position));
        }
        arena
    }

    fn spawn_point(&mut self, team: Team) -> Vec3 {
        let x = match team {
            Team::Blue => (AREA_COUNT - 1) as f32 * AREA_SPACING,
            _ => 0.0,
        };
        let jitter = self.rng.gen_range(-150.0..150.0);
        Vec3::new(x, jitter, 0.0)
    }

    fn place(&mut self, handle: EntityHandle, team: Team, role: Role) {
        let position = self.spawn_point(team);
        self.world.upsert(Participant::new(handle, team, role, position));
        self.health.insert(handle, MAX_HEALTH);
        self.respawn_at.remove(&handle);
    }

    fn remove(&mut self, handle: EntityHandle) {
        self.world.remove(handle);
        self.health.remove(&handle);
        self.respawn_at.remove(&handle);
    }

    /// Apply a hit; returns the damage event to forward to the bots
    fn shoot(
        &mut self,
        attacker: EntityHandle,
        victim: EntityHandle,
        now: Seconds,
    ) -> Option<DamageEvent> {
        let body = self.world.participant(victim)?;
        if !body.alive || body.is_human() || !self.rng.gen_bool(0.35) {
            return None;
        }
        let health = self.health.entry(victim).or_insert(MAX_HEALTH);
        let amount = self.rng.gen_range(15.0..45.0);
        *health -= amount;
        let fatal = *health <= 0.0;
        if fatal {
            if let Some(body) = self.world.participant_mut(victim) {
                body.alive = false;
            }
            self.respawn_at.insert(victim, now + RESPAWN_DELAY);
        }
        Some(DamageEvent {
            victim,
            attacker: Some(attacker),
            amount,
            fatal,
            time: now,
        })
    }

    fn respawn_due(&mut self, now: Seconds) {
        let due: Vec<EntityHandle> = self
            .respawn_at
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in due {
            let Some((team, role)) = self.world.participant(handle).map(|p| (p.team, p.role)) else {
                continue;
            };
            self.place(handle, team, role);
        }
    }
}

fn starting_loadout() -> Loadout {
    Loadout::new(vec![
        Weapon::new(WeaponId(1), WeaponSlot::Primary, WeaponCategory::Hitscan, 6, 32),
        Weapon::melee(WeaponId(3)),
    ])
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => BotConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config '{}': {}", path.display(), e);
            eprintln!("Using default config");
            BotConfig::default()
        }),
        None => {
            let mut config = BotConfig::default();
            config.population.target.mode = QuotaMode::Fill;
            config.population.target.count = 8;
            config
        }
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;

    let mut arena = Arena::new(seed, args.humans);
    let mut sim = BotSimulation::new(config);
    let mut timeline: Vec<TimedEvent> = Vec::new();

    for tick in 0..args.ticks {
        let now = tick as f32 * args.dt;
        arena.respawn_due(now);

        let outcome = sim.run_tick(&arena.world, &arena.nav, now);
        let mut events = outcome.events;

        // Move bodies and resolve shots
        let mut hits = Vec::new();
        for (handle, result) in &outcome.agents {
            if let Some(body) = arena.world.participant_mut(*handle) {
                if body.alive {
                    body.position += result.signals.move_dir * RUN_SPEED * args.dt;
                }
            }
            let (Some(threat), true) = (result.decision.threat, result.decision.fire) else {
                continue;
            };
            if let Some(agent) = sim.agent_mut(*handle) {
                if let Some(weapon) = result.decision.weapon {
                    agent.loadout.active = Some(weapon);
                    if let Some(w) = agent.loadout.get_mut(weapon) {
                        if w.clip > 0 {
                            w.clip -= 1;
                        } else if w.reserve > 0 {
                            let refill = w.clip_size.min(w.reserve);
                            w.reserve -= refill;
                            w.clip = refill;
                        }
                    }
                }
            }
            hits.push((*handle, threat.subject));
        }
        for (attacker, victim) in hits {
            if let Some(damage) = arena.shoot(attacker, victim, now) {
                events.extend(sim.on_damage(&damage, &arena.world));
            }
        }

        // Keep bodies in step with the roster
        for event in &events {
            match event {
                BotEvent::AgentSpawned { agent, team, role, .. }
                | BotEvent::AgentReassigned { agent, team, role } => {
                    arena.place(*agent, *team, *role);
                    if let Some(bot) = sim.agent_mut(*agent) {
                        bot.loadout = starting_loadout();
                    }
                }
                BotEvent::AgentRemoved { agent } => arena.remove(*agent),
                BotEvent::AgentBenched { agent } => {
                    if let Some(body) = arena.world.participant_mut(*agent) {
                        body.team = Team::Spectator;
                    }
                }
                _ => {}
            }
        }

        timeline.extend(events.into_iter().map(|event| TimedEvent { time: now, event }));
    }

    let agents = sim
        .agents()
        .map(|agent| AgentReport {
            handle: agent.handle,
            name: agent.name.clone(),
            team: agent.team(),
            role: agent.role(),
            alive: agent.alive,
        })
        .collect();
    let report = RunReport {
        seed,
        ticks: args.ticks,
        events: timeline,
        agents,
    };

    if args.format == "json" {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize report: {}", e),
        }
    } else {
        println!("Seed {} | {} ticks | {} events", report.seed, report.ticks, report.events.len());
        for timed in &report.events {
            println!("[{:>7.2}] {:?}", timed.time, timed.event);
        }
        println!();
        for agent in &report.agents {
            println!(
                "{:>6} {:<12} {:?} {:?}{}",
                agent.handle.to_string(),
                agent.name,
                agent.team,
                agent.role,
                if agent.alive { "" } else { " (dead)" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humans_and_missing_bodies_are_never_hit() {
        let mut arena = Arena::new(1, 1);
        assert!(arena.shoot(EntityHandle(5), EntityHandle(100), 0.0).is_none());
        assert!(arena.shoot(EntityHandle(5), EntityHandle(999), 0.0).is_none());
    }

    #[test]
    fn test_dead_bots_respawn_at_their_spawn() {
        let mut arena = Arena::new(2, 0);
        let bot = EntityHandle(7);
        arena.place(bot, Team::Blue, Role::Heavy);
        if let Some(body) = arena.world.participant_mut(bot) {
            body.alive = false;
            body.position = Vec3::ZERO;
        }
        arena.respawn_at.insert(bot, 1.0);

        arena.respawn_due(0.5);
        assert_eq!(arena.world.participant(bot).map(|p| p.alive), Some(false));

        arena.respawn_due(1.0);
        let body = arena.world.participant(bot).expect("body");
        assert!(body.alive);
        assert_eq!(body.role, Role::Heavy);
        assert!(body.position.x > 0.0);
        assert!(arena.respawn_at.is_empty());
    }
}
