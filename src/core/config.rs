//! Bot configuration with documented constants
//!
//! Every tunable of the bot core lives here. The whole tree deserializes
//! from TOML and every section falls back to its defaults, so a config file
//! only needs to name what it changes. Built once at startup and handed to
//! the components that need it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BotError, Result};
use crate::core::types::{Difficulty, Role, Seconds};
use crate::decision::attributes::AttributeSet;
use crate::decision::mission::Mission;
use crate::decision::weapon::WeaponRestriction;
use crate::perception::IgnoreCategory;
use crate::population::quota::PopulationTarget;
use crate::population::roster::RoleTable;

/// What an agent perceives and how long it remembers it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Seconds an unseen subject stays in memory
    ///
    /// Long enough to keep chasing around a corner, short enough that a
    /// bot stops reacting to someone who left the area.
    pub forget_time: Seconds,

    /// Farthest distance at which anything is noticed (world units)
    pub max_vision_range: f32,

    /// Seconds a subject must stay visible before it is recognized,
    /// indexed by difficulty (Easy, Normal, Hard, Expert)
    pub min_recognize_time: [Seconds; 4],

    /// Concealment at or above which an enemy is invisible
    ///
    /// Below it (but above zero) the subject flickers and is force-noticed.
    pub concealment_threshold: f32,

    /// Agent count above which scans are throttled
    pub heavy_population_threshold: usize,

    /// Randomized scan interval bounds under heavy population
    pub throttle_interval_min: Seconds,
    pub throttle_interval_max: Seconds,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            forget_time: 10.0,
            max_vision_range: 6000.0,
            min_recognize_time: [1.0, 0.5, 0.3, 0.2],
            concealment_threshold: 0.75,
            heavy_population_threshold: 10,
            throttle_interval_min: 0.5,
            throttle_interval_max: 1.0,
        }
    }
}

impl PerceptionConfig {
    pub fn recognize_time(&self, difficulty: Difficulty) -> Seconds {
        self.min_recognize_time[difficulty.index()]
    }
}

/// Body limits used by locomotion and path costs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Height climbed without jumping
    pub step_height: f32,
    /// Highest ledge reachable with a jump
    pub max_jump_height: f32,
    /// Largest drop survived without damage
    pub death_drop_height: f32,
    /// Whether steering is honored while airborne
    pub allow_air_control: bool,
    /// How long to hold crouch after leaving the ground
    pub airborne_crouch_time: Seconds,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            step_height: 18.0,
            max_jump_height: 72.0,
            death_drop_height: 200.0,
            allow_air_control: false,
            airborne_crouch_time: 0.3,
        }
    }
}

/// Path cost weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Cost multiplier for edges that need a jump
    pub jump_penalty: f32,
    /// Safest route: cost scales by `1 + factor * combat_intensity`
    pub combat_intensity_factor: f32,
    /// Safest route: multiplier inside enemy emplacement danger zones
    pub emplacement_danger_factor: f32,
    /// Stealth roles: added multiplier per teammate standing in an area
    pub teammate_penalty: f32,
    /// Stealth roles: multiplier near enemy stationary structures
    pub enemy_structure_penalty: f32,
    /// Distance within which an enemy structure taints an area
    pub enemy_structure_radius: f32,
    /// Route diversification multiplier lies in `[1, 1 + route_jitter)`
    pub route_jitter: f32,
    /// Seconds a diversified route preference holds
    pub route_jitter_period: Seconds,
    /// Refuse areas of objectives that are not currently active
    pub avoid_inactive_objectives: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            jump_penalty: 5.0,
            combat_intensity_factor: 4.0,
            emplacement_danger_factor: 10.0,
            teammate_penalty: 10.0,
            enemy_structure_penalty: 5.0,
            enemy_structure_radius: 500.0,
            route_jitter: 1.0,
            route_jitter_period: 10.0,
            avoid_inactive_objectives: true,
        }
    }
}

/// Spy suspicion windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionConfig {
    /// Trailing window; every second in it needs a contact to unmask
    pub window_seconds: u32,
    /// Suspected records with no contact for this long are dropped
    pub cooldown: Seconds,
    /// Allies within this radius learn of an unmasked subject
    pub propagation_radius: f32,
}

impl Default for SuspicionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 5,
            cooldown: 10.0,
            propagation_radius: 500.0,
        }
    }
}

/// Weapon choice and engagement ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Threats nearer than this count as close
    pub close_threat_range: f32,
    /// Seconds without a threat before falling back to the default weapon
    pub no_threat_reload_time: Seconds,
    pub melee_max_range: f32,
    pub melee_desired_range: f32,
    pub sustained_max_range: f32,
    pub sustained_desired_range: f32,
    pub splash_max_range: f32,
    pub splash_desired_range: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            close_threat_range: 500.0,
            no_threat_reload_time: 3.0,
            melee_max_range: 100.0,
            melee_desired_range: 50.0,
            sustained_max_range: 350.0,
            sustained_desired_range: 100.0,
            splash_max_range: 3000.0,
            splash_desired_range: 500.0,
        }
    }
}

/// Sniper vantage spot search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VantageConfig {
    /// Spots retained (top-K by advantage)
    pub max_spots: usize,
    /// Random pairs tried per search step
    pub samples_per_update: usize,
    /// Pairs closer than this are useless for a sniper
    pub min_separation: f32,
    /// Incursion tolerance around the objective for vantage areas
    pub point_tolerance: f32,
    /// Tolerance scale when not defending the objective
    pub attacking_tolerance_scale: f32,
    /// Objective movement that invalidates the spot set
    pub relocate_tolerance: f32,
    /// Retry delay when no areas qualify
    pub retry_interval: Seconds,
    /// Randomized delay between search steps
    pub search_interval_min: Seconds,
    pub search_interval_max: Seconds,
}

impl Default for VantageConfig {
    fn default() -> Self {
        Self {
            max_spots: 10,
            samples_per_update: 10,
            min_separation: 1000.0,
            point_tolerance: 750.0,
            attacking_tolerance_scale: 2.0,
            relocate_tolerance: 200.0,
            retry_interval: 5.0,
            search_interval_min: 0.1,
            search_interval_max: 0.3,
        }
    }
}

/// Squad formation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    /// Members at or below this error count as in formation
    pub in_formation_error: f32,
    /// Members at or above this error make the leader wait
    pub wait_error: f32,
    /// Default ring radius of a new squad's formation
    pub formation_size: f32,
    /// Whether new squads re-elect a leader when theirs leaves
    pub preserve_on_leader_loss: bool,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            in_formation_error: 0.75,
            wait_error: 1.0,
            formation_size: 150.0,
            preserve_on_leader_loss: false,
        }
    }
}

/// Population control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Off for scripted scenarios where the host adds and removes agents
    pub enabled: bool,
    /// Seconds between quota evaluations
    pub update_interval: Seconds,
    pub target: PopulationTarget,
    /// Total participant slots in the simulation
    pub capacity: usize,
    /// Largest allowed head-count difference between teams, `None` for no limit
    pub team_imbalance_limit: Option<usize>,
    /// First handle given to spawned agents
    pub handle_base: u32,
    pub difficulty: Difficulty,
    pub roster: RoleTable,
    pub names: Vec<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            update_interval: 0.25,
            target: PopulationTarget::default(),
            capacity: 24,
            team_imbalance_limit: Some(1),
            handle_base: 1000,
            difficulty: Difficulty::Normal,
            roster: RoleTable::default(),
            names: Vec::new(),
        }
    }
}

/// Mission and behavior flags handed to agents of a role at spawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionProfile {
    pub role: Role,
    #[serde(default)]
    pub mission: Mission,
    #[serde(default)]
    pub attributes: AttributeSet,
    #[serde(default)]
    pub restriction: WeaponRestriction,
    /// Subject categories agents of this profile never react to
    #[serde(default)]
    pub ignore: Vec<IgnoreCategory>,
}

/// Complete bot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Seed for every deterministic RNG in the core
    pub seed: u64,
    pub perception: PerceptionConfig,
    pub movement: MovementConfig,
    pub path: PathConfig,
    pub suspicion: SuspicionConfig,
    pub weapons: WeaponConfig,
    pub vantage: VantageConfig,
    pub squad: SquadConfig,
    pub population: PopulationConfig,
    pub profiles: Vec<MissionProfile>,
}

impl BotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Spawn profile for a role, if one is configured
    pub fn profile_for(&self, role: Role) -> Option<&MissionProfile> {
        self.profiles.iter().find(|p| p.role == role)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let movement = &self.movement;
        if movement.step_height > movement.max_jump_height {
            return Err(BotError::InvalidConfig(format!(
                "step_height ({}) should be <= max_jump_height ({})",
                movement.step_height, movement.max_jump_height
            )));
        }
        if movement.death_drop_height <= 0.0 {
            return Err(BotError::InvalidConfig("death_drop_height must be positive".into()));
        }

        let perception = &self.perception;
        if perception.throttle_interval_min > perception.throttle_interval_max {
            return Err(BotError::InvalidConfig(format!(
                "throttle_interval_min ({}) should be <= throttle_interval_max ({})",
                perception.throttle_interval_min, perception.throttle_interval_max
            )));
        }
        if perception.forget_time <= 0.0 {
            return Err(BotError::InvalidConfig("forget_time must be positive".into()));
        }
        if perception.min_recognize_time.iter().any(|t| *t < 0.0) {
            return Err(BotError::InvalidConfig("min_recognize_time must not be negative".into()));
        }

        if self.suspicion.window_seconds == 0 {
            return Err(
                BotError::InvalidConfig("suspicion window must be at least one second".into()),
            );
        }

        let path = &self.path;
        let weights = [
            path.jump_penalty,
            path.combat_intensity_factor,
            path.emplacement_danger_factor,
            path.teammate_penalty,
            path.enemy_structure_penalty,
            path.route_jitter,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(BotError::InvalidConfig("path cost weights must be non-negative".into()));
        }

        let vantage = &self.vantage;
        if vantage.search_interval_min > vantage.search_interval_max {
            return Err(BotError::InvalidConfig(
                "vantage search_interval_min should be <= search_interval_max".into(),
            ));
        }

        if self.squad.in_formation_error > self.squad.wait_error {
            return Err(BotError::InvalidConfig(format!(
                "in_formation_error ({}) should be <= wait_error ({})",
                self.squad.in_formation_error, self.squad.wait_error
            )));
        }

        let population = &self.population;
        if population.update_interval <= 0.0 {
            return Err(
                BotError::InvalidConfig("population update_interval must be positive".into()),
            );
        }
        if population.capacity == 0 {
            return Err(BotError::InvalidConfig("population capacity must be at least 1".into()));
        }

        Ok(())
    }
}
