//! Session settings loaded from an optional TOML file.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use horde_survival_core::{Command, EnemyCatalog, Vec2, WorldRect, DEFAULT_TILE_SIZE};
use horde_survival_system_movement as movement;
use horde_survival_system_spawning as spawning;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading session settings.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// Location of the settings file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings file is not valid TOML for a session.
    #[error("failed to parse {path}")]
    Parse {
        /// Location of the settings file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The arena has no cells or a non-positive tile size.
    #[error("arena of {columns}x{rows} tiles at {tile_size}px cannot hold a session")]
    InvalidArena {
        /// Requested tile columns.
        columns: u32,
        /// Requested tile rows.
        rows: u32,
        /// Requested tile side length.
        tile_size: f32,
    },
    /// A scripted player or weapon setting is out of range.
    #[error("`{0}` must be positive")]
    NotPositive(&'static str),
}

/// Complete description of a headless session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    pub(crate) arena: ArenaSettings,
    pub(crate) spawning: SpawnSettings,
    pub(crate) movement: movement::Config,
    pub(crate) player: PlayerSettings,
    pub(crate) weapon: WeaponSettings,
    pub(crate) catalog: EnemyCatalog,
}

impl SessionConfig {
    /// Reads and validates a TOML settings file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if arena.columns == 0
            || arena.rows == 0
            || !arena.tile_size.is_finite()
            || arena.tile_size <= 0.0
        {
            return Err(ConfigError::InvalidArena {
                columns: arena.columns,
                rows: arena.rows,
                tile_size: arena.tile_size,
            });
        }
        if self.player.orbit_period_ms == 0 {
            return Err(ConfigError::NotPositive("player.orbit_period_ms"));
        }
        if !(self.player.hitbox.x > 0.0 && self.player.hitbox.y > 0.0) {
            return Err(ConfigError::NotPositive("player.hitbox"));
        }
        if self.weapon.cooldown_ms == 0 {
            return Err(ConfigError::NotPositive("weapon.cooldown_ms"));
        }
        Ok(())
    }
}

/// Arena dimensions and static obstacles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ArenaSettings {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_size: f32,
    pub(crate) obstacles: Vec<WorldRect>,
}

impl ArenaSettings {
    pub(crate) fn command(&self) -> Command {
        Command::ConfigureArena {
            columns: self.columns,
            rows: self.rows,
            tile_size: self.tile_size,
            obstacles: self.obstacles.clone(),
        }
    }
}

impl Default for ArenaSettings {
    fn default() -> Self {
        let tile = DEFAULT_TILE_SIZE;
        Self {
            columns: 30,
            rows: 20,
            tile_size: tile,
            obstacles: vec![
                WorldRect::new(6.0 * tile, 4.0 * tile, 2.0 * tile, 2.0 * tile),
                WorldRect::new(22.0 * tile, 4.0 * tile, 2.0 * tile, 2.0 * tile),
                WorldRect::new(6.0 * tile, 14.0 * tile, 2.0 * tile, 2.0 * tile),
                WorldRect::new(22.0 * tile, 14.0 * tile, 2.0 * tile, 2.0 * tile),
                WorldRect::new(13.0 * tile, 2.0 * tile, 4.0 * tile, tile),
                WorldRect::new(13.0 * tile, 17.0 * tile, 4.0 * tile, tile),
            ],
        }
    }
}

/// Spawn director tuning with durations in whole milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SpawnSettings {
    pub(crate) base_spawn_interval_ms: u64,
    pub(crate) min_spawn_interval_ms: u64,
    pub(crate) interval_decay_ms_per_second: u64,
    pub(crate) difficulty_step_ms: u64,
    pub(crate) difficulty_increment: f32,
    pub(crate) boss_interval_ms: u64,
    pub(crate) spawn_distance: f32,
    pub(crate) boss_spawn_distance: f32,
    pub(crate) max_attempts: u32,
    pub(crate) population_cap: usize,
    pub(crate) boss_sequence: Vec<String>,
}

impl SpawnSettings {
    pub(crate) fn to_config(&self, rng_seed: u64) -> spawning::Config {
        spawning::Config {
            base_spawn_interval: Duration::from_millis(self.base_spawn_interval_ms),
            min_spawn_interval: Duration::from_millis(self.min_spawn_interval_ms),
            interval_decay_per_second: Duration::from_millis(self.interval_decay_ms_per_second),
            difficulty_step: Duration::from_millis(self.difficulty_step_ms),
            difficulty_increment: self.difficulty_increment,
            boss_interval: Duration::from_millis(self.boss_interval_ms),
            spawn_distance: self.spawn_distance,
            boss_spawn_distance: self.boss_spawn_distance,
            max_attempts: self.max_attempts,
            population_cap: self.population_cap,
            boss_sequence: self.boss_sequence.clone(),
            ..spawning::Config::with_seed(rng_seed)
        }
    }
}

impl Default for SpawnSettings {
    fn default() -> Self {
        let defaults = spawning::Config::default();
        Self {
            base_spawn_interval_ms: millis(defaults.base_spawn_interval),
            min_spawn_interval_ms: millis(defaults.min_spawn_interval),
            interval_decay_ms_per_second: millis(defaults.interval_decay_per_second),
            difficulty_step_ms: millis(defaults.difficulty_step),
            difficulty_increment: defaults.difficulty_increment,
            boss_interval_ms: millis(defaults.boss_interval),
            spawn_distance: defaults.spawn_distance,
            boss_spawn_distance: defaults.boss_spawn_distance,
            max_attempts: defaults.max_attempts,
            population_cap: defaults.population_cap,
            boss_sequence: defaults.boss_sequence,
        }
    }
}

/// Scripted player path: a circle around the arena centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct PlayerSettings {
    pub(crate) orbit_radius: f32,
    pub(crate) orbit_period_ms: u64,
    pub(crate) hitbox: Vec2,
    pub(crate) invulnerability_ms: u64,
}

impl PlayerSettings {
    pub(crate) fn orbit_period(&self) -> Duration {
        Duration::from_millis(self.orbit_period_ms)
    }

    pub(crate) fn invulnerability(&self) -> Duration {
        Duration::from_millis(self.invulnerability_ms)
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            orbit_radius: 256.0,
            orbit_period_ms: 20_000,
            hitbox: Vec2::new(40.0, 50.0),
            invulnerability_ms: 500,
        }
    }
}

/// Auto-weapon that hits the nearest agents in range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WeaponSettings {
    pub(crate) cooldown_ms: u64,
    pub(crate) range: f32,
}

impl WeaponSettings {
    pub(crate) fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for WeaponSettings {
    fn default() -> Self {
        // Bullets fly 1200 px/s for one second.
        Self {
            cooldown_ms: 200,
            range: 1_200.0,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
