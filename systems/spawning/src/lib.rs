#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn director that populates the arena and escalates difficulty over time.
//!
//! Difficulty is a pure function of elapsed session time: a stepped stat
//! multiplier, a shrinking spawn interval and a boss-wave counter. The
//! director turns those into `SpawnAgent` commands at randomly sampled
//! positions that keep clear of the player and of static obstacles.

use std::time::Duration;

use horde_survival_core::{
    AgentVariant, AgentView, CatalogEntry, Command, EnemyCatalog, Event, OccupancyView,
    StatScale, Vec2, WorldRect,
};
use rand::{seq::IteratorRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Spawn interval at the start of a session.
    pub base_spawn_interval: Duration,
    /// Lower bound of the spawn interval.
    pub min_spawn_interval: Duration,
    /// Interval reduction per elapsed second.
    pub interval_decay_per_second: Duration,
    /// Session time between two difficulty steps.
    pub difficulty_step: Duration,
    /// Multiplier increase per difficulty step.
    pub difficulty_increment: f32,
    /// Session time between two boss waves.
    pub boss_interval: Duration,
    /// Regular agents spawn strictly farther than this from the player.
    pub spawn_distance: f32,
    /// Bosses spawn strictly farther than this from the player.
    pub boss_spawn_distance: f32,
    /// Position samples tried per spawn before giving up for the tick.
    pub max_attempts: u32,
    /// Live agent count above which regular spawns are suppressed.
    pub population_cap: usize,
    /// Collision footprint of regular agents.
    pub regular_hitbox: Vec2,
    /// Collision footprint of bosses.
    pub boss_hitbox: Vec2,
    /// Extra multipliers applied to boss stats on top of difficulty.
    pub boss_scale: StatScale,
    /// Catalog type names used for consecutive bosses, wrapping around.
    pub boss_sequence: Vec<String>,
    /// Lower bound of the randomized replan cooldown of regular agents.
    pub regular_replan_min: Duration,
    /// Upper bound of the randomized replan cooldown of regular agents.
    pub regular_replan_max: Duration,
    /// Fixed replan cooldown of bosses.
    pub boss_replan: Duration,
    /// Seed of the sampling random number generator.
    pub rng_seed: u64,
}

impl Config {
    /// Creates the default configuration with the provided seed.
    #[must_use]
    pub fn with_seed(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_spawn_interval: Duration::from_millis(2_000),
            min_spawn_interval: Duration::from_millis(200),
            interval_decay_per_second: Duration::from_millis(10),
            difficulty_step: Duration::from_secs(30),
            difficulty_increment: 0.2,
            boss_interval: Duration::from_secs(180),
            spawn_distance: 600.0,
            boss_spawn_distance: 800.0,
            max_attempts: 20,
            population_cap: 150,
            regular_hitbox: Vec2::new(44.0, 24.0),
            boss_hitbox: Vec2::new(108.0, 88.0),
            boss_scale: StatScale::new(10.0, 0.8, 2.0, 10.0),
            boss_sequence: ["toast", "books", "spider", "slime"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            regular_replan_min: Duration::from_millis(300),
            regular_replan_max: Duration::from_millis(500),
            boss_replan: Duration::from_millis(120),
            rng_seed: 0,
        }
    }
}

/// Difficulty derived from elapsed session time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Difficulty {
    /// Multiplier applied to health and contact damage of new agents.
    pub multiplier: f32,
    /// Time between two regular spawns.
    pub spawn_interval: Duration,
    /// Number of boss waves that are due by now.
    pub boss_waves: u32,
}

impl Difficulty {
    /// Recomputes the difficulty for the provided elapsed time.
    #[must_use]
    pub fn at(elapsed: Duration, config: &Config) -> Self {
        let steps = whole_periods(elapsed, config.difficulty_step);
        let multiplier = 1.0 + steps as f32 * config.difficulty_increment;

        let decay_nanos = config
            .interval_decay_per_second
            .as_nanos()
            .saturating_mul(elapsed.as_nanos())
            / NANOS_PER_SECOND;
        let decay = Duration::from_nanos(u64::try_from(decay_nanos).unwrap_or(u64::MAX));
        let spawn_interval = config
            .base_spawn_interval
            .saturating_sub(decay)
            .max(config.min_spawn_interval);

        let boss_waves =
            u32::try_from(whole_periods(elapsed, config.boss_interval)).unwrap_or(u32::MAX);

        Self {
            multiplier,
            spawn_interval,
            boss_waves,
        }
    }

    /// Stat scale applied to regular agents.
    #[must_use]
    pub fn regular_scale(&self) -> StatScale {
        StatScale::new(self.multiplier, 1.0, self.multiplier, 1.0)
    }
}

fn whole_periods(elapsed: Duration, period: Duration) -> u128 {
    if period.is_zero() {
        return 0;
    }
    elapsed.as_nanos() / period.as_nanos()
}

/// Spawn director that emits `SpawnAgent` commands as session time advances.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    catalog: EnemyCatalog,
    rng: ChaCha8Rng,
    difficulty: Difficulty,
    since_last_spawn: Duration,
    announced_waves: u32,
    pending_bosses: u32,
    boss_cursor: usize,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration and catalog.
    #[must_use]
    pub fn new(config: Config, catalog: EnemyCatalog) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let difficulty = Difficulty::at(Duration::ZERO, &config);
        Self {
            config,
            catalog,
            rng,
            difficulty,
            since_last_spawn: Duration::ZERO,
            announced_waves: 0,
            pending_bosses: 0,
            boss_cursor: 0,
        }
    }

    /// Difficulty computed by the most recent update.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Bosses that are due but have not been placed yet.
    #[must_use]
    pub fn pending_bosses(&self) -> u32 {
        self.pending_bosses
    }

    /// Recomputes the difficulty and raises one boss flag per newly reached wave.
    pub fn update_difficulty(&mut self, elapsed: Duration) -> Difficulty {
        self.difficulty = Difficulty::at(elapsed, &self.config);
        if self.difficulty.boss_waves > self.announced_waves {
            let fresh = self.difficulty.boss_waves - self.announced_waves;
            self.pending_bosses = self.pending_bosses.saturating_add(fresh);
            self.announced_waves = self.difficulty.boss_waves;
            info!(
                wave = self.announced_waves,
                elapsed_secs = elapsed.as_secs(),
                "boss wave due"
            );
        }
        self.difficulty
    }

    /// Reports whether a spawn should happen this tick.
    #[must_use]
    pub fn should_spawn(&self) -> bool {
        self.pending_bosses > 0 || self.since_last_spawn >= self.difficulty.spawn_interval
    }

    /// Samples a valid position and builds the spawn command for one agent.
    ///
    /// Returns `None` when every sampled position was rejected or, for
    /// bosses, when the current sequence entry is not in the catalog.
    pub fn spawn_one(
        &mut self,
        boss: bool,
        player: Vec2,
        occupancy: OccupancyView<'_>,
        obstacles: &[WorldRect],
    ) -> Option<Command> {
        let entry = if boss {
            self.current_boss_entry()?
        } else {
            self.random_regular_entry()?
        };

        let (hitbox_size, min_distance) = if boss {
            (self.config.boss_hitbox, self.config.boss_spawn_distance)
        } else {
            (self.config.regular_hitbox, self.config.spawn_distance)
        };

        let position =
            self.sample_position(hitbox_size, min_distance, player, occupancy, obstacles)?;

        let (variant, profile, replan_cooldown) = if boss {
            self.advance_boss_cursor();
            let scale = self.difficulty.regular_scale().then(self.config.boss_scale);
            (
                AgentVariant::Boss(entry.kind),
                entry.profile.scaled(scale),
                self.config.boss_replan,
            )
        } else {
            (
                AgentVariant::Regular(entry.kind),
                entry.profile.scaled(self.difficulty.regular_scale()),
                self.regular_replan_cooldown(),
            )
        };

        debug!(
            ?variant,
            x = position.x,
            y = position.y,
            health = profile.max_health,
            "spawning agent"
        );
        Some(Command::SpawnAgent {
            variant,
            position,
            hitbox_size,
            profile,
            replan_cooldown,
        })
    }

    /// Consumes world events and immutable views to emit spawn commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        occupancy: OccupancyView<'_>,
        obstacles: &[WorldRect],
        player: Vec2,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = None;
        for event in events {
            match event {
                Event::ArenaConfigured { .. } => self.reset(),
                Event::TimeAdvanced { dt, elapsed: now } => {
                    self.since_last_spawn = self.since_last_spawn.saturating_add(*dt);
                    elapsed = Some(*now);
                }
                _ => {}
            }
        }
        let Some(elapsed) = elapsed else {
            return;
        };

        let _ = self.update_difficulty(elapsed);
        if !self.should_spawn() {
            return;
        }

        while self.pending_bosses > 0 {
            if self.config.boss_sequence.is_empty() {
                self.pending_bosses = 0;
                break;
            }
            if self.current_boss_entry().is_none() {
                warn!(
                    boss_type = self.current_boss_name(),
                    "boss type missing from catalog, skipping wave"
                );
                self.pending_bosses -= 1;
                self.advance_boss_cursor();
                continue;
            }
            let Some(command) = self.spawn_one(true, player, occupancy, obstacles) else {
                debug!("no valid boss position this tick");
                break;
            };
            out.push(command);
            self.pending_bosses -= 1;
        }

        if self.since_last_spawn < self.difficulty.spawn_interval {
            return;
        }
        self.since_last_spawn = Duration::ZERO;

        if agents.alive().count() >= self.config.population_cap {
            debug!(cap = self.config.population_cap, "population cap reached");
            return;
        }
        if let Some(command) = self.spawn_one(false, player, occupancy, obstacles) {
            out.push(command);
        } else {
            debug!("no valid spawn position this tick");
        }
    }

    fn reset(&mut self) {
        self.difficulty = Difficulty::at(Duration::ZERO, &self.config);
        self.since_last_spawn = Duration::ZERO;
        self.announced_waves = 0;
        self.pending_bosses = 0;
        self.boss_cursor = 0;
    }

    fn current_boss_name(&self) -> &str {
        self.config
            .boss_sequence
            .get(self.boss_cursor)
            .map_or("", String::as_str)
    }

    fn current_boss_entry(&self) -> Option<CatalogEntry> {
        self.catalog.get(self.current_boss_name()).ok().copied()
    }

    fn advance_boss_cursor(&mut self) {
        let len = self.config.boss_sequence.len();
        if len > 0 {
            self.boss_cursor = (self.boss_cursor + 1) % len;
        }
    }

    fn random_regular_entry(&mut self) -> Option<CatalogEntry> {
        let name = self.catalog.type_names().choose(&mut self.rng)?;
        self.catalog.get(name).ok().copied()
    }

    fn regular_replan_cooldown(&mut self) -> Duration {
        let low = self.config.regular_replan_min;
        let high = self.config.regular_replan_max.max(low);
        self.rng.gen_range(low..=high)
    }

    fn sample_position(
        &mut self,
        hitbox_size: Vec2,
        min_distance: f32,
        player: Vec2,
        occupancy: OccupancyView<'_>,
        obstacles: &[WorldRect],
    ) -> Option<Vec2> {
        let bounds = occupancy.bounds();
        let half = hitbox_size * 0.5;
        let (min_x, max_x) = (bounds.left() + half.x, bounds.right() - half.x);
        let (min_y, max_y) = (bounds.top() + half.y, bounds.bottom() - half.y);
        if !(min_x < max_x && min_y < max_y) {
            return None;
        }

        let min_distance_squared = min_distance * min_distance;
        for _ in 0..self.config.max_attempts {
            let candidate = Vec2::new(
                self.rng.gen_range(min_x..max_x),
                self.rng.gen_range(min_y..max_y),
            );
            if candidate.distance_squared(player) <= min_distance_squared {
                continue;
            }
            let footprint = WorldRect::from_center(candidate, hitbox_size);
            if !bounds.contains_rect(&footprint) {
                continue;
            }
            if obstacles.iter().any(|obstacle| obstacle.overlaps(&footprint)) {
                continue;
            }
            return Some(candidate);
        }
        None
    }
}
