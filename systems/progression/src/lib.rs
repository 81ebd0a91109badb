#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player progression: experience, levels, upgrades and session score.
//!
//! The system listens for `AgentDied` events. The world emits that event
//! exactly once per agent, so each kill is rewarded exactly once.

mod upgrades;

use std::time::Duration;

use horde_survival_core::Event;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use upgrades::{Upgrade, UpgradeError, Upgrades};

const BASE_MAX_HEALTH: u32 = 100;
const BASE_DAMAGE: u32 = 10;
const BASE_SPEED: f32 = 300.0;
const BASE_EXP_TO_NEXT: u32 = 100;
const HEALTH_PER_LEVEL: u32 = 20;
const DAMAGE_PER_LEVEL: u32 = 2;
const SPEED_PER_LEVEL: f32 = 5.0;
const MAX_LIFESTEAL_CHANCE: f32 = 0.15;
const MICROS_PER_POINT: u64 = 1_000_000;

/// Multiplicative and additive adjustments granted by upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Movement speed multiplier.
    pub speed_mul: f32,
    /// Weapon damage multiplier.
    pub damage_mul: f32,
    /// Weapon cooldown multiplier.
    pub cooldown_mul: f32,
    /// Experience gain multiplier.
    pub exp_mul: f32,
    /// Chance of healing one point of health per hit.
    pub lifesteal_chance: f32,
    /// Projectiles fired per shot.
    pub multi_shot_count: u32,
    /// Flat maximum health added on top of the level curve.
    pub max_health_bonus: u32,
    /// Health restored per second of session time.
    pub regen_per_second: f32,
}

impl StatModifier {
    /// Modifier that changes nothing.
    pub const IDENTITY: StatModifier = StatModifier {
        speed_mul: 1.0,
        damage_mul: 1.0,
        cooldown_mul: 1.0,
        exp_mul: 1.0,
        lifesteal_chance: 0.0,
        multi_shot_count: 1,
        max_health_bonus: 0,
        regen_per_second: 0.0,
    };

    /// Combines two modifiers.
    ///
    /// Multipliers compose multiplicatively, lifesteal chances add up to the
    /// cap, flat bonuses add up and the larger multi-shot count wins.
    #[must_use]
    pub fn compose(self, other: StatModifier) -> Self {
        Self {
            speed_mul: self.speed_mul * other.speed_mul,
            damage_mul: self.damage_mul * other.damage_mul,
            cooldown_mul: self.cooldown_mul * other.cooldown_mul,
            exp_mul: self.exp_mul * other.exp_mul,
            lifesteal_chance: (self.lifesteal_chance + other.lifesteal_chance)
                .clamp(0.0, MAX_LIFESTEAL_CHANCE),
            multi_shot_count: self.multi_shot_count.max(other.multi_shot_count),
            max_health_bonus: self.max_health_bonus.saturating_add(other.max_health_bonus),
            regen_per_second: (self.regen_per_second + other.regen_per_second).max(0.0),
        }
    }
}

impl Default for StatModifier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Applies a modifier to player stats without touching the input.
///
/// A maximum health bonus also heals the player by the same amount.
#[must_use]
pub fn apply_modifier(stats: PlayerStats, modifier: StatModifier) -> PlayerStats {
    PlayerStats {
        max_health: stats.max_health.saturating_add(modifier.max_health_bonus),
        health: stats.health.saturating_add(modifier.max_health_bonus),
        modifiers: stats.modifiers.compose(modifier),
        ..stats
    }
}

/// Player attributes tracked across a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    max_health: u32,
    health: u32,
    damage: u32,
    speed: f32,
    level: u32,
    exp: u32,
    exp_to_next: u32,
    kills: u32,
    modifiers: StatModifier,
    regen_micros: u64,
}

impl PlayerStats {
    /// Stats of a fresh level-one player.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_health: BASE_MAX_HEALTH,
            health: BASE_MAX_HEALTH,
            damage: BASE_DAMAGE,
            speed: BASE_SPEED,
            level: 1,
            exp: 0,
            exp_to_next: BASE_EXP_TO_NEXT,
            kills: 0,
            modifiers: StatModifier::IDENTITY,
            regen_micros: 0,
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Current level, starting at one.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience collected toward the next level.
    #[must_use]
    pub const fn exp(&self) -> u32 {
        self.exp
    }

    /// Experience required for the next level.
    #[must_use]
    pub const fn exp_to_next(&self) -> u32 {
        self.exp_to_next
    }

    /// Number of kills credited to the player.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Accumulated upgrade modifiers.
    #[must_use]
    pub const fn modifiers(&self) -> StatModifier {
        self.modifiers
    }

    /// Reports whether the player still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Weapon damage after modifiers, rounded to the nearest point.
    #[must_use]
    pub fn effective_damage(&self) -> u32 {
        let scaled = (self.damage as f32 * self.modifiers.damage_mul).round();
        if scaled.is_finite() && scaled > 0.0 {
            scaled as u32
        } else {
            0
        }
    }

    /// Movement speed after modifiers.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        (self.speed * self.modifiers.speed_mul).max(0.0)
    }

    /// Weapon cooldown after modifiers, rounded to whole microseconds.
    #[must_use]
    pub fn attack_cooldown(&self, base: Duration) -> Duration {
        let scaled = base.as_micros() as f64 * f64::from(self.modifiers.cooldown_mul);
        if scaled.is_finite() && scaled > 0.0 {
            Duration::from_micros(scaled.round() as u64)
        } else {
            Duration::ZERO
        }
    }

    /// Credits a kill worth `exp_reward` and returns the number of levels gained.
    pub fn award_kill(&mut self, exp_reward: u32) -> u32 {
        let gained = (exp_reward as f32 * self.modifiers.exp_mul).floor();
        let gained = if gained.is_finite() && gained > 0.0 {
            gained as u32
        } else {
            0
        };
        self.exp = self.exp.saturating_add(gained);
        self.kills = self.kills.saturating_add(1);

        let mut levels = 0;
        while self.exp_to_next > 0 && self.exp >= self.exp_to_next {
            self.exp -= self.exp_to_next;
            self.level_up();
            levels += 1;
        }
        levels
    }

    /// Removes health and reports whether this hit killed the player.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.health == 0 {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    /// Restores health up to the maximum.
    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(self.max_health);
    }

    /// Applies regeneration for `dt` and returns the whole points healed.
    ///
    /// Fractions carry over to later calls. A dead player does not regenerate.
    pub fn regenerate(&mut self, dt: Duration) -> u32 {
        let rate = self.modifiers.regen_per_second;
        if !self.is_alive() || rate <= 0.0 || !rate.is_finite() {
            return 0;
        }
        // Progress is tracked in millionths of a point so ticks add up exactly.
        let gained = (f64::from(rate) * dt.as_micros() as f64).round() as u64;
        self.regen_micros = self.regen_micros.saturating_add(gained);
        let points = u32::try_from(self.regen_micros / MICROS_PER_POINT).unwrap_or(u32::MAX);
        self.regen_micros %= MICROS_PER_POINT;
        let before = self.health;
        self.heal(points);
        self.health - before
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.exp_to_next = (self.exp_to_next as f32 * 1.5).floor() as u32;
        self.max_health += HEALTH_PER_LEVEL;
        self.health += HEALTH_PER_LEVEL;
        self.damage += DAMAGE_PER_LEVEL;
        self.speed += SPEED_PER_LEVEL;
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Session score: kills, levels and survival time, with time counted in tenths of a second.
#[must_use]
pub fn score(kills: u32, level: u32, elapsed: Duration) -> u64 {
    let tenths = u64::try_from(elapsed.as_millis() / 100).unwrap_or(u64::MAX);
    u64::from(kills) * 100 + u64::from(level) * 500 + tenths
}

/// Pure system that turns kill events into experience and levels.
#[derive(Debug, Default)]
pub struct Progression {
    stats: PlayerStats,
    upgrades: Upgrades,
    elapsed: Duration,
}

impl Progression {
    /// Creates a progression tracker for a fresh player.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current player stats.
    #[must_use]
    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Mutable access for combat resolution (damage and healing).
    pub fn stats_mut(&mut self) -> &mut PlayerStats {
        &mut self.stats
    }

    /// Upgrade levels acquired so far.
    #[must_use]
    pub fn upgrades(&self) -> &Upgrades {
        &self.upgrades
    }

    /// Session score at the most recently observed time.
    #[must_use]
    pub fn score(&self) -> u64 {
        score(self.stats.kills(), self.stats.level(), self.elapsed)
    }

    /// Consumes world events and returns the number of levels gained.
    pub fn handle(&mut self, events: &[Event]) -> u32 {
        let mut levels = 0;
        for event in events {
            match event {
                Event::ArenaConfigured { .. } => {
                    self.stats = PlayerStats::new();
                    self.upgrades = Upgrades::default();
                    self.elapsed = Duration::ZERO;
                }
                Event::TimeAdvanced { dt, elapsed } => {
                    self.elapsed = *elapsed;
                    let _ = self.stats.regenerate(*dt);
                }
                Event::AgentDied { exp_reward, .. } => {
                    let gained = self.stats.award_kill(*exp_reward);
                    if gained > 0 {
                        info!(
                            level = self.stats.level(),
                            max_health = self.stats.max_health(),
                            "player levelled up"
                        );
                    }
                    levels += gained;
                }
                _ => {}
            }
        }
        levels
    }

    /// Takes the next level of `upgrade` and folds its modifier into the stats.
    pub fn choose_upgrade(&mut self, upgrade: Upgrade) -> Result<u32, UpgradeError> {
        let level = self.upgrades.acquire(upgrade)?;
        self.stats = apply_modifier(self.stats, upgrade.modifier(level));
        info!(?upgrade, level, "upgrade acquired");
        Ok(level)
    }
}
