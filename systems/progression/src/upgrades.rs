use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StatModifier;

/// Upgrades the player can pick on level-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Upgrade {
    /// +15% movement speed per level.
    SpeedBoost,
    /// +15% weapon damage per level.
    Overclock,
    /// One extra projectile per level.
    MultiShot,
    /// +5% chance per level to heal on hit, capped at 15%.
    Lifesteal,
    /// -10% weapon cooldown per level.
    CooldownReduction,
    /// +25% experience gain per level.
    ExpBoost,
    /// +20 maximum health per level.
    Vitality,
    /// +1 health per second per level.
    Regeneration,
}

impl Upgrade {
    /// Every upgrade in declaration order.
    pub const ALL: [Upgrade; 8] = [
        Self::SpeedBoost,
        Self::Overclock,
        Self::MultiShot,
        Self::Lifesteal,
        Self::CooldownReduction,
        Self::ExpBoost,
        Self::Vitality,
        Self::Regeneration,
    ];

    /// Highest level the upgrade can reach.
    #[must_use]
    pub const fn max_level(self) -> u32 {
        match self {
            Self::Lifesteal => 3,
            Self::SpeedBoost
            | Self::Overclock
            | Self::MultiShot
            | Self::CooldownReduction
            | Self::ExpBoost
            | Self::Vitality
            | Self::Regeneration => 5,
        }
    }

    /// Modifier granted when the upgrade reaches `level`.
    ///
    /// Each level contributes its own step, so composing the modifiers of
    /// levels `1..=n` yields the total effect of level `n`.
    #[must_use]
    pub fn modifier(self, level: u32) -> StatModifier {
        let identity = StatModifier::IDENTITY;
        match self {
            Self::SpeedBoost => StatModifier {
                speed_mul: 1.15,
                ..identity
            },
            Self::Overclock => StatModifier {
                damage_mul: 1.15,
                ..identity
            },
            Self::MultiShot => StatModifier {
                multi_shot_count: 1 + level,
                ..identity
            },
            Self::Lifesteal => StatModifier {
                lifesteal_chance: 0.05,
                ..identity
            },
            Self::CooldownReduction => StatModifier {
                cooldown_mul: 0.9,
                ..identity
            },
            Self::ExpBoost => StatModifier {
                exp_mul: 1.25,
                ..identity
            },
            Self::Vitality => StatModifier {
                max_health_bonus: 20,
                ..identity
            },
            Self::Regeneration => StatModifier {
                regen_per_second: 1.0,
                ..identity
            },
        }
    }
}

/// Errors raised when acquiring upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum UpgradeError {
    /// The upgrade already reached its highest level.
    #[error("{upgrade:?} is already at its maximum level {max_level}")]
    MaxLevel {
        /// Upgrade that could not be taken.
        upgrade: Upgrade,
        /// Highest level of the upgrade.
        max_level: u32,
    },
}

/// Levels acquired per upgrade.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Upgrades {
    levels: BTreeMap<Upgrade, u32>,
}

impl Upgrades {
    /// Current level of the upgrade, zero when never taken.
    #[must_use]
    pub fn level(&self, upgrade: Upgrade) -> u32 {
        self.levels.get(&upgrade).copied().unwrap_or(0)
    }

    /// Reports whether the upgrade can still be levelled.
    #[must_use]
    pub fn can_upgrade(&self, upgrade: Upgrade) -> bool {
        self.level(upgrade) < upgrade.max_level()
    }

    /// Upgrades that have not reached their maximum level, in declaration order.
    pub fn available(&self) -> impl Iterator<Item = Upgrade> + '_ {
        Upgrade::ALL
            .into_iter()
            .filter(|upgrade| self.can_upgrade(*upgrade))
    }

    /// Raises the upgrade by one level and returns the new level.
    pub fn acquire(&mut self, upgrade: Upgrade) -> Result<u32, UpgradeError> {
        if !self.can_upgrade(upgrade) {
            return Err(UpgradeError::MaxLevel {
                upgrade,
                max_level: upgrade.max_level(),
            });
        }
        let level = self.levels.entry(upgrade).or_insert(0);
        *level += 1;
        Ok(*level)
    }
}
