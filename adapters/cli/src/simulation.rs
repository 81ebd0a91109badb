//! Fixed-step session loop: the world, the systems, a scripted player and
//! an auto-weapon standing in for the combat layer.

use std::{f32::consts::TAU, fmt, time::Duration};

use horde_survival_core::{AgentSnapshot, AgentView, Command, Event, Vec2, WorldRect};
use horde_survival_system_movement::{resolve_translation, Movement};
use horde_survival_system_progression::{Progression, Upgrade};
use horde_survival_system_spawning::Spawning;
use horde_survival_world::{self as world, query, World};
use rand::{seq::IteratorRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PlayerSettings, SessionConfig, WeaponSettings};

/// Keeps combat rolls on a different stream than spawn sampling.
const COMBAT_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Running counters reported in the summary.
#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    spawned: u32,
    bosses_spawned: u32,
    bosses_killed: u32,
    shots_fired: u32,
    damage_taken: u32,
    lifesteal_heals: u32,
}

/// One headless session.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    spawning: Spawning,
    movement: Movement,
    progression: Progression,
    rng: ChaCha8Rng,
    seed: u64,
    player: PlayerSettings,
    weapon: WeaponSettings,
    weapon_ready_in: Duration,
    invulnerable_for: Duration,
    tally: Tally,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    /// Loads the arena and prepares every system for the first tick.
    pub(crate) fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let SessionConfig {
            arena,
            spawning,
            movement,
            player,
            weapon,
            catalog,
        } = config;

        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(&mut world, arena.command(), &mut events);
        let mut progression = Progression::new();
        let _ = progression.handle(&events);
        info!(
            columns = arena.columns,
            rows = arena.rows,
            obstacles = query::obstacles(&world).len(),
            enemy_types = catalog.len(),
            seed,
            "arena loaded"
        );

        Ok(Self {
            world,
            spawning: Spawning::new(spawning.to_config(seed), catalog),
            movement: Movement::new(movement),
            progression,
            rng: ChaCha8Rng::seed_from_u64(seed ^ COMBAT_STREAM),
            seed,
            player,
            weapon,
            weapon_ready_in: Duration::ZERO,
            invulnerable_for: Duration::ZERO,
            tally: Tally::default(),
            events: Vec::new(),
            commands: Vec::new(),
        })
    }

    /// Greeting published by the world.
    pub(crate) fn banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Steps the session until `length` of simulated time has passed or the player dies.
    pub(crate) fn run(&mut self, length: Duration, tick: Duration) -> Summary {
        if !tick.is_zero() {
            loop {
                let elapsed = query::elapsed(&self.world);
                if elapsed >= length || !self.progression.stats().is_alive() {
                    break;
                }
                self.step(tick.min(length - elapsed));
            }
        }

        let summary = self.summary();
        info!(
            survived_ms = summary.survived_ms,
            level = summary.level,
            kills = summary.kills,
            score = summary.score,
            "session finished"
        );
        summary
    }

    /// Advances the session by one tick.
    pub(crate) fn step(&mut self, dt: Duration) {
        self.events.clear();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);
        let player = self.steer_player(dt);
        world::apply(
            &mut self.world,
            Command::SetPlayerPosition { position: player },
            &mut self.events,
        );

        let agents = query::agent_view(&self.world);
        self.commands.clear();
        self.spawning.handle(
            &self.events,
            &agents,
            query::occupancy_view(&self.world),
            query::obstacles(&self.world),
            player,
            &mut self.commands,
        );
        self.movement.handle(
            &self.events,
            &agents,
            query::occupancy_view(&self.world),
            query::obstacles(&self.world),
            player,
            &mut self.commands,
        );
        self.flush_commands();

        let agents = query::agent_view(&self.world);
        self.resolve_contact(&agents, player, dt);
        self.fire_weapon(&agents, player, dt);
        self.flush_commands();

        self.record_events();
        let levels = self.progression.handle(&self.events);
        for _ in 0..levels {
            self.pick_upgrade();
        }
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Walks the player toward its point on the orbit, blocked by obstacles.
    fn steer_player(&self, dt: Duration) -> Vec2 {
        let bounds = query::occupancy_view(&self.world).bounds();
        let turns =
            query::elapsed(&self.world).as_secs_f32() / self.player.orbit_period().as_secs_f32();
        let angle = turns.fract() * TAU;
        let target =
            bounds.center() + Vec2::new(angle.cos(), angle.sin()) * self.player.orbit_radius;

        let current = query::player_position(&self.world);
        let offset = target - current;
        let reach = self.progression.stats().effective_speed() * dt.as_secs_f32();
        let delta = if offset.length() <= reach {
            offset
        } else {
            offset.normalize_or_zero() * reach
        };

        let hitbox = WorldRect::from_center(current, self.player.hitbox);
        let moved = resolve_translation(hitbox, delta, query::obstacles(&self.world)).center();
        let half = self.player.hitbox * 0.5;
        Vec2::new(
            moved.x.max(bounds.left() + half.x).min(bounds.right() - half.x),
            moved.y.max(bounds.top() + half.y).min(bounds.bottom() - half.y),
        )
    }

    /// The hardest-hitting agent touching the player lands its contact damage.
    fn resolve_contact(&mut self, agents: &AgentView, player: Vec2, dt: Duration) {
        self.invulnerable_for = self.invulnerable_for.saturating_sub(dt);
        if !self.invulnerable_for.is_zero() {
            return;
        }

        let hitbox = WorldRect::from_center(player, self.player.hitbox);
        let Some(attacker) = agents
            .alive()
            .filter(|agent| agent.hitbox.overlaps(&hitbox))
            .max_by_key(|agent| agent.contact_damage)
        else {
            return;
        };

        let damage = attacker.contact_damage;
        self.tally.damage_taken = self.tally.damage_taken.saturating_add(damage);
        self.invulnerable_for = self.player.invulnerability();
        let died = self.progression.stats_mut().take_damage(damage);
        debug!(
            agent = attacker.id.get(),
            damage,
            health = self.progression.stats().health(),
            "player hit"
        );
        if died {
            info!(elapsed = ?query::elapsed(&self.world), "player died");
        }
    }

    /// Hits the nearest agents in range, one per projectile, once the weapon is ready.
    fn fire_weapon(&mut self, agents: &AgentView, player: Vec2, dt: Duration) {
        self.weapon_ready_in = self.weapon_ready_in.saturating_sub(dt);
        if !self.weapon_ready_in.is_zero() || !self.progression.stats().is_alive() {
            return;
        }

        let mut targets: Vec<&AgentSnapshot> = agents
            .alive()
            .filter(|agent| agent.position.distance(player) <= self.weapon.range)
            .collect();
        if targets.is_empty() {
            return;
        }
        targets.sort_by(|a, b| {
            a.position
                .distance_squared(player)
                .total_cmp(&b.position.distance_squared(player))
                .then(a.id.cmp(&b.id))
        });

        let stats = *self.progression.stats();
        let damage = stats.effective_damage();
        let lifesteal = f64::from(stats.modifiers().lifesteal_chance.clamp(0.0, 1.0));
        let shots = usize::try_from(stats.modifiers().multi_shot_count.max(1)).unwrap_or(1);
        for target in targets.into_iter().take(shots) {
            self.commands.push(Command::DamageAgent {
                agent: target.id,
                amount: damage,
            });
            self.tally.shots_fired = self.tally.shots_fired.saturating_add(1);
            if lifesteal > 0.0 && self.rng.gen_bool(lifesteal) {
                self.progression.stats_mut().heal(1);
                self.tally.lifesteal_heals = self.tally.lifesteal_heals.saturating_add(1);
            }
        }
        self.weapon_ready_in = stats.attack_cooldown(self.weapon.cooldown());
    }

    fn record_events(&mut self) {
        for event in &self.events {
            match event {
                Event::AgentSpawned { variant, .. } => {
                    self.tally.spawned = self.tally.spawned.saturating_add(1);
                    if variant.is_boss() {
                        self.tally.bosses_spawned = self.tally.bosses_spawned.saturating_add(1);
                    }
                }
                Event::AgentDied { variant, .. } if variant.is_boss() => {
                    self.tally.bosses_killed = self.tally.bosses_killed.saturating_add(1);
                }
                _ => {}
            }
        }
    }

    /// Stands in for the upgrade menu by picking a random upgrade that can still level.
    fn pick_upgrade(&mut self) {
        let Some(upgrade) = self
            .progression
            .upgrades()
            .available()
            .choose(&mut self.rng)
        else {
            debug!("every upgrade is at its maximum level");
            return;
        };
        if let Err(error) = self.progression.choose_upgrade(upgrade) {
            warn!(%error, "upgrade rejected");
        }
    }

    fn summary(&self) -> Summary {
        let stats = self.progression.stats();
        let upgrades = Upgrade::ALL
            .into_iter()
            .map(|upgrade| UpgradeLevel {
                upgrade,
                level: self.progression.upgrades().level(upgrade),
            })
            .filter(|entry| entry.level > 0)
            .collect();

        Summary {
            seed: self.seed,
            survived_ms: u64::try_from(query::elapsed(&self.world).as_millis())
                .unwrap_or(u64::MAX),
            player_alive: stats.is_alive(),
            level: stats.level(),
            kills: stats.kills(),
            score: self.progression.score(),
            health: stats.health(),
            max_health: stats.max_health(),
            difficulty_multiplier: self.spawning.difficulty().multiplier,
            enemies_spawned: self.tally.spawned,
            bosses_spawned: self.tally.bosses_spawned,
            bosses_killed: self.tally.bosses_killed,
            enemies_alive: query::alive_count(&self.world),
            shots_fired: self.tally.shots_fired,
            damage_taken: self.tally.damage_taken,
            lifesteal_heals: self.tally.lifesteal_heals,
            upgrades,
        }
    }
}

/// Upgrade level reported in the summary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub(crate) struct UpgradeLevel {
    upgrade: Upgrade,
    level: u32,
}

/// Outcome of a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    seed: u64,
    survived_ms: u64,
    player_alive: bool,
    level: u32,
    kills: u32,
    score: u64,
    health: u32,
    max_health: u32,
    difficulty_multiplier: f32,
    enemies_spawned: u32,
    bosses_spawned: u32,
    bosses_killed: u32,
    enemies_alive: usize,
    shots_fired: u32,
    damage_taken: u32,
    lifesteal_heals: u32,
    upgrades: Vec<UpgradeLevel>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.player_alive { "survived" } else { "fell" };
        writeln!(
            f,
            "seed {}: player {outcome} after {:.1}s",
            self.seed,
            self.survived_ms as f64 / 1_000.0
        )?;
        writeln!(
            f,
            "level {}, {} kills, score {}, health {}/{}",
            self.level, self.kills, self.score, self.health, self.max_health
        )?;
        writeln!(
            f,
            "enemies: {} spawned ({} bosses, {} slain), {} still alive, difficulty x{:.1}",
            self.enemies_spawned,
            self.bosses_spawned,
            self.bosses_killed,
            self.enemies_alive,
            self.difficulty_multiplier
        )?;
        writeln!(
            f,
            "combat: {} shots, {} damage taken, {} lifesteal heals",
            self.shots_fired, self.damage_taken, self.lifesteal_heals
        )?;
        write!(f, "upgrades:")?;
        if self.upgrades.is_empty() {
            write!(f, " none")?;
        }
        for entry in &self.upgrades {
            write!(f, " {:?} {}", entry.upgrade, entry.level)?;
        }
        Ok(())
    }
}
