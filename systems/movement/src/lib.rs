#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent motion controller that chases the player through the arena.
//!
//! Every tick each living agent blends a throttled path-planner direction
//! with a flocking force, integrates the result by its speed and resolves the
//! step against static obstacles. All agents read the tick-start snapshot, so
//! the outcome does not depend on the order in which agents are processed.

mod collision;

use std::time::Duration;

use horde_survival_core::{
    AgentSnapshot, AgentView, Command, EnemyKind, Event, OccupancyView, PathPlan, Vec2, WorldRect,
};
use horde_survival_system_flocking::{self as flocking, Flocking};
use horde_survival_system_pathfinding::{PathPlanner, SearchStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use collision::resolve_translation;

/// Phase offset between consecutive agent identifiers, in radians.
const ZIGZAG_PHASE_SPREAD: f32 = 2.399_963;

/// Weights used to blend the path direction with the flocking force.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionTuning {
    /// Weight of the path-planner direction.
    pub path_weight: f32,
    /// Weight of the flocking force.
    pub flock_weight: f32,
}

impl MotionTuning {
    /// Creates a tuning from explicit weights.
    #[must_use]
    pub const fn new(path_weight: f32, flock_weight: f32) -> Self {
        Self {
            path_weight,
            flock_weight,
        }
    }

    /// Blend used by regular agents.
    #[must_use]
    pub const fn regular() -> Self {
        Self::new(0.7, 0.3)
    }

    /// Blend used by bosses, which barely react to the crowd.
    #[must_use]
    pub const fn boss() -> Self {
        Self::new(0.7, 0.1)
    }

    /// Normalized weighted sum of the two directions.
    #[must_use]
    pub fn blend(&self, path: Vec2, flock: Vec2) -> Vec2 {
        (path * self.path_weight + flock * self.flock_weight).normalize_or_zero()
    }
}

/// Side-to-side weave applied to zigzag agents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZigzagTuning {
    /// Phase velocity in radians per second of session time.
    pub frequency: f32,
    /// Length of the perpendicular offset relative to the unit path direction.
    pub amplitude: f32,
}

impl Default for ZigzagTuning {
    fn default() -> Self {
        Self {
            frequency: 6.0,
            amplitude: 0.5,
        }
    }
}

/// Configuration of the movement system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Blend for regular agents.
    pub regular: MotionTuning,
    /// Blend for bosses.
    pub boss: MotionTuning,
    /// Flocking radii and weights.
    pub flocking: flocking::Config,
    /// Weave applied to zigzag agents.
    pub zigzag: ZigzagTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regular: MotionTuning::regular(),
            boss: MotionTuning::boss(),
            flocking: flocking::Config::default(),
            zigzag: ZigzagTuning::default(),
        }
    }
}

/// Pure system that reacts to clock events and emits agent movement commands.
#[derive(Debug)]
pub struct Movement {
    config: Config,
    planner: PathPlanner,
    flocking: Flocking,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            planner: PathPlanner::new(),
            flocking: Flocking::new(config.flocking),
        }
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// Nothing is emitted unless the events contain at least one
    /// `TimeAdvanced` entry.
    pub fn handle(
        &mut self,
        events: &[Event],
        agents: &AgentView,
        occupancy: OccupancyView<'_>,
        obstacles: &[WorldRect],
        player: Vec2,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        let mut now = None;
        for event in events {
            if let Event::TimeAdvanced {
                dt: step,
                elapsed,
            } = event
            {
                dt = dt.saturating_add(*step);
                now = Some(*elapsed);
            }
        }
        let Some(now) = now else {
            return;
        };

        for agent in agents.alive() {
            let command = self.step_agent(agent, agents, occupancy, obstacles, player, dt, now);
            out.extend(command);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_agent(
        &mut self,
        agent: &AgentSnapshot,
        agents: &AgentView,
        occupancy: OccupancyView<'_>,
        obstacles: &[WorldRect],
        player: Vec2,
        dt: Duration,
        now: Duration,
    ) -> Option<Command> {
        let replan = match agent.plan {
            Some(plan) => now.saturating_sub(plan.computed_at) >= agent.replan_cooldown,
            None => true,
        };

        let fresh_plan = if replan {
            let strategy = SearchStrategy::for_variant(agent.variant);
            let direction = self
                .planner
                .direction(strategy, agent.position, player, occupancy);
            debug!(
                agent = agent.id.get(),
                ?strategy,
                expanded = self.planner.last_expanded(),
                reachable = direction != Vec2::ZERO,
                "replanned path"
            );
            Some(PathPlan {
                direction,
                computed_at: now,
            })
        } else {
            None
        };

        let planned = fresh_plan
            .or(agent.plan)
            .map_or(Vec2::ZERO, |plan| plan.direction);
        let path_direction =
            self.variant_modifier(agent, with_fallback(planned, agent.position, player), now);

        let flock = self.flocking.force(agent, agents);
        let tuning = if agent.is_boss() {
            self.config.boss
        } else {
            self.config.regular
        };
        let heading = tuning.blend(path_direction, flock);

        let delta = heading * agent.speed * dt.as_secs_f32();
        let hitbox = resolve_translation(agent.hitbox, delta, obstacles);

        if hitbox == agent.hitbox && heading == agent.heading && fresh_plan.is_none() {
            return None;
        }

        Some(Command::MoveAgent {
            agent: agent.id,
            hitbox,
            heading,
            plan: fresh_plan,
        })
    }

    fn variant_modifier(&self, agent: &AgentSnapshot, direction: Vec2, now: Duration) -> Vec2 {
        match agent.variant.kind() {
            EnemyKind::Zigzag => {
                let zigzag = self.config.zigzag;
                let phase = now.as_secs_f32() * zigzag.frequency
                    + agent.id.get() as f32 * ZIGZAG_PHASE_SPREAD;
                weave(direction, phase, zigzag.amplitude)
            }
            EnemyKind::Basic | EnemyKind::Fast | EnemyKind::Tank => direction,
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Straight-line direction used when the planner found no route.
fn with_fallback(planned: Vec2, position: Vec2, target: Vec2) -> Vec2 {
    if planned != Vec2::ZERO {
        return planned;
    }
    (target - position).normalize_or_zero()
}

/// Adds a perpendicular offset of `sin(phase) * amplitude` and renormalizes.
fn weave(direction: Vec2, phase: f32, amplitude: f32) -> Vec2 {
    if direction == Vec2::ZERO {
        return direction;
    }
    (direction + direction.perp() * phase.sin() * amplitude).normalize_or_zero()
}
