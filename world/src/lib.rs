#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Horde Survival.
//!
//! The world owns the agent registry, the static collision grid and the
//! session clock. It is mutated exclusively through [`apply`] and read through
//! the functions in [`query`].

mod agent;
mod collision;

use std::time::Duration;

use horde_survival_core::{
    AgentId, Command, Event, Vec2, WorldRect, DEFAULT_TILE_SIZE, WELCOME_BANNER,
};

use agent::Agent;
pub use agent::DEATH_DURATION;
pub use collision::StaticCollisionGrid;

const DEFAULT_ARENA_COLUMNS: u32 = 20;
const DEFAULT_ARENA_ROWS: u32 = 12;

/// Represents the authoritative Horde Survival world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: StaticCollisionGrid,
    obstacles: Vec<WorldRect>,
    agents: Vec<Agent>,
    next_agent_id: u32,
    player: Vec2,
    elapsed: Duration,
}

impl World {
    /// Creates a new world with an open default arena and the player at its centre.
    #[must_use]
    pub fn new() -> Self {
        let grid = StaticCollisionGrid::build(
            &[],
            DEFAULT_ARENA_COLUMNS,
            DEFAULT_ARENA_ROWS,
            DEFAULT_TILE_SIZE,
        );
        let player = grid.view().bounds().center();
        Self {
            banner: WELCOME_BANNER,
            grid,
            obstacles: Vec::new(),
            agents: Vec::new(),
            next_agent_id: 0,
            player,
            elapsed: Duration::ZERO,
        }
    }

    fn agent_mut(&mut self, agent_id: AgentId) -> Option<&mut Agent> {
        self.agents
            .binary_search_by_key(&agent_id, Agent::id)
            .ok()
            .and_then(|index| self.agents.get_mut(index))
    }

    fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        id
    }

    fn advance_dying_agents(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut expired: Vec<AgentId> = Vec::new();
        for agent in &mut self.agents {
            if agent.advance_dying(dt) {
                expired.push(agent.id());
            }
        }

        if expired.is_empty() {
            return;
        }

        self.agents.retain(|agent| !expired.contains(&agent.id()));
        for agent in expired {
            out_events.push(Event::AgentRemoved { agent });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureArena {
            columns,
            rows,
            tile_size,
            obstacles,
        } => {
            world.grid = StaticCollisionGrid::build(&obstacles, columns, rows, tile_size);
            world.obstacles = obstacles
                .into_iter()
                .filter(WorldRect::is_well_formed)
                .collect();
            world.agents.clear();
            world.elapsed = Duration::ZERO;
            world.player = world.grid.view().bounds().center();
            out_events.push(Event::ArenaConfigured { columns, rows });
        }
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: world.elapsed,
            });
            world.advance_dying_agents(dt, out_events);
        }
        Command::SetPlayerPosition { position } => {
            if position.is_finite() {
                world.player = position;
            }
        }
        Command::SpawnAgent {
            variant,
            position,
            hitbox_size,
            profile,
            replan_cooldown,
        } => {
            if !position.is_finite() || !hitbox_size.is_finite() {
                return;
            }
            let agent = world.allocate_agent_id();
            world.agents.push(Agent::spawn(
                agent,
                variant,
                position,
                hitbox_size,
                profile,
                replan_cooldown,
            ));
            out_events.push(Event::AgentSpawned {
                agent,
                variant,
                position,
            });
        }
        Command::MoveAgent {
            agent,
            hitbox,
            heading,
            plan,
        } => {
            let Some(entry) = world.agent_mut(agent) else {
                return;
            };
            if !entry.is_alive() {
                return;
            }

            let from = entry.position();
            entry.relocate(hitbox, heading, plan);
            let to = entry.position();
            if from != to {
                out_events.push(Event::AgentMoved { agent, from, to });
            }
        }
        Command::DamageAgent { agent, amount } => {
            let Some(entry) = world.agent_mut(agent) else {
                return;
            };
            if !entry.is_alive() {
                return;
            }

            if entry.take_damage(amount) {
                if let Some(exp_reward) = entry.claim_reward() {
                    out_events.push(Event::AgentDied {
                        agent,
                        variant: entry.variant(),
                        exp_reward,
                    });
                }
            } else {
                out_events.push(Event::AgentDamaged {
                    agent,
                    remaining: entry.health(),
                });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use horde_survival_core::{AgentView, OccupancyView, Vec2, WorldRect};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures a read-only snapshot of every agent in the registry.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.agents.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Number of agents that are alive, excluding dying ones.
    #[must_use]
    pub fn alive_count(world: &World) -> usize {
        world.agents.iter().filter(|agent| agent.is_alive()).count()
    }

    /// Exposes a read-only view of the static occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.grid.view()
    }

    /// Well-formed obstacle rectangles of the current arena.
    #[must_use]
    pub fn obstacles(world: &World) -> &[WorldRect] {
        &world.obstacles
    }

    /// Current world position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> Vec2 {
        world.player
    }

    /// Session time elapsed since the arena was configured.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_survival_core::{AgentVariant, EnemyKind, Lifecycle, StatProfile};

    fn configure(world: &mut World, obstacles: Vec<WorldRect>) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::ConfigureArena {
                columns: 10,
                rows: 10,
                tile_size: 64.0,
                obstacles,
            },
            &mut events,
        );
        events
    }

    fn spawn(world: &mut World, position: Vec2) -> AgentId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnAgent {
                variant: AgentVariant::Regular(EnemyKind::Basic),
                position,
                hitbox_size: Vec2::new(44.0, 24.0),
                profile: StatProfile::new(50, 150.0, 10, 10),
                replan_cooldown: Duration::from_millis(300),
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::AgentSpawned { agent, .. }] => *agent,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn configure_arena_rasterizes_obstacles_and_resets_registry() {
        let mut world = World::new();
        let _ = spawn(&mut world, Vec2::new(10.0, 10.0));

        let events = configure(
            &mut world,
            vec![
                WorldRect::new(320.0, 320.0, 64.0, 64.0),
                WorldRect::new(0.0, 0.0, -4.0, 10.0),
            ],
        );

        assert_eq!(
            events,
            vec![Event::ArenaConfigured {
                columns: 10,
                rows: 10
            }]
        );
        assert!(query::agent_view(&world).is_empty());
        assert_eq!(query::obstacles(&world).len(), 1);
        assert_eq!(query::player_position(&world), Vec2::new(320.0, 320.0));
        let occupancy = query::occupancy_view(&world);
        assert!(occupancy.is_blocked(horde_survival_core::CellCoord::new(5, 5)));
    }

    #[test]
    fn agent_ids_are_allocated_monotonically() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());

        let first = spawn(&mut world, Vec2::new(10.0, 10.0));
        let second = spawn(&mut world, Vec2::new(200.0, 10.0));

        assert!(first < second);
        let view = query::agent_view(&world);
        assert_eq!(view.len(), 2);
        assert_eq!(view.get(second).map(|agent| agent.position), Some(Vec2::new(200.0, 10.0)));
    }

    #[test]
    fn lethal_damage_emits_single_death_and_single_removal() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());
        let agent = spawn(&mut world, Vec2::new(100.0, 100.0));

        let mut events = Vec::new();
        apply(&mut world, Command::DamageAgent { agent, amount: 20 }, &mut events);
        apply(&mut world, Command::DamageAgent { agent, amount: 40 }, &mut events);
        apply(&mut world, Command::DamageAgent { agent, amount: 40 }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::AgentDamaged {
                    agent,
                    remaining: 30
                },
                Event::AgentDied {
                    agent,
                    variant: AgentVariant::Regular(EnemyKind::Basic),
                    exp_reward: 10,
                },
            ]
        );
        assert_eq!(query::alive_count(&world), 0);
        assert!(matches!(
            query::agent_view(&world).get(agent).map(|snapshot| snapshot.lifecycle),
            Some(Lifecycle::Dying { .. })
        ));

        let mut removal_events = Vec::new();
        for _ in 0..10 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(100),
                },
                &mut removal_events,
            );
        }
        let removals: Vec<_> = removal_events
            .iter()
            .filter(|event| matches!(event, Event::AgentRemoved { .. }))
            .collect();
        assert_eq!(removals, vec![&Event::AgentRemoved { agent }]);
        assert!(query::agent_view(&world).is_empty());
    }

    #[test]
    fn removal_waits_for_death_duration() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());
        let agent = spawn(&mut world, Vec2::new(100.0, 100.0));

        let mut events = Vec::new();
        apply(&mut world, Command::DamageAgent { agent, amount: 500 }, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::Tick {
                dt: DEATH_DURATION - Duration::from_millis(1),
            },
            &mut events,
        );
        assert_eq!(query::agent_view(&world).len(), 1);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(1),
            },
            &mut events,
        );
        assert!(query::agent_view(&world).is_empty());
        assert_eq!(events.last(), Some(&Event::AgentRemoved { agent }));
    }

    #[test]
    fn move_agent_updates_position_and_plan() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());
        let agent = spawn(&mut world, Vec2::new(100.0, 100.0));
        let plan = horde_survival_core::PathPlan {
            direction: Vec2::X,
            computed_at: Duration::from_millis(16),
        };

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveAgent {
                agent,
                hitbox: WorldRect::from_center(Vec2::new(110.0, 100.0), Vec2::new(44.0, 24.0)),
                heading: Vec2::X,
                plan: Some(plan),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::AgentMoved {
                agent,
                from: Vec2::new(100.0, 100.0),
                to: Vec2::new(110.0, 100.0),
            }]
        );
        let view = query::agent_view(&world);
        let snapshot = view.get(agent).expect("agent present");
        assert_eq!(snapshot.plan, Some(plan));
        assert_eq!(snapshot.heading, Vec2::X);
    }

    #[test]
    fn commands_for_removed_agents_are_ignored() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());
        let agent = spawn(&mut world, Vec2::new(100.0, 100.0));

        let mut events = Vec::new();
        apply(&mut world, Command::DamageAgent { agent, amount: 50 }, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: DEATH_DURATION,
            },
            &mut events,
        );
        events.clear();

        apply(&mut world, Command::DamageAgent { agent, amount: 50 }, &mut events);
        apply(
            &mut world,
            Command::MoveAgent {
                agent,
                hitbox: WorldRect::new(0.0, 0.0, 10.0, 10.0),
                heading: Vec2::Y,
                plan: None,
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn tick_reports_elapsed_session_time() {
        let mut world = World::new();
        let _ = configure(&mut world, Vec::new());

        let mut events = Vec::new();
        for _ in 0..3 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(500),
                },
                &mut events,
            );
        }

        assert_eq!(
            events.last(),
            Some(&Event::TimeAdvanced {
                dt: Duration::from_millis(500),
                elapsed: Duration::from_millis(1_500),
            })
        );
        assert_eq!(query::elapsed(&world), Duration::from_millis(1_500));
    }
}
