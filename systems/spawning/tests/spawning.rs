use std::time::Duration;

use horde_survival_core::{
    AgentVariant, AgentView, Command, EnemyCatalog, EnemyKind, Event, Vec2, WorldRect,
};
use horde_survival_system_spawning::{Config, Difficulty, Spawning};
use horde_survival_world::{self as world, query, StaticCollisionGrid, World};

const TILE: f32 = 64.0;

fn tick_events(dt: Duration, elapsed: Duration) -> Vec<Event> {
    vec![Event::TimeAdvanced { dt, elapsed }]
}

/// Runs the director over `seconds` of session time with one-second ticks.
fn run(
    spawning: &mut Spawning,
    grid: &StaticCollisionGrid,
    obstacles: &[WorldRect],
    player: Vec2,
    seconds: u64,
) -> Vec<Command> {
    let agents = AgentView::default();
    let mut commands = Vec::new();
    for second in 1..=seconds {
        spawning.handle(
            &tick_events(Duration::from_secs(1), Duration::from_secs(second)),
            &agents,
            grid.view(),
            obstacles,
            player,
            &mut commands,
        );
    }
    commands
}

fn boss_kinds(commands: &[Command]) -> Vec<EnemyKind> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnAgent {
                variant: AgentVariant::Boss(kind),
                ..
            } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn difficulty_is_monotonic() {
    let config = Config::default();
    let mut previous = Difficulty::at(Duration::ZERO, &config);

    for millis in (0..900_000u64).step_by(250) {
        let current = Difficulty::at(Duration::from_millis(millis), &config);
        assert!(current.multiplier >= previous.multiplier, "multiplier fell at {millis}ms");
        assert!(
            current.spawn_interval <= previous.spawn_interval,
            "interval grew at {millis}ms"
        );
        assert!(current.boss_waves >= previous.boss_waves);
        assert!(current.spawn_interval >= config.min_spawn_interval);
        previous = current;
    }
}

#[test]
fn boss_flags_follow_wave_cadence() {
    let mut spawning = Spawning::new(Config::default(), EnemyCatalog::default());

    let _ = spawning.update_difficulty(Duration::from_secs(179));
    assert_eq!(spawning.pending_bosses(), 0);
    assert!(!spawning.should_spawn());

    let _ = spawning.update_difficulty(Duration::from_secs(180));
    assert_eq!(spawning.pending_bosses(), 1);
    assert!(spawning.should_spawn());

    let _ = spawning.update_difficulty(Duration::from_secs(181));
    assert_eq!(spawning.pending_bosses(), 1);

    let _ = spawning.update_difficulty(Duration::from_secs(540));
    assert_eq!(spawning.pending_bosses(), 3);
}

#[test]
fn bosses_follow_the_sequence_and_wrap() {
    let config = Config {
        boss_sequence: vec!["toast".to_owned(), "books".to_owned()],
        ..Config::with_seed(3)
    };
    let grid = StaticCollisionGrid::build(&[], 40, 40, TILE);
    let mut spawning = Spawning::new(config, EnemyCatalog::default());

    let commands = run(&mut spawning, &grid, &[], Vec2::new(1_280.0, 1_280.0), 540);

    assert_eq!(
        boss_kinds(&commands),
        vec![EnemyKind::Tank, EnemyKind::Fast, EnemyKind::Tank]
    );
}

#[test]
fn bosses_are_scaled_and_plan_quickly() {
    let grid = StaticCollisionGrid::build(&[], 40, 40, TILE);
    let mut spawning = Spawning::new(Config::with_seed(5), EnemyCatalog::default());

    let commands = run(&mut spawning, &grid, &[], Vec2::new(200.0, 200.0), 180);

    let boss = commands
        .iter()
        .find_map(|command| match command {
            Command::SpawnAgent {
                variant: AgentVariant::Boss(kind),
                profile,
                replan_cooldown,
                hitbox_size,
                position,
            } => Some((*kind, *profile, *replan_cooldown, *hitbox_size, *position)),
            _ => None,
        })
        .expect("boss spawned at 180s");

    let (kind, profile, replan_cooldown, hitbox_size, position) = boss;
    assert_eq!(kind, EnemyKind::Tank);
    // 180s of play is six difficulty steps: multiplier 2.2.
    assert_eq!(profile.max_health, 3_300);
    assert_eq!(profile.contact_damage, 110);
    assert_eq!(profile.exp_reward, 250);
    assert!((profile.speed - 64.0).abs() < 1e-3);
    assert_eq!(replan_cooldown, Duration::from_millis(120));
    assert_eq!(hitbox_size, Vec2::new(108.0, 88.0));
    assert!(position.distance(Vec2::new(200.0, 200.0)) > 800.0);
}

#[test]
fn accepted_spawns_keep_their_distance() {
    let obstacles = vec![
        WorldRect::new(0.0, 1_000.0, 1_920.0, 64.0),
        WorldRect::new(1_200.0, 0.0, 64.0, 1_000.0),
    ];
    let grid = StaticCollisionGrid::build(&obstacles, 30, 30, TILE);
    let player = Vec2::new(500.0, 500.0);
    let mut spawning = Spawning::new(Config::with_seed(11), EnemyCatalog::default());

    let mut accepted = 0;
    for _ in 0..300 {
        let Some(Command::SpawnAgent {
            position,
            hitbox_size,
            ..
        }) = spawning.spawn_one(false, player, grid.view(), &obstacles)
        else {
            continue;
        };
        accepted += 1;
        assert!(position.distance(player) > 600.0, "{position:?} too close");
        let footprint = WorldRect::from_center(position, hitbox_size);
        assert!(grid.view().bounds().contains_rect(&footprint));
        assert!(obstacles.iter().all(|obstacle| !obstacle.overlaps(&footprint)));
    }
    assert!(accepted > 200, "only {accepted} spawns accepted");
}

#[test]
fn crowded_arena_gives_up_after_bounded_attempts() {
    let grid = StaticCollisionGrid::build(&[], 8, 8, TILE);
    let mut spawning = Spawning::new(Config::with_seed(1), EnemyCatalog::default());

    for _ in 0..50 {
        let spawned = spawning.spawn_one(false, Vec2::new(256.0, 256.0), grid.view(), &[]);
        assert!(spawned.is_none());
    }
}

#[test]
fn unreachable_boss_stays_pending() {
    let grid = StaticCollisionGrid::build(&[], 8, 8, TILE);
    let mut spawning = Spawning::new(Config::with_seed(2), EnemyCatalog::default());

    let commands = run(&mut spawning, &grid, &[], Vec2::new(256.0, 256.0), 200);

    assert!(boss_kinds(&commands).is_empty());
    assert_eq!(spawning.pending_bosses(), 1);
}

#[test]
fn unknown_boss_type_is_skipped() {
    let config = Config {
        boss_sequence: vec!["dragon".to_owned(), "spider".to_owned()],
        ..Config::with_seed(4)
    };
    let grid = StaticCollisionGrid::build(&[], 40, 40, TILE);
    let mut spawning = Spawning::new(config, EnemyCatalog::default());

    let commands = run(&mut spawning, &grid, &[], Vec2::new(100.0, 100.0), 360);

    assert_eq!(boss_kinds(&commands), vec![EnemyKind::Zigzag]);
    assert_eq!(spawning.pending_bosses(), 0);
}

#[test]
fn regular_spawns_follow_the_interval() {
    let grid = StaticCollisionGrid::build(&[], 40, 40, TILE);
    let mut spawning = Spawning::new(Config::with_seed(8), EnemyCatalog::default());
    let agents = AgentView::default();

    let mut spawned_at = Vec::new();
    for step in 1..=40u64 {
        let mut commands = Vec::new();
        spawning.handle(
            &tick_events(Duration::from_millis(250), Duration::from_millis(step * 250)),
            &agents,
            grid.view(),
            &[],
            Vec2::new(100.0, 100.0),
            &mut commands,
        );
        if !commands.is_empty() {
            spawned_at.push(step * 250);
        }
    }

    assert_eq!(spawned_at, vec![2_000, 4_000, 6_000, 8_000, 10_000]);
}

#[test]
fn population_cap_suppresses_regular_spawns_only() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureArena {
            columns: 40,
            rows: 40,
            tile_size: TILE,
            obstacles: Vec::new(),
        },
        &mut events,
    );
    for index in 0..2u8 {
        world::apply(
            &mut world,
            Command::SpawnAgent {
                variant: AgentVariant::Regular(EnemyKind::Basic),
                position: Vec2::new(100.0 + f32::from(index) * 50.0, 100.0),
                hitbox_size: Vec2::new(44.0, 24.0),
                profile: EnemyKind::Basic.default_profile(),
                replan_cooldown: Duration::from_millis(300),
            },
            &mut events,
        );
    }

    let config = Config {
        population_cap: 2,
        ..Config::with_seed(6)
    };
    let mut spawning = Spawning::new(config, EnemyCatalog::default());
    let agents = query::agent_view(&world);

    let mut commands = Vec::new();
    for second in 1..=180u64 {
        spawning.handle(
            &tick_events(Duration::from_secs(1), Duration::from_secs(second)),
            &agents,
            query::occupancy_view(&world),
            query::obstacles(&world),
            query::player_position(&world),
            &mut commands,
        );
    }

    assert_eq!(commands.len(), 1);
    assert_eq!(boss_kinds(&commands), vec![EnemyKind::Tank]);
}

#[test]
fn same_seed_replays_identically() {
    let obstacles = vec![WorldRect::new(640.0, 640.0, 256.0, 128.0)];
    let grid = StaticCollisionGrid::build(&obstacles, 30, 30, TILE);
    let player = Vec2::new(960.0, 960.0);

    let first = run(
        &mut Spawning::new(Config::with_seed(42), EnemyCatalog::default()),
        &grid,
        &obstacles,
        player,
        240,
    );
    let second = run(
        &mut Spawning::new(Config::with_seed(42), EnemyCatalog::default()),
        &grid,
        &obstacles,
        player,
        240,
    );
    let other = run(
        &mut Spawning::new(Config::with_seed(43), EnemyCatalog::default()),
        &grid,
        &obstacles,
        player,
        240,
    );

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn arena_reset_restarts_the_schedule() {
    let grid = StaticCollisionGrid::build(&[], 40, 40, TILE);
    let mut spawning = Spawning::new(Config::with_seed(7), EnemyCatalog::default());
    let _ = spawning.update_difficulty(Duration::from_secs(400));
    assert_eq!(spawning.pending_bosses(), 2);

    let mut commands = Vec::new();
    spawning.handle(
        &[Event::ArenaConfigured {
            columns: 40,
            rows: 40,
        }],
        &AgentView::default(),
        grid.view(),
        &[],
        Vec2::ZERO,
        &mut commands,
    );

    assert!(commands.is_empty());
    assert_eq!(spawning.pending_bosses(), 0);
    assert_eq!(spawning.difficulty().multiplier, 1.0);
}
