#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Survival engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems never hold references
//! into the world between ticks; they read immutable snapshots such as
//! [`AgentView`] and [`OccupancyView`] and respond with new command batches.

use std::{collections::BTreeMap, time::Duration};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when a session boots.
pub const WELCOME_BANNER: &str = "Welcome to Horde Survival.";

/// Side length of a square map tile measured in world pixels.
pub const DEFAULT_TILE_SIZE: f32 = 64.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Loads a new arena and rasterizes its static obstacles.
    ConfigureArena {
        /// Number of tile columns in the arena.
        columns: u32,
        /// Number of tile rows in the arena.
        rows: u32,
        /// Side length of a tile in world pixels.
        tile_size: f32,
        /// World-space obstacle rectangles from the collision and object layers.
        obstacles: Vec<WorldRect>,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Publishes the player's current world position.
    SetPlayerPosition {
        /// Centre of the player in world pixels.
        position: Vec2,
    },
    /// Inserts a new agent into the registry.
    SpawnAgent {
        /// Behaviour variant of the new agent.
        variant: AgentVariant,
        /// Centre of the agent in world pixels.
        position: Vec2,
        /// Width and height of the agent's collision hitbox.
        hitbox_size: Vec2,
        /// Fully scaled stat profile applied to the agent.
        profile: StatProfile,
        /// Minimum time between two path recomputations for the agent.
        replan_cooldown: Duration,
    },
    /// Relocates an agent after motion integration.
    MoveAgent {
        /// Identifier of the agent being moved.
        agent: AgentId,
        /// Collision-resolved hitbox the agent occupies after moving.
        hitbox: WorldRect,
        /// Normalized direction the agent travelled in this tick.
        heading: Vec2,
        /// Freshly computed path direction, when the agent replanned this tick.
        plan: Option<PathPlan>,
    },
    /// Applies combat damage to an agent.
    DamageAgent {
        /// Identifier of the agent being hit.
        agent: AgentId,
        /// Amount of health removed by the hit.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new arena was loaded and the registry cleared.
    ArenaConfigured {
        /// Number of tile columns in the arena.
        columns: u32,
        /// Number of tile rows in the arena.
        rows: u32,
    },
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Total session time elapsed after applying the tick.
        elapsed: Duration,
    },
    /// Confirms that an agent was inserted into the registry.
    AgentSpawned {
        /// Identifier assigned to the new agent.
        agent: AgentId,
        /// Behaviour variant of the agent.
        variant: AgentVariant,
        /// Centre of the agent in world pixels.
        position: Vec2,
    },
    /// Confirms that an agent changed position.
    AgentMoved {
        /// Identifier of the agent that moved.
        agent: AgentId,
        /// Centre before the move.
        from: Vec2,
        /// Centre after the move.
        to: Vec2,
    },
    /// Reports that an agent survived a hit.
    AgentDamaged {
        /// Identifier of the agent that was hit.
        agent: AgentId,
        /// Health remaining after the hit.
        remaining: u32,
    },
    /// Reports that an agent's health reached zero. Emitted exactly once per agent.
    AgentDied {
        /// Identifier of the agent that died.
        agent: AgentId,
        /// Behaviour variant of the agent.
        variant: AgentVariant,
        /// Experience granted for the kill.
        exp_reward: u32,
    },
    /// Reports that a dying agent left the registry.
    AgentRemoved {
        /// Identifier of the removed agent.
        agent: AgentId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle measured in world pixels. `y` grows downwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl WorldRect {
    /// Creates a rectangle from its top-left corner and extents.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle of the provided size centred on `center`.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x * 0.5,
            center.y - size.y * 0.5,
            size.x,
            size.y,
        )
    }

    /// Left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Moves the rectangle so its left edge sits at `x`.
    pub fn set_left(&mut self, x: f32) {
        self.x = x;
    }

    /// Moves the rectangle so its right edge sits at `x`.
    pub fn set_right(&mut self, x: f32) {
        self.x = x - self.width;
    }

    /// Moves the rectangle so its top edge sits at `y`.
    pub fn set_top(&mut self, y: f32) {
        self.y = y;
    }

    /// Moves the rectangle so its bottom edge sits at `y`.
    pub fn set_bottom(&mut self, y: f32) {
        self.y = y - self.height;
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Reports whether the rectangle has finite coordinates and a positive area.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Reports whether the interiors of two rectangles intersect.
    ///
    /// Rectangles that merely share an edge do not overlap, so an agent resting
    /// flush against a wall is not considered colliding with it.
    #[must_use]
    pub fn overlaps(&self, other: &WorldRect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Reports whether `other` lies entirely within this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &WorldRect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }
}

/// Read-only view into the static occupancy grid built from arena obstacles.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [bool],
    columns: u32,
    rows: u32,
    tile_size: f32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [bool], columns: u32, rows: u32, tile_size: f32) -> Self {
        Self {
            cells,
            columns,
            rows,
            tile_size,
        }
    }

    /// Reports whether the tile is blocked. Tiles outside the grid are blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(true)
    }

    /// Converts a world position into the tile containing it.
    ///
    /// Returns `None` for non-finite positions and positions outside the grid.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if self.tile_size.is_nan() || self.tile_size <= 0.0 || !position.is_finite() {
            return None;
        }
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }

        let column = (position.x / self.tile_size).floor();
        let row = (position.y / self.tile_size).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// World-space centre of the provided tile.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.tile_size,
            (cell.row() as f32 + 0.5) * self.tile_size,
        )
    }

    /// Row-major index of the tile, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            let index = row.checked_mul(width)?.checked_add(column)?;
            (index < self.cells.len()).then_some(index)
        } else {
            None
        }
    }

    /// Tile stored at the provided row-major index.
    #[must_use]
    pub fn cell_from_index(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cells.len() || self.columns == 0 {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Provides the dimensions of the grid in tiles.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Arena bounds in world pixels.
    #[must_use]
    pub fn bounds(&self) -> WorldRect {
        WorldRect::new(
            0.0,
            0.0,
            self.columns as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }
}

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Balanced chaser.
    Basic,
    /// Fragile and quick.
    Fast,
    /// Slow with a large health pool.
    Tank,
    /// Weaves side to side while chasing.
    Zigzag,
}

impl EnemyKind {
    /// Baseline stats for the kind before any difficulty scaling.
    #[must_use]
    pub const fn default_profile(self) -> StatProfile {
        match self {
            Self::Basic => StatProfile::new(50, 150.0, 10, 10),
            Self::Fast => StatProfile::new(30, 250.0, 15, 15),
            Self::Tank => StatProfile::new(150, 80.0, 25, 25),
            Self::Zigzag => StatProfile::new(40, 180.0, 12, 20),
        }
    }
}

/// Behaviour variant of an agent: a regular enemy or a boss wrapping a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentVariant {
    /// Regular horde member.
    Regular(EnemyKind),
    /// Boss built on top of an enemy kind.
    Boss(EnemyKind),
}

impl AgentVariant {
    /// Underlying enemy kind.
    #[must_use]
    pub const fn kind(self) -> EnemyKind {
        match self {
            Self::Regular(kind) | Self::Boss(kind) => kind,
        }
    }

    /// Reports whether the variant is a boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss(_))
    }
}

/// Combat and movement stats of an agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatProfile {
    /// Starting and maximum health.
    pub max_health: u32,
    /// Movement speed in world pixels per second.
    pub speed: f32,
    /// Damage dealt to the player on contact.
    pub contact_damage: u32,
    /// Experience granted when the agent is killed.
    pub exp_reward: u32,
}

impl StatProfile {
    /// Creates a new stat profile.
    #[must_use]
    pub const fn new(max_health: u32, speed: f32, contact_damage: u32, exp_reward: u32) -> Self {
        Self {
            max_health,
            speed,
            contact_damage,
            exp_reward,
        }
    }

    /// Applies per-stat multipliers, rounding integer stats to the nearest value.
    ///
    /// Health never drops below one so a scaled agent is always killable
    /// exactly once.
    #[must_use]
    pub fn scaled(self, scale: StatScale) -> Self {
        Self {
            max_health: scale_u32(self.max_health, scale.health).max(1),
            speed: (self.speed * scale.speed).max(0.0),
            contact_damage: scale_u32(self.contact_damage, scale.contact_damage),
            exp_reward: scale_u32(self.exp_reward, scale.exp_reward),
        }
    }
}

/// Per-stat multipliers applied on top of a [`StatProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatScale {
    /// Health multiplier.
    pub health: f32,
    /// Speed multiplier.
    pub speed: f32,
    /// Contact damage multiplier.
    pub contact_damage: f32,
    /// Experience reward multiplier.
    pub exp_reward: f32,
}

impl StatScale {
    /// Scale that leaves every stat untouched.
    pub const IDENTITY: StatScale = StatScale::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new scale.
    #[must_use]
    pub const fn new(health: f32, speed: f32, contact_damage: f32, exp_reward: f32) -> Self {
        Self {
            health,
            speed,
            contact_damage,
            exp_reward,
        }
    }

    /// Multiplies two scales component-wise.
    #[must_use]
    pub fn then(self, other: StatScale) -> Self {
        Self {
            health: self.health * other.health,
            speed: self.speed * other.speed,
            contact_damage: self.contact_damage * other.contact_damage,
            exp_reward: self.exp_reward * other.exp_reward,
        }
    }
}

impl Default for StatScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn scale_u32(value: u32, factor: f32) -> u32 {
    let scaled = (value as f32 * factor).round();
    if !scaled.is_finite() || scaled <= 0.0 {
        0
    } else if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Catalog entry resolving an enemy type name to its archetype and stats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Archetype that drives the agent's movement behaviour.
    pub kind: EnemyKind,
    /// Baseline stats for the type.
    pub profile: StatProfile,
}

impl CatalogEntry {
    /// Creates an entry that uses the kind's default profile.
    #[must_use]
    pub const fn from_kind(kind: EnemyKind) -> Self {
        Self {
            kind,
            profile: kind.default_profile(),
        }
    }
}

/// Errors raised by [`EnemyCatalog`] lookups.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No entry is registered under the requested type name.
    #[error("unknown enemy type `{0}`")]
    UnknownEnemyType(String),
}

/// Mapping from enemy type names to stat profiles, injected by the asset layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl EnemyCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Registers an entry, returning the entry previously stored under the name.
    pub fn insert(&mut self, name: impl Into<String>, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(name.into(), entry)
    }

    /// Resolves a type name.
    pub fn get(&self, name: &str) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEnemyType(name.to_owned()))
    }

    /// Registered type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EnemyCatalog {
    fn default() -> Self {
        let mut catalog = Self::new();
        for (name, kind) in [
            ("slime", EnemyKind::Basic),
            ("redblob", EnemyKind::Basic),
            ("ghost", EnemyKind::Basic),
            ("books", EnemyKind::Fast),
            ("toast", EnemyKind::Tank),
            ("paper", EnemyKind::Tank),
            ("spider", EnemyKind::Zigzag),
        ] {
            let _ = catalog.insert(name, CatalogEntry::from_kind(kind));
        }
        catalog
    }
}

/// Cached result of the most recent path query for an agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPlan {
    /// Normalized next-step direction; zero when no path was found.
    pub direction: Vec2,
    /// Session time at which the direction was computed.
    pub computed_at: Duration,
}

/// Lifecycle stage of an agent that is still present in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// The agent moves and can be damaged.
    Alive,
    /// The agent was killed and lingers for its death visual.
    Dying {
        /// Time left before the agent leaves the registry.
        remaining: Duration,
    },
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Unique identifier assigned to the agent.
    pub id: AgentId,
    /// Behaviour variant of the agent.
    pub variant: AgentVariant,
    /// Centre of the agent's hitbox in world pixels.
    pub position: Vec2,
    /// Collision hitbox in world pixels.
    pub hitbox: WorldRect,
    /// Normalized direction the agent moved in during its last step.
    pub heading: Vec2,
    /// Movement speed in world pixels per second.
    pub speed: f32,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Damage dealt to the player on contact.
    pub contact_damage: u32,
    /// Cached path query result, if the agent planned at least once.
    pub plan: Option<PathPlan>,
    /// Minimum time between two path recomputations.
    pub replan_cooldown: Duration,
    /// Lifecycle stage of the agent.
    pub lifecycle: Lifecycle,
}

impl AgentSnapshot {
    /// Reports whether the agent is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// Reports whether the agent is a boss.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.variant.is_boss()
    }

    /// Remaining health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }
}

/// Read-only snapshot describing every agent in the registry.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over agents that are still alive.
    pub fn alive(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.is_alive())
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured agents, dying ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn default_catalog_round_trips_through_bincode() {
        assert_round_trip(&EnemyCatalog::default());
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let wall = WorldRect::new(64.0, 0.0, 64.0, 64.0);
        let flush = WorldRect::new(32.0, 10.0, 32.0, 20.0);
        let inside = WorldRect::new(33.0, 10.0, 32.0, 20.0);

        assert!(!wall.overlaps(&flush));
        assert!(wall.overlaps(&inside));
        assert!(inside.overlaps(&wall));
    }

    #[test]
    fn from_center_preserves_center() {
        let rect = WorldRect::from_center(Vec2::new(100.0, 50.0), Vec2::new(44.0, 24.0));
        assert_eq!(rect.center(), Vec2::new(100.0, 50.0));
        assert_eq!(rect.left(), 78.0);
        assert_eq!(rect.bottom(), 62.0);
    }

    #[test]
    fn occupancy_view_treats_outside_tiles_as_blocked() {
        let cells = vec![false; 4];
        let view = OccupancyView::new(&cells, 2, 2, 64.0);

        assert!(!view.is_blocked(CellCoord::new(1, 1)));
        assert!(view.is_blocked(CellCoord::new(2, 0)));
        assert!(view.is_blocked(CellCoord::new(0, 2)));
    }

    #[test]
    fn cell_at_rejects_positions_outside_grid() {
        let cells = vec![false; 100];
        let view = OccupancyView::new(&cells, 10, 10, 64.0);

        assert_eq!(view.cell_at(Vec2::new(0.0, 0.0)), Some(CellCoord::new(0, 0)));
        assert_eq!(
            view.cell_at(Vec2::new(639.0, 639.0)),
            Some(CellCoord::new(9, 9))
        );
        assert_eq!(view.cell_at(Vec2::new(640.0, 10.0)), None);
        assert_eq!(view.cell_at(Vec2::new(-0.5, 10.0)), None);
        assert_eq!(view.cell_at(Vec2::new(f32::NAN, 10.0)), None);
    }

    #[test]
    fn cell_index_round_trips() {
        let cells = vec![false; 12];
        let view = OccupancyView::new(&cells, 4, 3, 32.0);
        let cell = CellCoord::new(3, 2);

        let index = view.index(cell).expect("index");
        assert_eq!(index, 11);
        assert_eq!(view.cell_from_index(index), Some(cell));
        assert_eq!(view.cell_from_index(12), None);
    }

    #[test]
    fn index_stays_within_the_backing_slice() {
        let cells = vec![false; 4];
        let view = OccupancyView::new(&cells, 10, 10, 64.0);

        assert_eq!(view.index(CellCoord::new(3, 0)), Some(3));
        assert_eq!(view.index(CellCoord::new(4, 0)), None);
        assert_eq!(view.index(CellCoord::new(5, 5)), None);
        assert_eq!(view.cell_from_index(4), None);
    }

    #[test]
    fn catalog_reports_unknown_types() {
        let catalog = EnemyCatalog::default();

        assert_eq!(
            catalog.get("toast").map(|entry| entry.kind),
            Ok(EnemyKind::Tank)
        );
        assert_eq!(
            catalog.get("dragon"),
            Err(CatalogError::UnknownEnemyType("dragon".to_owned()))
        );
    }

    #[test]
    fn scaled_profile_keeps_agents_killable() {
        let profile = EnemyKind::Fast.default_profile();
        let scaled = profile.scaled(StatScale::new(0.0, 1.0, 2.0, 10.0));

        assert_eq!(scaled.max_health, 1);
        assert_eq!(scaled.contact_damage, 30);
        assert_eq!(scaled.exp_reward, 150);
    }

    #[test]
    fn health_fraction_handles_zero_max() {
        let mut snapshot = AgentSnapshot {
            id: AgentId::new(1),
            variant: AgentVariant::Regular(EnemyKind::Basic),
            position: Vec2::ZERO,
            hitbox: WorldRect::new(0.0, 0.0, 1.0, 1.0),
            heading: Vec2::ZERO,
            speed: 1.0,
            health: 25,
            max_health: 50,
            contact_damage: 1,
            plan: None,
            replan_cooldown: Duration::ZERO,
            lifecycle: Lifecycle::Alive,
        };
        assert!((snapshot.health_fraction() - 0.5).abs() < f32::EPSILON);

        snapshot.max_health = 0;
        assert_eq!(snapshot.health_fraction(), 0.0);
    }
}
