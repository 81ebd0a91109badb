#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Local steering forces that keep the horde from clumping.
//!
//! Each agent looks at the living agents inside its perception radius and
//! combines three classic boids rules: separation pushes away from close
//! neighbours, alignment follows their average heading and cohesion pulls
//! toward their centroid. Neighbour discovery is a linear scan of the agent
//! view, so the cost per tick grows with the square of the population.

use horde_survival_core::{AgentSnapshot, AgentView, Vec2};
use serde::{Deserialize, Serialize};

/// Radius and rule weights used when computing a flocking force.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlockingTuning {
    /// Neighbours farther than this many world pixels are ignored.
    pub perception_radius: f32,
    /// Weight of the separation rule.
    pub separation_weight: f32,
    /// Weight of the alignment rule.
    pub alignment_weight: f32,
    /// Weight of the cohesion rule.
    pub cohesion_weight: f32,
}

impl FlockingTuning {
    /// Creates a tuning from explicit values.
    #[must_use]
    pub const fn new(
        perception_radius: f32,
        separation_weight: f32,
        alignment_weight: f32,
        cohesion_weight: f32,
    ) -> Self {
        Self {
            perception_radius,
            separation_weight,
            alignment_weight,
            cohesion_weight,
        }
    }

    /// Tuning for regular horde members.
    #[must_use]
    pub const fn regular() -> Self {
        Self::new(100.0, 1.5, 1.0, 0.8)
    }

    /// Tuning for bosses: wider perception and a weaker urge to separate.
    #[must_use]
    pub const fn boss() -> Self {
        Self::new(200.0, 0.5, 1.0, 0.8)
    }
}

/// Configuration of the flocking system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tuning applied to regular agents.
    pub regular: FlockingTuning,
    /// Tuning applied to bosses.
    pub boss: FlockingTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            regular: FlockingTuning::regular(),
            boss: FlockingTuning::boss(),
        }
    }
}

/// Position and heading of a neighbour inside the perception radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Centre of the neighbour.
    pub position: Vec2,
    /// Direction the neighbour moved in during its last step.
    pub heading: Vec2,
}

/// Steering force calculator with a reusable neighbour buffer.
#[derive(Debug, Default)]
pub struct Flocking {
    config: Config,
    scratch: Vec<Neighbor>,
}

impl Flocking {
    /// Creates a flocking calculator using the provided configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scratch: Vec::new(),
        }
    }

    /// Tuning applied to the provided agent.
    #[must_use]
    pub fn tuning_for(&self, agent: &AgentSnapshot) -> FlockingTuning {
        if agent.is_boss() {
            self.config.boss
        } else {
            self.config.regular
        }
    }

    /// Computes the normalized flocking force for `agent` against the view.
    ///
    /// Returns the zero vector when no living neighbour is in range.
    pub fn force(&mut self, agent: &AgentSnapshot, agents: &AgentView) -> Vec2 {
        let tuning = self.tuning_for(agent);
        gather_neighbors(agent, agents, tuning.perception_radius, &mut self.scratch);
        combine(agent.position, &self.scratch, tuning)
    }
}

/// Collects living agents within `radius` of `agent`, excluding the agent itself.
pub fn gather_neighbors(
    agent: &AgentSnapshot,
    agents: &AgentView,
    radius: f32,
    out: &mut Vec<Neighbor>,
) {
    out.clear();
    let radius_squared = radius * radius;
    out.extend(
        agents
            .alive()
            .filter(|other| other.id != agent.id)
            .filter(|other| other.position.distance_squared(agent.position) <= radius_squared)
            .map(|other| Neighbor {
                position: other.position,
                heading: other.heading,
            }),
    );
}

/// Weighted, normalized sum of the three rules.
#[must_use]
pub fn combine(position: Vec2, neighbors: &[Neighbor], tuning: FlockingTuning) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }

    let total = separation(position, neighbors) * tuning.separation_weight
        + alignment(neighbors) * tuning.alignment_weight
        + cohesion(position, neighbors) * tuning.cohesion_weight;
    total.normalize_or_zero()
}

/// Pushes away from neighbours with an inverse-square falloff.
///
/// Neighbours sharing the agent's exact position have no defined push
/// direction and are skipped.
#[must_use]
pub fn separation(position: Vec2, neighbors: &[Neighbor]) -> Vec2 {
    let mut steering = Vec2::ZERO;
    for neighbor in neighbors {
        let offset = position - neighbor.position;
        let distance_squared = offset.length_squared();
        if distance_squared <= f32::EPSILON {
            continue;
        }
        steering += offset.normalize_or_zero() / distance_squared;
    }
    steering.normalize_or_zero()
}

/// Average heading of the neighbours.
#[must_use]
pub fn alignment(neighbors: &[Neighbor]) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    let sum: Vec2 = neighbors.iter().map(|neighbor| neighbor.heading).sum();
    (sum / neighbors.len() as f32).normalize_or_zero()
}

/// Direction toward the neighbours' centroid.
#[must_use]
pub fn cohesion(position: Vec2, neighbors: &[Neighbor]) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    let sum: Vec2 = neighbors.iter().map(|neighbor| neighbor.position).sum();
    let centroid = sum / neighbors.len() as f32;
    (centroid - position).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Neighbor {
        Neighbor {
            position: Vec2::new(x, y),
            heading: Vec2::ZERO,
        }
    }

    fn approx(actual: Vec2, expected: Vec2) -> bool {
        (actual - expected).length() < 1e-5
    }

    #[test]
    fn empty_neighbourhood_produces_no_force() {
        let position = Vec2::new(10.0, 10.0);

        assert_eq!(separation(position, &[]), Vec2::ZERO);
        assert_eq!(alignment(&[]), Vec2::ZERO);
        assert_eq!(cohesion(position, &[]), Vec2::ZERO);
        assert_eq!(combine(position, &[], FlockingTuning::regular()), Vec2::ZERO);
    }

    #[test]
    fn opposite_equidistant_neighbours_cancel() {
        let position = Vec2::new(100.0, 100.0);
        let neighbors = [at(70.0, 100.0), at(130.0, 100.0)];

        assert_eq!(separation(position, &neighbors), Vec2::ZERO);
        assert_eq!(cohesion(position, &neighbors), Vec2::ZERO);
        assert_eq!(combine(position, &neighbors, FlockingTuning::regular()), Vec2::ZERO);
    }

    #[test]
    fn separation_prefers_pushing_away_from_closer_neighbour() {
        let position = Vec2::ZERO;
        let neighbors = [at(10.0, 0.0), at(0.0, -50.0)];

        let push = separation(position, &neighbors);

        assert!(push.x < 0.0);
        assert!(push.y > 0.0);
        assert!(push.x.abs() > push.y.abs());
        assert!((push.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn coincident_neighbour_is_skipped_by_separation_only() {
        let position = Vec2::new(5.0, 5.0);
        let neighbors = [
            Neighbor {
                position,
                heading: Vec2::X,
            },
            at(5.0, 25.0),
        ];

        assert!(approx(separation(position, &neighbors), Vec2::NEG_Y));
        assert!(approx(alignment(&neighbors), Vec2::X));
        assert!(approx(cohesion(position, &neighbors), Vec2::Y));
    }

    #[test]
    fn alignment_follows_average_heading() {
        let neighbors = [
            Neighbor {
                position: Vec2::ZERO,
                heading: Vec2::X,
            },
            Neighbor {
                position: Vec2::ZERO,
                heading: Vec2::Y,
            },
        ];

        assert!(approx(alignment(&neighbors), Vec2::new(1.0, 1.0).normalize()));
    }

    #[test]
    fn boss_tuning_widens_perception_and_softens_separation() {
        let regular = FlockingTuning::regular();
        let boss = FlockingTuning::boss();

        assert_eq!(regular.perception_radius, 100.0);
        assert_eq!(boss.perception_radius, 200.0);
        assert!(boss.separation_weight < regular.separation_weight);
        assert_eq!(boss.alignment_weight, regular.alignment_weight);
        assert_eq!(boss.cohesion_weight, regular.cohesion_weight);
    }
}
