use std::time::Duration;

use horde_survival_core::{
    AgentId, AgentSnapshot, AgentVariant, Lifecycle, PathPlan, StatProfile, Vec2, WorldRect,
};

/// Time a killed agent lingers in the registry for its death visual.
pub const DEATH_DURATION: Duration = Duration::from_millis(400);

#[derive(Clone, Debug)]
pub(crate) struct Agent {
    id: AgentId,
    variant: AgentVariant,
    hitbox: WorldRect,
    heading: Vec2,
    speed: f32,
    health: u32,
    max_health: u32,
    contact_damage: u32,
    exp_reward: u32,
    plan: Option<PathPlan>,
    replan_cooldown: Duration,
    lifecycle: Lifecycle,
    reward_claimed: bool,
}

impl Agent {
    pub(crate) fn spawn(
        id: AgentId,
        variant: AgentVariant,
        position: Vec2,
        hitbox_size: Vec2,
        profile: StatProfile,
        replan_cooldown: Duration,
    ) -> Self {
        let max_health = profile.max_health.max(1);
        Self {
            id,
            variant,
            hitbox: WorldRect::from_center(position, hitbox_size.max(Vec2::ONE)),
            heading: Vec2::ZERO,
            speed: profile.speed,
            health: max_health,
            max_health,
            contact_damage: profile.contact_damage,
            exp_reward: profile.exp_reward,
            plan: None,
            replan_cooldown,
            lifecycle: Lifecycle::Alive,
            reward_claimed: false,
        }
    }

    pub(crate) fn id(&self) -> AgentId {
        self.id
    }

    pub(crate) fn variant(&self) -> AgentVariant {
        self.variant
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.hitbox.center()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    pub(crate) fn health(&self) -> u32 {
        self.health
    }

    /// Applies a hit and reports whether this hit killed the agent.
    ///
    /// Agents that are already dying ignore further damage, so the death edge
    /// is observed exactly once.
    pub(crate) fn take_damage(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.lifecycle = Lifecycle::Dying {
                remaining: DEATH_DURATION,
            };
            self.heading = Vec2::ZERO;
            return true;
        }
        false
    }

    /// Hands out the experience reward once; later calls return `None`.
    pub(crate) fn claim_reward(&mut self) -> Option<u32> {
        if self.is_alive() || self.reward_claimed {
            return None;
        }
        self.reward_claimed = true;
        Some(self.exp_reward)
    }

    /// Counts down the death timer and reports whether the agent should leave.
    pub(crate) fn advance_dying(&mut self, dt: Duration) -> bool {
        match self.lifecycle {
            Lifecycle::Alive => false,
            Lifecycle::Dying { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                self.lifecycle = Lifecycle::Dying { remaining };
                remaining.is_zero()
            }
        }
    }

    pub(crate) fn relocate(&mut self, hitbox: WorldRect, heading: Vec2, plan: Option<PathPlan>) {
        if !self.is_alive() {
            return;
        }
        if hitbox.is_well_formed() {
            self.hitbox = hitbox;
        }
        if heading.is_finite() {
            self.heading = heading;
        }
        if let Some(plan) = plan {
            self.plan = Some(plan);
        }
    }

    pub(crate) fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            variant: self.variant,
            position: self.position(),
            hitbox: self.hitbox,
            heading: self.heading,
            speed: self.speed,
            health: self.health,
            max_health: self.max_health,
            contact_damage: self.contact_damage,
            plan: self.plan,
            replan_cooldown: self.replan_cooldown,
            lifecycle: self.lifecycle,
        }
    }
}
