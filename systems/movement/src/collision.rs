use horde_survival_core::{Vec2, WorldRect};

const MAX_SUBSTEPS: u32 = 64;

/// Translates `hitbox` by `delta`, resolving overlaps against static obstacles.
///
/// Motion is applied along X first, then along Y. After each axis move every
/// overlapping obstacle clamps the hitbox edge that faces the direction of
/// travel flush against the obstacle edge. Long moves are split into
/// sub-steps no larger than half the hitbox's smaller extent so thin walls
/// cannot be skipped in a single step.
#[must_use]
pub fn resolve_translation(hitbox: WorldRect, delta: Vec2, obstacles: &[WorldRect]) -> WorldRect {
    if !delta.is_finite() || delta == Vec2::ZERO {
        return hitbox;
    }

    let max_step = (hitbox.width.min(hitbox.height) * 0.5).max(1.0);
    let substeps = (delta.abs().max_element() / max_step)
        .ceil()
        .clamp(1.0, MAX_SUBSTEPS as f32);
    let step = delta / substeps;

    let mut resolved = hitbox;
    for _ in 0..substeps as u32 {
        resolved = move_axis(resolved, step.x, Axis::Horizontal, obstacles);
        resolved = move_axis(resolved, step.y, Axis::Vertical, obstacles);
    }
    resolved
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn move_axis(mut rect: WorldRect, amount: f32, axis: Axis, obstacles: &[WorldRect]) -> WorldRect {
    if amount == 0.0 {
        return rect;
    }

    match axis {
        Axis::Horizontal => rect.x += amount,
        Axis::Vertical => rect.y += amount,
    }

    for obstacle in obstacles.iter().filter(|obstacle| obstacle.is_well_formed()) {
        if !rect.overlaps(obstacle) {
            continue;
        }
        match (axis, amount > 0.0) {
            (Axis::Horizontal, true) => rect.set_right(obstacle.left()),
            (Axis::Horizontal, false) => rect.set_left(obstacle.right()),
            (Axis::Vertical, true) => rect.set_bottom(obstacle.top()),
            (Axis::Vertical, false) => rect.set_top(obstacle.bottom()),
        }
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> WorldRect {
        WorldRect::new(100.0, 0.0, 20.0, 200.0)
    }

    #[test]
    fn free_motion_is_unchanged() {
        let hitbox = WorldRect::new(10.0, 10.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(5.0, -3.0), &[wall()]);

        assert_eq!(moved, WorldRect::new(15.0, 7.0, 20.0, 20.0));
    }

    #[test]
    fn moving_into_wall_ends_flush() {
        let hitbox = WorldRect::new(70.0, 50.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(25.0, 0.0), &[wall()]);

        assert_eq!(moved.right(), 100.0);
        assert!(!moved.overlaps(&wall()));
    }

    #[test]
    fn blocked_axis_does_not_stop_sliding() {
        let hitbox = WorldRect::new(75.0, 50.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(10.0, 8.0), &[wall()]);

        assert_eq!(moved.right(), 100.0);
        assert_eq!(moved.top(), 58.0);
    }

    #[test]
    fn moving_left_clamps_to_right_edge() {
        let hitbox = WorldRect::new(125.0, 50.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(-10.0, 0.0), &[wall()]);

        assert_eq!(moved.left(), 120.0);
    }

    #[test]
    fn vertical_motion_resolves_against_floor() {
        let floor = WorldRect::new(0.0, 100.0, 300.0, 10.0);
        let hitbox = WorldRect::new(20.0, 70.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(0.0, 30.0), &[floor]);

        assert_eq!(moved.bottom(), 100.0);
    }

    #[test]
    fn large_steps_do_not_tunnel_through_thin_walls() {
        let thin = WorldRect::new(100.0, 0.0, 2.0, 200.0);
        let hitbox = WorldRect::new(50.0, 50.0, 20.0, 20.0);
        let moved = resolve_translation(hitbox, Vec2::new(200.0, 0.0), &[thin]);

        assert_eq!(moved.right(), 100.0);
    }

    #[test]
    fn non_finite_delta_is_ignored() {
        let hitbox = WorldRect::new(10.0, 10.0, 20.0, 20.0);

        assert_eq!(
            resolve_translation(hitbox, Vec2::new(f32::NAN, 1.0), &[]),
            hitbox
        );
    }
}
