//! Pure collision geometry: AABB overlap, circle-vs-AABB closest-point
//! tests, wall bounces and the platform's angled bounce.
//!
//! Everything here is side-effect free; callers apply the returned
//! corrections and directions themselves.

use glam::Vec2;

use crate::consts::{FIELD_MAX, FIELD_MIN, PLATFORM_HALF_HEIGHT, PLATFORM_STEEPNESS, PLATFORM_Y};
use crate::normalize_or;

const EPSILON: f32 = 1e-6;

/// Strict axis-aligned overlap test; touching edges do not collide
pub fn aabb_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> bool {
    (a_pos.x - b_pos.x).abs() < a_half.x + b_half.x
        && (a_pos.y - b_pos.y).abs() < a_half.y + b_half.y
}

/// Result of a circle-vs-box hit: where to put the ball and where it goes next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub position: Vec2,
    pub direction: Vec2,
}

/// Which play-field wall the ball ran into this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WallHit {
    Side(Hit),
    Top(Hit),
    /// Bottom wall: life lost, direction left untouched
    Bottom,
}

/// Closest point on the box to the circle center, clamped per axis
fn closest_point(center: Vec2, box_pos: Vec2, box_half: Vec2) -> Vec2 {
    box_pos + (center - box_pos).clamp(-box_half, box_half)
}

/// Circle-vs-AABB test against a brick.
///
/// Reports a hit only when the ball center is strictly closer than its
/// radius to the box (tangency is exclusive). The reflection flips the axis
/// the closest point was clamped on, x before y. A degenerate hit with the
/// center on the box surface pushes out along the reversed incoming
/// direction instead of dividing by zero.
pub fn ball_brick_collision(
    ball_pos: Vec2,
    radius: f32,
    dir: Vec2,
    brick_pos: Vec2,
    brick_half: Vec2,
) -> Option<Hit> {
    let closest = closest_point(ball_pos, brick_pos, brick_half);
    let delta = ball_pos - closest;
    let dist = delta.length();
    if dist >= radius {
        return None;
    }

    let mut new_dir = dir;
    if (closest.x - (brick_pos.x - brick_half.x)).abs() < EPSILON
        || (closest.x - (brick_pos.x + brick_half.x)).abs() < EPSILON
    {
        new_dir.x = -new_dir.x;
    } else {
        new_dir.y = -new_dir.y;
    }

    let out = if dist > EPSILON {
        delta / dist
    } else {
        normalize_or(-dir, Vec2::Y)
    };
    Some(Hit {
        position: closest + out * radius,
        direction: new_dir,
    })
}

/// Circle-vs-AABB test against the platform.
///
/// The bounce direction depends on where along the platform's width the hit
/// landed: shallow near the center, steep near the edges. The ball bounces
/// upward and is repositioned onto the platform's top edge, so a hit is only
/// reported for a descending ball whose center has not yet fallen below the
/// platform's midline; a ball past that line is on its way out and must
/// reach the bottom wall instead.
pub fn ball_platform_collision(
    ball_pos: Vec2,
    radius: f32,
    dir: Vec2,
    platform_x: f32,
    platform_half_width: f32,
) -> Option<Hit> {
    if dir.y >= 0.0 || ball_pos.y < PLATFORM_Y {
        return None;
    }
    let plat_pos = Vec2::new(platform_x, PLATFORM_Y);
    let plat_half = Vec2::new(platform_half_width, PLATFORM_HALF_HEIGHT);
    let closest = closest_point(ball_pos, plat_pos, plat_half);
    if ball_pos.distance(closest) >= radius {
        return None;
    }

    let angle_factor = (ball_pos.x - platform_x) / platform_half_width * PLATFORM_STEEPNESS;
    Some(Hit {
        position: Vec2::new(ball_pos.x, PLATFORM_Y + PLATFORM_HALF_HEIGHT + radius),
        direction: normalize_or(Vec2::new(angle_factor, 1.0), Vec2::Y),
    })
}

/// Test the ball against the play-field bounds.
///
/// One wall per call, priority order: sides, then top, then bottom. A true
/// corner hit reflects only one axis; accepted approximation.
pub fn walls_collision(ball_pos: Vec2, radius: f32, dir: Vec2) -> Option<WallHit> {
    if ball_pos.x - radius <= FIELD_MIN || ball_pos.x + radius >= FIELD_MAX {
        let x = ball_pos
            .x
            .clamp(FIELD_MIN + radius, FIELD_MAX - radius);
        return Some(WallHit::Side(Hit {
            position: Vec2::new(x, ball_pos.y),
            direction: Vec2::new(-dir.x, dir.y),
        }));
    }
    if ball_pos.y + radius >= FIELD_MAX {
        return Some(WallHit::Top(Hit {
            position: Vec2::new(ball_pos.x, FIELD_MAX - radius),
            direction: Vec2::new(dir.x, -dir.y),
        }));
    }
    if ball_pos.y - radius <= FIELD_MIN {
        return Some(WallHit::Bottom);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap_symmetry() {
        let cases = [
            (Vec2::ZERO, Vec2::splat(0.5), Vec2::new(0.6, 0.0), Vec2::splat(0.5)),
            (Vec2::ZERO, Vec2::splat(0.5), Vec2::new(2.0, 2.0), Vec2::splat(0.5)),
            (Vec2::new(-0.3, 0.1), Vec2::new(0.2, 0.1), Vec2::ZERO, Vec2::splat(0.4)),
        ];
        for (ap, ah, bp, bh) in cases {
            assert_eq!(aabb_overlap(ap, ah, bp, bh), aabb_overlap(bp, bh, ap, ah));
        }
    }

    #[test]
    fn test_aabb_touching_edges_do_not_collide() {
        // Exactly touching: sum of half extents equals the center distance
        assert!(!aabb_overlap(
            Vec2::ZERO,
            Vec2::splat(0.5),
            Vec2::new(1.0, 0.0),
            Vec2::splat(0.5)
        ));
        assert!(aabb_overlap(
            Vec2::ZERO,
            Vec2::splat(0.5),
            Vec2::new(0.99, 0.0),
            Vec2::splat(0.5)
        ));
    }

    #[test]
    fn test_brick_miss_outside_radius() {
        let hit = ball_brick_collision(
            Vec2::new(0.0, -0.5),
            0.035,
            Vec2::Y,
            Vec2::ZERO,
            Vec2::new(0.1, 0.05),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_brick_tangent_is_exclusive() {
        // Ball exactly one radius below the bottom edge
        let radius = 0.05;
        let hit = ball_brick_collision(
            Vec2::new(0.0, -0.1 - radius),
            radius,
            Vec2::Y,
            Vec2::ZERO,
            Vec2::new(0.2, 0.1),
        );
        assert!(hit.is_none());
        // A hair closer and it reports
        let hit = ball_brick_collision(
            Vec2::new(0.0, -0.1 - radius + 1e-4),
            radius,
            Vec2::Y,
            Vec2::ZERO,
            Vec2::new(0.2, 0.1),
        );
        assert!(hit.is_some());
    }

    #[test]
    fn test_brick_bottom_hit_flips_y() {
        let hit = ball_brick_collision(
            Vec2::new(0.0, -0.12),
            0.05,
            Vec2::new(0.3, 1.0).normalize(),
            Vec2::ZERO,
            Vec2::new(0.2, 0.1),
        )
        .unwrap();
        assert!(hit.direction.x > 0.0);
        assert!(hit.direction.y < 0.0);
        // repositioned just outside the box
        assert!(hit.position.y <= -0.1 - 0.05 + 1e-5);
    }

    #[test]
    fn test_brick_side_hit_flips_x() {
        let hit = ball_brick_collision(
            Vec2::new(0.23, 0.0),
            0.05,
            Vec2::new(-1.0, 0.2).normalize(),
            Vec2::ZERO,
            Vec2::new(0.2, 0.1),
        )
        .unwrap();
        assert!(hit.direction.x > 0.0);
        assert!(hit.direction.y > 0.0);
    }

    #[test]
    fn test_brick_degenerate_contact_pushes_back_out() {
        // Ball center exactly on the box surface: the distance to the
        // closest point is zero, so the push-out follows the reversed
        // incoming direction instead of dividing by it
        let radius = 0.05;
        let dir = Vec2::new(0.6, -0.8);
        let ball = Vec2::new(0.0, 0.1);
        let hit =
            ball_brick_collision(ball, radius, dir, Vec2::ZERO, Vec2::new(0.2, 0.1)).unwrap();
        let expected = ball - dir * radius;
        assert!((hit.position - expected).length() < 1e-5);
        // top-edge contact still reflects y
        assert!((hit.direction - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_platform_center_bounces_straight_up() {
        let hit =
            ball_platform_collision(Vec2::new(0.0, PLATFORM_Y), 0.05, Vec2::NEG_Y, 0.0, 0.2)
                .unwrap();
        assert!(hit.direction.x.abs() < 1e-6);
        assert!((hit.direction.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_platform_edge_bounces_steeply() {
        let half_width = 0.2;
        let hit = ball_platform_collision(
            Vec2::new(half_width, PLATFORM_Y),
            0.05,
            Vec2::NEG_Y,
            0.0,
            half_width,
        )
        .unwrap();
        // pre-normalization components are (steepness, 1)
        let expected = Vec2::new(PLATFORM_STEEPNESS, 1.0).normalize();
        assert!((hit.direction - expected).length() < 1e-5);
        // repositioned onto the platform's top edge
        assert!((hit.position.y - (PLATFORM_Y + PLATFORM_HALF_HEIGHT + 0.05)).abs() < 1e-6);
    }

    #[test]
    fn test_platform_ignores_ascending_ball() {
        // Freshly bounced ball still overlapping the platform box
        let hit = ball_platform_collision(
            Vec2::new(0.0, PLATFORM_Y + PLATFORM_HALF_HEIGHT),
            0.05,
            Vec2::Y,
            0.0,
            0.2,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_platform_does_not_catch_fallen_ball() {
        // Center below the platform midline: the ball is lost, not scooped
        // back up through the platform
        let hit = ball_platform_collision(
            Vec2::new(0.0, PLATFORM_Y - 0.02),
            0.05,
            Vec2::NEG_Y,
            0.0,
            0.2,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_walls_side_before_top() {
        // Corner violation reflects only x
        let hit = walls_collision(Vec2::new(0.99, 0.99), 0.05, Vec2::new(1.0, 1.0).normalize());
        match hit {
            Some(WallHit::Side(h)) => {
                assert!(h.direction.x < 0.0);
                assert!(h.direction.y > 0.0);
            }
            other => panic!("expected side hit, got {other:?}"),
        }
    }

    #[test]
    fn test_walls_bottom_reports_loss() {
        let hit = walls_collision(Vec2::new(0.0, -0.99), 0.05, Vec2::new(0.0, -1.0));
        assert_eq!(hit, Some(WallHit::Bottom));
    }

    #[test]
    fn test_walls_clear_field_is_none() {
        assert!(walls_collision(Vec2::ZERO, 0.05, Vec2::Y).is_none());
    }
}
