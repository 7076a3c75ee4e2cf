use std::f64::consts::{PI, TAU};

use crate::config::{GameConfig, BORDER_BOUNCE_MARGIN};
use crate::game::physics::Position;

/// The playable rectangle, copied out of the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl From<&GameConfig> for Bounds {
    fn from(config: &GameConfig) -> Self {
        Bounds {
            left: config.border_left,
            right: config.border_right,
            top: config.border_top,
            bottom: config.border_bottom,
        }
    }
}

/// Outcome of a border pass: the clamped destination and the new heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub position: Position,
    pub angle: f64,
}

/// Clamp `candidate` into the border and bounce the heading off every side
/// it crossed. The margin is fixed and does not depend on the cell size.
pub fn reflect(candidate: Position, angle: f64, bounds: Bounds) -> Reflection {
    let margin = BORDER_BOUNCE_MARGIN;
    let Position { mut x, mut y } = candidate;
    let mut angle = angle;

    if x - margin < bounds.left {
        angle = TAU - angle;
        x = bounds.left + margin;
    }
    if x + margin > bounds.right {
        angle = TAU - angle;
        x = bounds.right - margin;
    }
    if y - margin < bounds.top {
        angle = flip_vertical(angle);
        y = bounds.top + margin;
    }
    if y + margin > bounds.bottom {
        angle = flip_vertical(angle);
        y = bounds.bottom - margin;
    }

    Reflection {
        position: Position::new(x, y),
        angle,
    }
}

/// Pull a position back inside the border without touching any heading.
pub fn clamp(position: Position, bounds: Bounds) -> Position {
    reflect(position, 0.0, bounds).position
}

fn flip_vertical(angle: f64) -> f64 {
    if angle <= PI {
        PI - angle
    } else {
        3.0 * PI - angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            left: 0.0,
            right: 1000.0,
            top: 0.0,
            bottom: 1000.0,
        }
    }

    #[test]
    fn inside_is_untouched() {
        let r = reflect(Position::new(500.5, 300.25), 1.0, bounds());
        assert_eq!(r.position, Position::new(500.5, 300.25));
        assert_eq!(r.angle, 1.0);
    }

    #[test]
    fn left_wall_mirrors_horizontally() {
        let heading = 1.5 * PI; // moving toward -x
        let r = reflect(Position::new(10.0, 500.0), heading, bounds());
        assert_eq!(r.position.x, 40.0);
        assert_eq!(r.position.y, 500.0);
        assert_eq!(r.angle, TAU - heading);
    }

    #[test]
    fn right_wall_clamps_inside() {
        let r = reflect(Position::new(999.0, 500.0), 0.5 * PI, bounds());
        assert_eq!(r.position.x, 960.0);
        assert_eq!(r.angle, TAU - 0.5 * PI);
    }

    #[test]
    fn top_and_bottom_use_both_branches() {
        let r = reflect(Position::new(500.0, 5.0), 0.75 * PI, bounds());
        assert_eq!(r.position.y, 40.0);
        assert_eq!(r.angle, PI - 0.75 * PI);

        let r = reflect(Position::new(500.0, 995.0), 1.25 * PI, bounds());
        assert_eq!(r.position.y, 960.0);
        assert_eq!(r.angle, 3.0 * PI - 1.25 * PI);
    }

    #[test]
    fn clamp_keeps_inside_points() {
        assert_eq!(clamp(Position::new(500.0, 500.0), bounds()), Position::new(500.0, 500.0));
        assert_eq!(clamp(Position::new(1003.0, -8.0), bounds()), Position::new(960.0, 40.0));
    }

    #[test]
    fn bounds_follow_config() {
        let bounds = Bounds::from(&GameConfig::default());
        assert_eq!(bounds.right, GameConfig::default().border_right);
    }

    #[test]
    fn corner_reflects_both_axes() {
        let heading = 1.25 * PI;
        let r = reflect(Position::new(-20.0, -20.0), heading, bounds());
        assert_eq!(r.position, Position::new(40.0, 40.0));
        let after_x = TAU - heading;
        let expected = if after_x <= PI { PI - after_x } else { 3.0 * PI - after_x };
        assert_eq!(r.angle, expected);
    }
}
