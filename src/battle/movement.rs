//! Unobstructed grid movement
//!
//! Units travel in a straight Euclidean line up to their move speed. There is
//! no pathfinding and no collision; results are rounded to the grid and
//! clamped to the map.

use crate::battle::constants::RALLY_ARRIVAL_RADIUS;
use crate::battle::resolution::round_half_up;
use crate::battle::units::Unit;
use crate::core::types::{GridBounds, GridPos};

/// Step from `from` toward `to` by at most `speed`
///
/// Arrives exactly when the target is within reach.
pub fn step_toward(from: GridPos, to: GridPos, speed: f64, bounds: GridBounds) -> GridPos {
    let distance = from.distance(&to);
    if distance <= speed {
        return bounds.clamp(to);
    }
    scaled_step(from, to.x - from.x, to.y - from.y, speed / distance, bounds)
}

/// Step directly away from `threat` by `speed`
///
/// A unit standing on the threat's tile has no direction to flee in and
/// stays put.
pub fn step_away(from: GridPos, threat: GridPos, speed: f64, bounds: GridBounds) -> GridPos {
    let distance = from.distance(&threat);
    if distance == 0.0 {
        return from;
    }
    scaled_step(from, from.x - threat.x, from.y - threat.y, speed / distance, bounds)
}

fn scaled_step(from: GridPos, dx: i32, dy: i32, ratio: f64, bounds: GridBounds) -> GridPos {
    let x = round_half_up(f64::from(from.x) + f64::from(dx) * ratio) as i32;
    let y = round_half_up(f64::from(from.y) + f64::from(dy) * ratio) as i32;
    bounds.clamp(GridPos::new(x, y))
}

/// Has the unit reached its rally point?
pub fn reached_rally(unit: &Unit) -> bool {
    unit.rally
        .is_some_and(|target| unit.distance_to_pos(target) <= RALLY_ARRIVAL_RADIUS)
}

/// Next tile toward the unit's rally point, `None` without an active rally
pub fn rally_step(unit: &Unit, bounds: GridBounds) -> Option<GridPos> {
    let target = unit.rally?;
    if reached_rally(unit) {
        return None;
    }
    Some(step_toward(
        unit.position,
        target,
        unit.profile().move_speed,
        bounds,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::unit_type::Archetype;
    use crate::core::types::{Side, UnitId};

    const BOUNDS: GridBounds = GridBounds { cols: 40, rows: 28 };

    #[test]
    fn test_arrives_when_in_reach() {
        let to = GridPos::new(3, 4);
        assert_eq!(step_toward(GridPos::new(0, 0), to, 5.0, BOUNDS), to);
    }

    #[test]
    fn test_partial_step_along_vector() {
        let next = step_toward(GridPos::new(0, 0), GridPos::new(6, 0), 5.0, BOUNDS);
        assert_eq!(next, GridPos::new(5, 0));

        // 20/√(30²+40²) = 0.4 of (30,40)
        let next = step_toward(GridPos::new(0, 0), GridPos::new(30, 40), 20.0, BOUNDS);
        assert_eq!(next, GridPos::new(12, 16));
    }

    #[test]
    fn test_step_away_mirrors_threat() {
        let next = step_away(GridPos::new(10, 10), GridPos::new(8, 10), 1.0, BOUNDS);
        assert_eq!(next, GridPos::new(11, 10));
    }

    #[test]
    fn test_step_away_clamped_to_grid() {
        let next = step_away(GridPos::new(0, 5), GridPos::new(3, 5), 4.0, BOUNDS);
        assert_eq!(next, GridPos::new(0, 5));
    }

    #[test]
    fn test_step_away_from_same_tile_stays() {
        let here = GridPos::new(7, 7);
        assert_eq!(step_away(here, here, 5.0, BOUNDS), here);
    }

    #[test]
    fn test_rally_step() {
        let mut unit = Unit::new(UnitId(0), Archetype::Foot, Side::One, GridPos::new(0, 5));
        assert_eq!(rally_step(&unit, BOUNDS), None);

        unit.set_rally(GridPos::new(10, 5));
        assert_eq!(rally_step(&unit, BOUNDS), Some(GridPos::new(5, 5)));

        unit.position = GridPos::new(10, 5);
        assert!(reached_rally(&unit));
        assert_eq!(rally_step(&unit, BOUNDS), None);
    }
}
