//! Automatic deployment layout
//!
//! Converts a unit count into distinct tiles inside a side's deployment
//! zone. Ranks fill from the front column (nearest the enemy) backward;
//! within a rank, units spread outward from the centre row every other tile
//! before the gaps are filled.

use crate::core::config::BattleConfig;
use crate::core::types::{GridPos, Side};

/// Column of the rank `rank` ranks behind the front line
fn rank_column(side: Side, rank: i32, config: &BattleConfig) -> i32 {
    match side {
        Side::One => config.deploy_cols - 1 - rank,
        Side::Two => config.grid_cols - config.deploy_cols + rank,
    }
}

/// Row offsets from the centre: 0, +2, -2, +4, -4, ... then the odd gaps
fn row_order(rows: i32) -> Vec<i32> {
    let center = rows / 2;
    let mut order = Vec::with_capacity(rows.max(0) as usize);
    for parity in [0, 1] {
        let mut step = parity;
        while step < rows {
            for row in [center + step, center - step] {
                if (0..rows).contains(&row) && !order.contains(&row) {
                    order.push(row);
                }
            }
            step += 2;
        }
    }
    order
}

/// Tiles for `count` units of `side`, front rank first
///
/// Returns fewer tiles than requested only when the zone is full.
pub fn deployment_slots(side: Side, count: usize, config: &BattleConfig) -> Vec<GridPos> {
    let rows = row_order(config.grid_rows);
    (0..config.deploy_cols)
        .flat_map(|rank| {
            let col = rank_column(side, rank, config);
            rows.iter().map(move |&row| GridPos::new(col, row))
        })
        .take(count)
        .collect()
}
