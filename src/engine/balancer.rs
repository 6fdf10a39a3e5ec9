//! Size balancing after placement.
//!
//! Moves unlocked campers out of groups above the target size into groups
//! below it. The first eligible destination wins; moves are not scored.
//! A destination is eligible when it is below target, not at capacity, and
//! stays within the grade-spread limit with the incoming camper, so a move
//! never pushes a group's spread past the maximum.

use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{CampGroup, CamperId, GroupMember, GroupNumber, GroupingConfig};

/// One camper moved by the balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMove {
    pub camper_id: CamperId,
    pub from_group: GroupNumber,
    pub to_group: GroupNumber,
}

/// `ceil(total placed / number of groups)`.
pub fn target_size(groups: &[CampGroup]) -> usize {
    if groups.is_empty() {
        return 0;
    }
    let total: usize = groups.iter().map(|g| g.camper_count()).sum();
    (total + groups.len() - 1) / groups.len()
}

/// Move unlocked campers from oversized groups into undersized ones.
///
/// Oversized groups are visited largest first (ties by position), their
/// candidates in seating order, destinations by position. Repeats until a
/// full pass makes no move.
pub fn balance_groups(
    groups: &mut [CampGroup],
    locked: &HashSet<CamperId>,
    config: &GroupingConfig,
) -> Vec<BalanceMove> {
    let mut moves = Vec::new();
    let target = target_size(groups);
    if target == 0 {
        return moves;
    }

    loop {
        let mut moved = false;

        let mut oversized: Vec<usize> = (0..groups.len())
            .filter(|&i| groups[i].camper_count() > target)
            .collect();
        oversized.sort_by(|&a, &b| groups[b].camper_count().cmp(&groups[a].camper_count()));

        for src in oversized {
            let candidates: Vec<GroupMember> = groups[src]
                .members()
                .iter()
                .filter(|m| !locked.contains(&m.camper_id))
                .cloned()
                .collect();

            for member in candidates {
                if groups[src].camper_count() <= target {
                    break;
                }
                let Some(dest) = eligible_destination(groups, src, member.grade, target, config)
                else {
                    continue;
                };

                groups[src].remove(&member.camper_id);
                groups[dest].add(&member.camper_id, member.grade);
                debug!(
                    "[Balance] {} moved from group {} to group {}",
                    member.camper_id, groups[src].number, groups[dest].number
                );
                moves.push(BalanceMove {
                    camper_id: member.camper_id,
                    from_group: groups[src].number,
                    to_group: groups[dest].number,
                });
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    if !moves.is_empty() {
        info!("[Balance] {} moves toward target size {target}", moves.len());
    }
    moves
}

fn eligible_destination(
    groups: &[CampGroup],
    src: usize,
    grade: i32,
    target: usize,
    config: &GroupingConfig,
) -> Option<usize> {
    groups.iter().enumerate().position(|(i, g)| {
        i != src
            && g.camper_count() < target
            && !g.is_at_capacity(config)
            && g.spread_with(grade, grade) <= config.max_grade_spread
    })
}
