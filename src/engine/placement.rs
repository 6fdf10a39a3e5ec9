//! Placement phases: manual overrides, friend groups, solo campers.

use std::collections::BTreeMap;

use log::{debug, info};

use super::scoring::{
    best_group, score_friend_group_placement, score_solo_camper_placement,
    BROKEN_PLACEMENT_THRESHOLD, SOLO_FULL_PENALTY, SOLO_SPREAD_OVERFLOW_PENALTY,
};
use super::state::PlacementState;
use crate::splitter::split_friend_group;
use crate::{
    AssignmentType, CamperId, FriendGroup, GradeSpreadSubject, GroupNumber, GroupingError,
    Result, Violation, ViolationType,
};

/// Seat every preserved placement before any scoring and lock it.
pub(crate) fn preserve_overrides(
    state: &mut PlacementState,
    overrides: &BTreeMap<CamperId, GroupNumber>,
) {
    for (camper_id, group_id) in overrides {
        let Some(idx) = state.group_index(*group_id) else {
            continue;
        };
        state.place(
            camper_id,
            idx,
            AssignmentType::Manual,
            "Preserved manual override".to_string(),
        );
        state.locked.insert(camper_id.clone());
        state.check_after_placement(idx, &[camper_id.as_str()]);
    }
    if !overrides.is_empty() {
        info!("[Grouping] Preserved {} manual overrides", overrides.len());
    }
}

/// Place friend groups: intact-placeable first, then the rest, each
/// subset largest first.
pub(crate) fn place_friend_groups(
    state: &mut PlacementState,
    friend_groups: &[FriendGroup],
) -> Result<()> {
    let mut order: Vec<&FriendGroup> = friend_groups.iter().collect();
    // Stable: keeps the largest-first order inside each subset
    order.sort_by_key(|g| !g.can_be_placed_intact());

    for group in order {
        place_friend_group(state, group)?;
    }
    Ok(())
}

fn place_friend_group(state: &mut PlacementState, group: &FriendGroup) -> Result<()> {
    let config = state.config;
    let remaining: Vec<CamperId> = group
        .member_ids
        .iter()
        .filter(|id| state.is_unplaced(id))
        .cloned()
        .collect();
    if remaining.is_empty() {
        debug!("[Grouping] Friend group {} already placed by overrides", group.id);
        return Ok(());
    }

    if group.exceeds_size {
        state.record_violation(Violation::FriendGroupTooLarge {
            friend_group_id: group.id,
            camper_ids: group.member_ids.clone(),
            member_count: group.member_count(),
            max_group_size: config.max_group_size,
        });
    }
    if group.exceeds_grade_spread {
        state.record_violation(Violation::GradeSpreadExceeded {
            subject: GradeSpreadSubject::FriendGroup(group.id),
            camper_ids: group.member_ids.clone(),
            grade_spread: group.grade_spread,
            max_grade_spread: config.max_grade_spread,
        });
    }

    if group.can_be_placed_intact() {
        let (min, max) = grade_range(state, &remaining);
        let best = best_group(&state.groups, |g| {
            score_friend_group_placement(g, remaining.len(), min, max, config)
        });
        match best {
            Some((idx, score)) if score < BROKEN_PLACEMENT_THRESHOLD => {
                let reason = format!(
                    "Placed with friend group {} ({} friends together)",
                    group.id,
                    remaining.len()
                );
                for id in &remaining {
                    state.place(id, idx, AssignmentType::Auto, reason.clone());
                }
                let ids: Vec<&str> = remaining.iter().map(String::as_str).collect();
                state.check_after_placement(idx, &ids);
                return Ok(());
            }
            Some((_, score)) => debug!(
                "[Grouping] Friend group {} cannot stay whole (best score {score:.0})",
                group.id
            ),
            None => return Err(GroupingError::NoGroups),
        }
    }

    let grades: Vec<i32> = remaining
        .iter()
        .filter_map(|id| state.grade_of(id))
        .collect();
    let unplaced = FriendGroup::from_members(group.id, remaining.clone(), &grades, config);
    let sub_clusters = split_friend_group(&unplaced, &state.campers, config)?;
    let parts = sub_clusters.len();

    let mut used: Vec<GroupNumber> = Vec::new();
    for (part, sub) in sub_clusters.iter().enumerate() {
        let (min, max) = grade_range(state, sub);
        let (idx, score) = best_group(&state.groups, |g| {
            score_friend_group_placement(g, sub.len(), min, max, config)
        })
        .ok_or(GroupingError::NoGroups)?;
        let number = state.groups[idx].number;

        let reason = if parts > 1 {
            format!(
                "Placed with part {} of {} of split friend group {}",
                part + 1,
                parts,
                group.id
            )
        } else {
            format!(
                "Placed with friend group {} in the least-bad group; it cannot fit anywhere cleanly",
                group.id
            )
        };
        for id in sub {
            state.place(id, idx, AssignmentType::Auto, reason.clone());
        }

        if score >= BROKEN_PLACEMENT_THRESHOLD {
            state.record_violation(Violation::ImpossiblePlacement {
                camper_ids: sub.clone(),
                group_id: number,
                reason: format!(
                    "no group can take these {} campers without breaking a limit (best score {score:.0})",
                    sub.len()
                ),
            });
            for id in sub {
                state.tag(id, ViolationType::ImpossiblePlacement);
            }
        }

        let ids: Vec<&str> = sub.iter().map(String::as_str).collect();
        state.check_after_placement(idx, &ids);
        if !used.contains(&number) {
            used.push(number);
        }
    }

    if used.len() > 1 {
        used.sort_unstable();
        info!(
            "[Grouping] Friend group {} split across groups {:?}",
            group.id, used
        );
        state.record_violation(Violation::FriendGroupSplit {
            friend_group_id: group.id,
            camper_ids: group.member_ids.clone(),
            group_ids: used,
        });
        for id in &remaining {
            state.tag(id, ViolationType::FriendGroupSplit);
        }
    }
    Ok(())
}

/// Place every still-unplaced camper one at a time, lowest grade first.
///
/// Roster order breaks grade ties.
pub(crate) fn place_solo_campers(state: &mut PlacementState) {
    let config = state.config;
    let mut solos = state.unplaced_in_roster_order();
    solos.sort_by_key(|id| state.grade_of(id).unwrap_or_default());
    let num_groups = state.groups.len() as f64;

    for id in solos {
        let Some(grade) = state.grade_of(id) else {
            continue;
        };
        let average = state.total_placed() as f64 / num_groups;
        let Some((idx, score)) = best_group(&state.groups, |g| {
            score_solo_camper_placement(g, grade, average, config)
        }) else {
            return;
        };

        let reason = if score >= SOLO_FULL_PENALTY {
            "Placed in the least-bad group; every group is at capacity".to_string()
        } else if score >= SOLO_SPREAD_OVERFLOW_PENALTY {
            "Placed in the closest grade match; no group fits this grade within the spread limit"
                .to_string()
        } else {
            format!("Best grade fit for grade {grade}")
        };
        state.place(id, idx, AssignmentType::Auto, reason);
        state.check_after_placement(idx, &[id]);
    }
}

fn grade_range(state: &PlacementState, ids: &[CamperId]) -> (i32, i32) {
    let grades = ids.iter().filter_map(|id| state.grade_of(id));
    let (min, max) = grades.fold((i32::MAX, i32::MIN), |(lo, hi), g| (lo.min(g), hi.max(g)));
    if min > max {
        (0, 0)
    } else {
        (min, max)
    }
}
