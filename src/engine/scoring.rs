//! Placement scores. Lower is better.
//!
//! Penalties for breaking a hard limit are orders of magnitude above the
//! soft tie-break weights, so any clean placement beats any violating one.
//! Only that ordering matters; the exact constants are a tunable baseline.

use crate::{CampGroup, GroupingConfig};

/// Per camper of size overflow when placing a friend cluster.
pub const FRIEND_SIZE_OVERFLOW_PENALTY: f64 = 1000.0;
/// Per grade level of spread overflow when placing a friend cluster.
pub const FRIEND_SPREAD_OVERFLOW_PENALTY: f64 = 500.0;
/// Per grade level the cluster widens the group.
pub const FRIEND_SPREAD_INCREASE_WEIGHT: f64 = 10.0;
/// Per camper already in the group.
pub const FRIEND_OCCUPANCY_WEIGHT: f64 = 1.0;
/// Friend-cluster scores at or above this would break a hard limit.
pub const BROKEN_PLACEMENT_THRESHOLD: f64 = 1000.0;

/// Solo camper placed into a full group.
pub const SOLO_FULL_PENALTY: f64 = 10_000.0;
/// Solo camper widening a group past the spread limit.
pub const SOLO_SPREAD_OVERFLOW_PENALTY: f64 = 5000.0;
/// Per grade level of average distance from the group's min and max.
pub const SOLO_GRADE_DISTANCE_WEIGHT: f64 = 20.0;
/// Per camper above the average group size.
pub const SOLO_BALANCE_WEIGHT: f64 = 5.0;

/// Late registrant placed into a full group.
pub const LATE_FULL_PENALTY: f64 = 1000.0;
/// Late registrant widening a group past the spread limit.
pub const LATE_SPREAD_OVERFLOW_PENALTY: f64 = 500.0;
/// Per grade level of distance from the group's grade midpoint.
pub const LATE_MIDPOINT_WEIGHT: f64 = 10.0;
/// Per camper already in the group.
pub const LATE_OCCUPANCY_WEIGHT: f64 = 1.0;

/// Score placing a whole friend cluster of `size` campers spanning
/// `min_grade..=max_grade` into `group`.
pub fn score_friend_group_placement(
    group: &CampGroup,
    size: usize,
    min_grade: i32,
    max_grade: i32,
    config: &GroupingConfig,
) -> f64 {
    let mut score = 0.0;

    let new_count = group.camper_count() + size;
    let size_overflow = new_count.saturating_sub(config.max_group_size);
    score += FRIEND_SIZE_OVERFLOW_PENALTY * size_overflow as f64;

    let new_spread = group.spread_with(min_grade, max_grade);
    let spread_overflow = (new_spread - config.max_grade_spread).max(0);
    score += FRIEND_SPREAD_OVERFLOW_PENALTY * spread_overflow as f64;

    let spread_increase = (new_spread - group.grade_spread()).max(0);
    score += FRIEND_SPREAD_INCREASE_WEIGHT * spread_increase as f64;

    score += FRIEND_OCCUPANCY_WEIGHT * group.camper_count() as f64;
    score
}

/// Score placing a single camper of `grade` into `group`.
///
/// `average_size` is the current mean size across all groups.
pub fn score_solo_camper_placement(
    group: &CampGroup,
    grade: i32,
    average_size: f64,
    config: &GroupingConfig,
) -> f64 {
    let mut score = 0.0;

    if group.is_at_capacity(config) {
        score += SOLO_FULL_PENALTY;
    }
    if group.spread_with(grade, grade) > config.max_grade_spread {
        score += SOLO_SPREAD_OVERFLOW_PENALTY;
    }
    if let (Some(min), Some(max)) = (group.min_grade(), group.max_grade()) {
        let distance = ((grade - min).abs() + (grade - max).abs()) as f64 / 2.0;
        score += SOLO_GRADE_DISTANCE_WEIGHT * distance;
    }
    score += SOLO_BALANCE_WEIGHT * (group.camper_count() as f64 - average_size);
    score
}

/// Score placing a late registrant of `grade` into an already-final `group`.
pub fn score_late_placement(group: &CampGroup, grade: i32, config: &GroupingConfig) -> f64 {
    let mut score = 0.0;

    if group.is_at_capacity(config) {
        score += LATE_FULL_PENALTY;
    }
    if group.spread_with(grade, grade) > config.max_grade_spread {
        score += LATE_SPREAD_OVERFLOW_PENALTY;
    }
    if let Some(midpoint) = group.grade_midpoint() {
        score += LATE_MIDPOINT_WEIGHT * (grade as f64 - midpoint).abs();
    }
    score += LATE_OCCUPANCY_WEIGHT * group.camper_count() as f64;
    score
}

/// Index and score of the lowest-scoring group. Ties go to the lowest index.
pub fn best_group<F>(groups: &[CampGroup], mut score: F) -> Option<(usize, f64)>
where
    F: FnMut(&CampGroup) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, group) in groups.iter().enumerate() {
        let s = score(group);
        match best {
            Some((_, best_score)) if s >= best_score => {}
            _ => best = Some((idx, s)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_with(grades: &[i32]) -> CampGroup {
        let mut group = CampGroup::new(1);
        for (i, grade) in grades.iter().enumerate() {
            group.add(&format!("m{i}"), *grade);
        }
        group
    }

    #[test]
    fn test_friend_score_penalizes_overflow() {
        let config = GroupingConfig::default();
        let full = group_with(&[3; 11]);
        // 2 campers into 11/12 -> 1 over
        let score = score_friend_group_placement(&full, 2, 3, 3, &config);
        assert!(score >= BROKEN_PLACEMENT_THRESHOLD);

        let empty = CampGroup::new(2);
        assert_eq!(score_friend_group_placement(&empty, 2, 3, 3, &config), 0.0);
    }

    #[test]
    fn test_solo_score_prefers_centered_group() {
        let config = GroupingConfig::default();
        let centered = group_with(&[2, 4]);
        let offset = group_with(&[5, 5]);
        let a = score_solo_camper_placement(&centered, 3, 2.0, &config);
        let b = score_solo_camper_placement(&offset, 3, 2.0, &config);
        assert!(a < b);
    }

    #[test]
    fn test_best_group_ties_go_first() {
        let groups = vec![CampGroup::new(1), CampGroup::new(2)];
        assert_eq!(best_group(&groups, |_| 1.0), Some((0, 1.0)));
        assert_eq!(best_group(&[], |_| 1.0), None);
    }
}
