//! Re-check any group state against the limits.
//!
//! Used as the last phase of a full run and on its own after manual moves
//! or late insertions.

use serde::{Deserialize, Serialize};

use super::state::ViolationLog;
use crate::{
    CampGroup, ConstraintViolation, FriendGroup, FriendGroupId, GradeSpreadSubject, GroupNumber,
    GroupingConfig, Violation,
};

/// Findings of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Deduplicated violations for the current state
    pub violations: Vec<ConstraintViolation>,
    /// Friend groups spread over more than one group, with the groups used
    pub split_friend_groups: Vec<(FriendGroupId, Vec<GroupNumber>)>,
    pub intact_friend_groups: usize,
}

impl ValidationReport {
    pub fn hard_violation_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_hard()).count()
    }
}

/// Size and grade-spread violations of a single group.
pub fn check_group(group: &CampGroup, config: &GroupingConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    if group.is_over_capacity(config) {
        violations.push(Violation::SizeExceeded {
            group_id: group.number,
            camper_ids: group.camper_ids().map(String::from).collect(),
            camper_count: group.camper_count(),
            max_group_size: config.max_group_size,
        });
    }
    if group.violates_grade_spread(config) {
        violations.push(Violation::GradeSpreadExceeded {
            subject: GradeSpreadSubject::Group(group.number),
            camper_ids: group.camper_ids().map(String::from).collect(),
            grade_spread: group.grade_spread(),
            max_grade_spread: config.max_grade_spread,
        });
    }
    violations
}

/// Numbers of the groups holding at least one member of `friend_group`.
pub fn friend_group_locations(groups: &[CampGroup], friend_group: &FriendGroup) -> Vec<GroupNumber> {
    groups
        .iter()
        .filter(|g| friend_group.member_ids.iter().any(|id| g.contains(id)))
        .map(|g| g.number)
        .collect()
}

/// Recompute every group's flags from membership and report what is wrong.
pub fn validate_groups(
    groups: &mut [CampGroup],
    friend_groups: &[FriendGroup],
    config: &GroupingConfig,
) -> ValidationReport {
    let mut log = ViolationLog::default();
    for group in groups.iter_mut() {
        group.refresh_flags(config);
        group.has_friend_split = false;
    }
    for group in groups.iter() {
        for violation in check_group(group, config) {
            log.push(violation);
        }
    }

    let mut split_friend_groups = Vec::new();
    let mut intact_friend_groups = 0;
    for friend_group in friend_groups {
        let locations = friend_group_locations(groups, friend_group);
        match locations.len() {
            0 => {}
            1 => intact_friend_groups += 1,
            _ => {
                for group in groups.iter_mut() {
                    if locations.contains(&group.number) {
                        group.has_friend_split = true;
                    }
                }
                log.push(Violation::FriendGroupSplit {
                    friend_group_id: friend_group.id,
                    camper_ids: friend_group.member_ids.clone(),
                    group_ids: locations.clone(),
                });
                split_friend_groups.push((friend_group.id, locations));
            }
        }
    }

    ValidationReport {
        violations: log.into_vec(),
        split_friend_groups,
        intact_friend_groups,
    }
}
