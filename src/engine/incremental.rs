//! Late registration.
//!
//! A camper who registers after groups are committed goes into exactly one
//! existing group. Nothing already seated moves and the balancer does not
//! run. If the best group still breaks a limit the insertion goes ahead and
//! the violation is returned for the caller to decide on.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::scoring::{best_group, score_late_placement};
use crate::{
    Assignment, AssignmentType, CampGroup, Camper, CamperId, ConstraintViolation,
    GradeSpreadSubject, GroupNumber, GroupingConfig, GroupingError, Result, Violation, MAX_GRADE,
    MIN_GRADE,
};

/// Where a late registrant goes and what that costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LateInsertion {
    pub camper_id: CamperId,
    pub group_id: GroupNumber,
    pub score: f64,
    pub assignment: Assignment,
    /// Hard violations the insertion causes, if any
    pub violations: Vec<ConstraintViolation>,
}

/// Pick a group for `camper` without changing `groups`.
pub fn plan_late_insertion(
    camper: &Camper,
    groups: &[CampGroup],
    config: &GroupingConfig,
) -> Result<LateInsertion> {
    if groups.is_empty() {
        return Err(GroupingError::NoGroups);
    }
    if !(MIN_GRADE..=MAX_GRADE).contains(&camper.grade) {
        return Err(GroupingError::GradeOutOfRange {
            camper_id: camper.athlete_id.clone(),
            grade: camper.grade,
        });
    }
    if groups.iter().any(|g| g.contains(&camper.athlete_id)) {
        return Err(GroupingError::DuplicateCamper {
            camper_id: camper.athlete_id.clone(),
        });
    }

    let grade = camper.grade;
    let (idx, score) = best_group(groups, |g| score_late_placement(g, grade, config))
        .ok_or(GroupingError::NoGroups)?;
    let group = &groups[idx];

    let with_new: Vec<CamperId> = group
        .camper_ids()
        .map(String::from)
        .chain(std::iter::once(camper.athlete_id.clone()))
        .collect();
    let mut violations = Vec::new();
    if group.is_at_capacity(config) {
        violations.push(ConstraintViolation::new(Violation::SizeExceeded {
            group_id: group.number,
            camper_ids: with_new.clone(),
            camper_count: group.camper_count() + 1,
            max_group_size: config.max_group_size,
        }));
    }
    let new_spread = group.spread_with(grade, grade);
    if new_spread > config.max_grade_spread {
        violations.push(ConstraintViolation::new(Violation::GradeSpreadExceeded {
            subject: GradeSpreadSubject::Group(group.number),
            camper_ids: with_new,
            grade_spread: new_spread,
            max_grade_spread: config.max_grade_spread,
        }));
    }

    let reason = if violations.is_empty() {
        format!("Late registration: best fit for grade {grade}")
    } else {
        format!(
            "Late registration: least-bad group for grade {grade}; no group could take this camper cleanly"
        )
    };

    Ok(LateInsertion {
        camper_id: camper.athlete_id.clone(),
        group_id: group.number,
        score,
        assignment: Assignment {
            group_id: group.number,
            assignment_type: AssignmentType::Auto,
            reason,
        },
        violations,
    })
}

/// Seat `camper` in the best existing group.
///
/// Only the chosen group changes: it gains the camper and its flags are
/// refreshed. Every other group is left untouched.
pub fn insert_late(
    camper: &Camper,
    groups: &mut [CampGroup],
    config: &GroupingConfig,
) -> Result<LateInsertion> {
    let plan = plan_late_insertion(camper, groups, config)?;
    if let Some(group) = groups.iter_mut().find(|g| g.number == plan.group_id) {
        group.add(&camper.athlete_id, camper.grade);
        group.refresh_flags(config);
    }

    if plan.violations.is_empty() {
        info!(
            "[LateInsert] {} placed in group {} (score {:.1})",
            camper.athlete_id, plan.group_id, plan.score
        );
    } else {
        warn!(
            "[LateInsert] {} placed in group {} with {} violation(s)",
            camper.athlete_id,
            plan.group_id,
            plan.violations.len()
        );
    }
    Ok(plan)
}
