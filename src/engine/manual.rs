//! Director moves between committed groups, outside a full run.

use log::info;
use serde::{Deserialize, Serialize};

use super::validator::check_group;
use crate::error::OptionExt;
use crate::{
    Assignment, AssignmentType, CampGroup, CamperId, ConstraintViolation, GroupNumber,
    GroupingConfig, GroupingError, Result,
};

/// Outcome of a manual move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualMove {
    pub camper_id: CamperId,
    pub from_group: GroupNumber,
    pub to_group: GroupNumber,
    pub assignment: Assignment,
    /// Violations of the two affected groups after the move
    pub violations: Vec<ConstraintViolation>,
}

/// Move `camper_id` into `to_group`.
///
/// All lookups are checked before anything changes. The move always goes
/// ahead when they succeed; limits it breaks come back as violations.
pub fn move_camper(
    groups: &mut [CampGroup],
    camper_id: &str,
    to_group: GroupNumber,
    assignment_type: AssignmentType,
    reason: &str,
    config: &GroupingConfig,
) -> Result<ManualMove> {
    if groups.is_empty() {
        return Err(GroupingError::NoGroups);
    }
    let to_idx = groups
        .iter()
        .position(|g| g.number == to_group)
        .ok_or_unknown_group(to_group, groups.len())?;
    let from_idx = groups
        .iter()
        .position(|g| g.contains(camper_id))
        .ok_or_unknown_camper(camper_id)?;
    let from_group = groups[from_idx].number;

    if from_idx != to_idx {
        if let Some(member) = groups[from_idx].remove(camper_id) {
            groups[to_idx].add(&member.camper_id, member.grade);
        }
    }
    groups[from_idx].refresh_flags(config);
    groups[to_idx].refresh_flags(config);

    let mut violations: Vec<ConstraintViolation> = check_group(&groups[to_idx], config)
        .into_iter()
        .map(ConstraintViolation::new)
        .collect();
    if from_idx != to_idx {
        violations.extend(
            check_group(&groups[from_idx], config)
                .into_iter()
                .map(ConstraintViolation::new),
        );
    }

    info!(
        "[Grouping] {} moved from group {} to group {} ({})",
        camper_id,
        from_group,
        to_group,
        assignment_type.as_str()
    );

    Ok(ManualMove {
        camper_id: camper_id.to_string(),
        from_group,
        to_group,
        assignment: Assignment {
            group_id: to_group,
            assignment_type,
            reason: reason.to_string(),
        },
        violations,
    })
}
