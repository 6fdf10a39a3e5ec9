//! Typed constraint violations.
//!
//! Each [`Violation`] variant carries only the fields relevant to its kind.
//! [`ConstraintViolation`] wraps a variant with severity, human-readable
//! text and a resolution lifecycle. Violations are regenerated on every run,
//! never patched in place across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CamperId, FriendGroupId, GroupNumber, GroupingError, Result};

/// How serious a violation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Social or data-quality concern; the grouping is still acceptable.
    Warning,
    /// A hard limit is broken.
    Hard,
}

/// Discriminant of [`Violation`], for tagging assignments and dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    SizeExceeded,
    GradeSpreadExceeded,
    FriendGroupSplit,
    FriendGroupTooLarge,
    ImpossiblePlacement,
    GradeDiscrepancy,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::SizeExceeded => "size_exceeded",
            ViolationType::GradeSpreadExceeded => "grade_spread_exceeded",
            ViolationType::FriendGroupSplit => "friend_group_split",
            ViolationType::FriendGroupTooLarge => "friend_group_too_large",
            ViolationType::ImpossiblePlacement => "impossible_placement",
            ViolationType::GradeDiscrepancy => "grade_discrepancy",
        }
    }
}

/// What a grade-spread violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeSpreadSubject {
    /// A camp group's membership is too wide.
    Group(GroupNumber),
    /// A friend group is too wide to be kept together.
    FriendGroup(FriendGroupId),
}

/// A constraint violation, keyed by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Violation {
    SizeExceeded {
        group_id: GroupNumber,
        camper_ids: Vec<CamperId>,
        camper_count: usize,
        max_group_size: usize,
    },
    GradeSpreadExceeded {
        subject: GradeSpreadSubject,
        camper_ids: Vec<CamperId>,
        grade_spread: i32,
        max_grade_spread: i32,
    },
    FriendGroupSplit {
        friend_group_id: FriendGroupId,
        camper_ids: Vec<CamperId>,
        group_ids: Vec<GroupNumber>,
    },
    FriendGroupTooLarge {
        friend_group_id: FriendGroupId,
        camper_ids: Vec<CamperId>,
        member_count: usize,
        max_group_size: usize,
    },
    ImpossiblePlacement {
        camper_ids: Vec<CamperId>,
        group_id: GroupNumber,
        reason: String,
    },
    GradeDiscrepancy {
        camper_id: CamperId,
        reported_grade: i32,
        computed_grade: i32,
    },
}

/// Entity a violation is about, used to avoid reporting the same fact twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationSubject {
    Group(GroupNumber),
    FriendGroup(FriendGroupId),
    Campers(Vec<CamperId>),
}

impl Violation {
    pub fn violation_type(&self) -> ViolationType {
        match self {
            Violation::SizeExceeded { .. } => ViolationType::SizeExceeded,
            Violation::GradeSpreadExceeded { .. } => ViolationType::GradeSpreadExceeded,
            Violation::FriendGroupSplit { .. } => ViolationType::FriendGroupSplit,
            Violation::FriendGroupTooLarge { .. } => ViolationType::FriendGroupTooLarge,
            Violation::ImpossiblePlacement { .. } => ViolationType::ImpossiblePlacement,
            Violation::GradeDiscrepancy { .. } => ViolationType::GradeDiscrepancy,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Violation::SizeExceeded { .. } => Severity::Hard,
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(_),
                ..
            } => Severity::Hard,
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::FriendGroup(_),
                ..
            } => Severity::Warning,
            Violation::FriendGroupSplit { .. }
            | Violation::FriendGroupTooLarge { .. }
            | Violation::ImpossiblePlacement { .. }
            | Violation::GradeDiscrepancy { .. } => Severity::Warning,
        }
    }

    /// Affected camp group, if the violation is about one.
    pub fn group_id(&self) -> Option<GroupNumber> {
        match self {
            Violation::SizeExceeded { group_id, .. } => Some(*group_id),
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(group_id),
                ..
            } => Some(*group_id),
            Violation::ImpossiblePlacement { group_id, .. } => Some(*group_id),
            _ => None,
        }
    }

    /// Affected friend group, if the violation is about one.
    pub fn friend_group_id(&self) -> Option<FriendGroupId> {
        match self {
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::FriendGroup(id),
                ..
            }
            | Violation::FriendGroupSplit {
                friend_group_id: id,
                ..
            }
            | Violation::FriendGroupTooLarge {
                friend_group_id: id,
                ..
            } => Some(*id),
            _ => None,
        }
    }

    /// Campers named by the violation.
    pub fn camper_ids(&self) -> Vec<CamperId> {
        match self {
            Violation::SizeExceeded { camper_ids, .. }
            | Violation::GradeSpreadExceeded { camper_ids, .. }
            | Violation::FriendGroupSplit { camper_ids, .. }
            | Violation::FriendGroupTooLarge { camper_ids, .. }
            | Violation::ImpossiblePlacement { camper_ids, .. } => camper_ids.clone(),
            Violation::GradeDiscrepancy { camper_id, .. } => vec![camper_id.clone()],
        }
    }

    /// The entity this violation describes.
    pub fn subject(&self) -> ViolationSubject {
        if let Violation::ImpossiblePlacement { camper_ids, .. } = self {
            let mut ids = camper_ids.clone();
            ids.sort();
            return ViolationSubject::Campers(ids);
        }
        if let Some(group_id) = self.group_id() {
            return ViolationSubject::Group(group_id);
        }
        if let Some(id) = self.friend_group_id() {
            return ViolationSubject::FriendGroup(id);
        }
        let mut ids = self.camper_ids();
        ids.sort();
        ViolationSubject::Campers(ids)
    }

    pub fn title(&self) -> String {
        match self {
            Violation::SizeExceeded { group_id, .. } => format!("Group {group_id} is over capacity"),
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(group_id),
                ..
            } => format!("Group {group_id} spans too many grades"),
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::FriendGroup(id),
                ..
            } => format!("Friend group {id} spans too many grades"),
            Violation::FriendGroupSplit {
                friend_group_id, ..
            } => format!("Friend group {friend_group_id} was split"),
            Violation::FriendGroupTooLarge {
                friend_group_id, ..
            } => format!("Friend group {friend_group_id} is larger than a group"),
            Violation::ImpossiblePlacement { camper_ids, .. } => {
                format!("No clean placement for {} camper(s)", camper_ids.len())
            }
            Violation::GradeDiscrepancy { camper_id, .. } => {
                format!("Grade discrepancy for {camper_id}")
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            Violation::SizeExceeded {
                camper_count,
                max_group_size,
                ..
            } => format!(
                "{camper_count} campers assigned, {} over the limit of {max_group_size}",
                camper_count.saturating_sub(*max_group_size)
            ),
            Violation::GradeSpreadExceeded {
                grade_spread,
                max_grade_spread,
                camper_ids,
                ..
            } => format!(
                "{} campers span {grade_spread} grade levels; at most {max_grade_spread} allowed",
                camper_ids.len()
            ),
            Violation::FriendGroupSplit {
                camper_ids,
                group_ids,
                ..
            } => format!(
                "{} friends were spread across groups {}",
                camper_ids.len(),
                join_numbers(group_ids)
            ),
            Violation::FriendGroupTooLarge {
                member_count,
                max_group_size,
                ..
            } => format!(
                "{member_count} connected friends cannot fit a group of at most {max_group_size}"
            ),
            Violation::ImpossiblePlacement {
                group_id, reason, ..
            } => format!("Placed in group {group_id} as the least-bad option: {reason}"),
            Violation::GradeDiscrepancy {
                reported_grade,
                computed_grade,
                ..
            } => format!(
                "Reported grade {reported_grade} differs from grade {computed_grade} implied by date of birth"
            ),
        }
    }

    pub fn suggested_resolution(&self) -> String {
        match self {
            Violation::SizeExceeded { .. } => {
                "Move campers to a group with space, or raise the group size limit".to_string()
            }
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::Group(_),
                ..
            } => "Move the outlying grades to a closer group, or accept the wider spread".to_string(),
            Violation::GradeSpreadExceeded {
                subject: GradeSpreadSubject::FriendGroup(_),
                ..
            } => "Confirm the friend requests, or accept that these friends may be separated".to_string(),
            Violation::FriendGroupSplit { .. } => {
                "Review the split and move friends together if space allows".to_string()
            }
            Violation::FriendGroupTooLarge { .. } => {
                "Ask families which friendships matter most, or add a group".to_string()
            }
            Violation::ImpossiblePlacement { .. } => {
                "Add capacity or relax the grade spread, then re-run".to_string()
            }
            Violation::GradeDiscrepancy { .. } => {
                "Confirm the camper's grade with the family".to_string()
            }
        }
    }
}

/// Why a violation was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Accepted as-is by a director.
    Accepted,
    /// Fixed by moving campers.
    ManualMove,
    /// Fixed by changing configuration and re-running.
    ConfigAdjusted,
    /// Not a real problem.
    Dismissed,
}

/// Resolution lifecycle of a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Unresolved,
    #[serde(rename_all = "camelCase")]
    Resolved {
        resolved_by: String,
        resolved_at: DateTime<Utc>,
        kind: ResolutionKind,
        note: Option<String>,
    },
}

/// A violation record as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintViolation {
    #[serde(flatten)]
    pub violation: Violation,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub suggested_resolution: String,
    pub resolution: Resolution,
}

impl ConstraintViolation {
    pub fn new(violation: Violation) -> Self {
        Self {
            severity: violation.severity(),
            title: violation.title(),
            description: violation.description(),
            suggested_resolution: violation.suggested_resolution(),
            resolution: Resolution::Unresolved,
            violation,
        }
    }

    pub fn violation_type(&self) -> ViolationType {
        self.violation.violation_type()
    }

    pub fn is_hard(&self) -> bool {
        self.severity == Severity::Hard
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved { .. })
    }

    /// Dedup key: the same kind of fact about the same entity.
    pub fn dedup_key(&self) -> (ViolationType, ViolationSubject) {
        (self.violation_type(), self.violation.subject())
    }

    /// Close the violation. Fails if it is already resolved.
    pub fn resolve(
        &mut self,
        resolved_by: &str,
        resolved_at: DateTime<Utc>,
        kind: ResolutionKind,
        note: Option<String>,
    ) -> Result<()> {
        if self.is_resolved() {
            return Err(GroupingError::AlreadyResolved {
                title: self.title.clone(),
            });
        }
        self.resolution = Resolution::Resolved {
            resolved_by: resolved_by.to_string(),
            resolved_at,
            kind,
            note,
        };
        Ok(())
    }
}

fn join_numbers(numbers: &[GroupNumber]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
