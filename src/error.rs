//! Unified error handling for the grouping engine.
//!
//! Only structural precondition failures are errors. Constraint violations
//! are ordinary output (see [`crate::violation`]) and malformed roster fields
//! are downgraded to warnings by the standardizer.

use thiserror::Error;

use crate::{CamperId, GroupNumber};

/// Errors returned by the grouping engine.
#[derive(Debug, Error)]
pub enum GroupingError {
    /// The configuration or the supplied group state contains no groups.
    #[error("no groups available: at least one group is required")]
    NoGroups,

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A camper id was referenced that is not part of the supplied roster.
    #[error("unknown camper '{camper_id}'")]
    UnknownCamper { camper_id: CamperId },

    /// A group number was referenced that does not exist.
    #[error("unknown group {group_id} (available groups: {available})")]
    UnknownGroup {
        group_id: GroupNumber,
        available: usize,
    },

    /// The same camper id appears twice in the roster or group state.
    #[error("duplicate camper '{camper_id}'")]
    DuplicateCamper { camper_id: CamperId },

    /// A standardized camper carries a grade outside Pre-K..12.
    #[error("camper '{camper_id}' has grade {grade} outside the range -1..=12")]
    GradeOutOfRange { camper_id: CamperId, grade: i32 },

    /// A violation was resolved twice.
    #[error("violation '{title}' is already resolved")]
    AlreadyResolved { title: String },

    /// Output could not be serialized for the persistence sink.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, GroupingError>;

/// Helpers for turning failed lookups into typed errors.
pub trait OptionExt<T> {
    fn ok_or_unknown_camper(self, camper_id: &str) -> Result<T>;
    fn ok_or_unknown_group(self, group_id: GroupNumber, available: usize) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_camper(self, camper_id: &str) -> Result<T> {
        self.ok_or_else(|| GroupingError::UnknownCamper {
            camper_id: camper_id.to_string(),
        })
    }

    fn ok_or_unknown_group(self, group_id: GroupNumber, available: usize) -> Result<T> {
        self.ok_or(GroupingError::UnknownGroup {
            group_id,
            available,
        })
    }
}
