//! Friend-request matching.
//!
//! Resolves free-text friend names to athlete ids within one camp roster.
//! Each requested name is tried against these rules in order, first hit wins:
//! 1. Exact normalized full name
//! 2. First token and last token both match
//! 3. Single-token request matching exactly one camper's first name
//! 4. Substring containment of normalized full names, either direction

use serde::{Deserialize, Serialize};

use crate::standardize::normalize_name;
use crate::{Camper, CamperId, RawCamper};

/// Name basics for one camper, pre-normalized for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub athlete_id: CamperId,
    /// Normalized "first last"
    pub full_name: String,
    pub first_token: String,
    pub last_token: String,
}

impl RosterEntry {
    pub fn new(athlete_id: &str, first_name: &str, last_name: &str) -> Self {
        let full_name = normalize_name(&format!("{first_name} {last_name}"));
        let mut tokens = full_name.split(' ').filter(|t| !t.is_empty());
        let first_token = tokens.next().unwrap_or_default().to_string();
        let last_token = full_name
            .rsplit(' ')
            .find(|t| !t.is_empty())
            .unwrap_or_default()
            .to_string();
        Self {
            athlete_id: athlete_id.to_string(),
            full_name,
            first_token,
            last_token,
        }
    }

    pub fn from_raw(raw: &RawCamper) -> Self {
        Self::new(&raw.athlete_id, &raw.first_name, &raw.last_name)
    }

    pub fn from_camper(camper: &Camper) -> Self {
        Self::new(&camper.athlete_id, &camper.first_name, &camper.last_name)
    }
}

/// Which rule resolved a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactName,
    FirstAndLast,
    UniqueFirstName,
    Substring,
}

/// Result of matching one camper's friend requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendMatchResult {
    /// Resolved athlete ids, deduplicated, in request order
    pub matched_ids: Vec<CamperId>,
    /// How each matched id was found, parallel to `matched_ids`
    pub match_kinds: Vec<MatchKind>,
    /// Requested names that matched nobody
    pub unmatched: Vec<String>,
}

/// Match a camper's normalized friend requests against the roster.
pub fn match_friend_requests(
    requester_id: &str,
    requests: &[String],
    roster: &[RosterEntry],
) -> FriendMatchResult {
    let mut result = FriendMatchResult::default();

    for request in requests {
        match match_friend_name(request, requester_id, roster) {
            Some((athlete_id, kind)) => {
                if !result.matched_ids.contains(&athlete_id) {
                    result.matched_ids.push(athlete_id);
                    result.match_kinds.push(kind);
                }
            }
            None => result.unmatched.push(request.clone()),
        }
    }

    result
}

/// Resolve a single requested name, skipping the requester themself.
pub fn match_friend_name(
    request: &str,
    requester_id: &str,
    roster: &[RosterEntry],
) -> Option<(CamperId, MatchKind)> {
    let request = normalize_name(request);
    if request.is_empty() {
        return None;
    }

    let candidates: Vec<&RosterEntry> = roster
        .iter()
        .filter(|entry| entry.athlete_id != requester_id && !entry.full_name.is_empty())
        .collect();

    if let Some(entry) = candidates.iter().find(|e| e.full_name == request) {
        return Some((entry.athlete_id.clone(), MatchKind::ExactName));
    }

    let tokens: Vec<&str> = request.split(' ').collect();
    if tokens.len() >= 2 {
        let first = tokens[0];
        let last = tokens[tokens.len() - 1];
        if let Some(entry) = candidates
            .iter()
            .find(|e| e.first_token == first && e.last_token == last)
        {
            return Some((entry.athlete_id.clone(), MatchKind::FirstAndLast));
        }
    } else {
        let mut same_first = candidates.iter().filter(|e| e.first_token == request);
        if let (Some(entry), None) = (same_first.next(), same_first.next()) {
            return Some((entry.athlete_id.clone(), MatchKind::UniqueFirstName));
        }
    }

    candidates
        .iter()
        .find(|e| e.full_name.contains(&request) || request.contains(&e.full_name))
        .map(|entry| (entry.athlete_id.clone(), MatchKind::Substring))
}
