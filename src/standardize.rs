//! Roster standardization.
//!
//! Converts raw registration fields into the canonical values placement
//! works with:
//! - Age in years and months at camp start
//! - Reported grade parsing ("Pre-K", "K", "3rd grade", "fifth")
//! - Grade computed from date of birth using the school-year cutoff
//! - Discrepancy and late-registration flags
//! - Friend-request name normalization and matching
//!
//! Malformed input never aborts standardization. Each problem becomes a
//! warning and the camper is built with best-effort defaults.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::debug;

use crate::matching::{match_friend_requests, RosterEntry};
use crate::{Camper, FriendRequests, GroupingConfig, RawCamper, MAX_GRADE, MIN_GRADE};

/// Grade assumed when neither a reported grade nor a date of birth is usable.
pub const FALLBACK_GRADE: i32 = 0;

/// Age at which a child typically starts 1st grade minus one (grade = age - 5).
const SCHOOL_AGE_OFFSET: i32 = 5;

const SPELLED_ORDINALS: [&str; 12] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
    "eleventh", "twelfth",
];

/// A standardized camper plus the warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedCamper {
    pub camper: Camper,
    pub warnings: Vec<String>,
}

/// Standardize one raw registration.
///
/// `roster` holds the basics of every camper in the same camp and is used to
/// resolve friend requests; the camper's own entry is skipped.
pub fn standardize(
    raw: &RawCamper,
    camp_start: NaiveDate,
    roster: &[RosterEntry],
    config: &GroupingConfig,
) -> StandardizedCamper {
    let mut warnings = Vec::new();
    let label = camper_label(raw);

    let date_of_birth = match raw.date_of_birth.as_deref().map(str::trim) {
        None | Some("") => {
            warnings.push(format!("{label}: missing date of birth"));
            None
        }
        Some(text) => match parse_date(text) {
            Some(dob) if dob <= camp_start => Some(dob),
            Some(dob) => {
                warnings.push(format!(
                    "{label}: date of birth {dob} is after camp start {camp_start}"
                ));
                None
            }
            None => {
                warnings.push(format!("{label}: unparseable date of birth '{text}'"));
                None
            }
        },
    };

    let (age_years, age_months) = match date_of_birth {
        Some(dob) => {
            let (years, months) = calculate_age(dob, camp_start);
            (Some(years), Some(months))
        }
        None => (None, None),
    };

    let dob_grade = date_of_birth.map(|dob| grade_from_dob(dob, camp_start, config.cutoff_month));

    let parsed_grade = match raw.reported_grade.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => {
            let parsed = parse_grade(text);
            if parsed.is_none() {
                warnings.push(format!("{label}: unrecognized grade '{text}'"));
            }
            parsed
        }
    };

    let grade = match (parsed_grade, dob_grade) {
        (Some(reported), _) => reported,
        (None, Some(computed)) => computed,
        (None, None) => {
            warnings.push(format!(
                "{label}: no usable grade or date of birth, defaulting to grade {FALLBACK_GRADE}"
            ));
            FALLBACK_GRADE
        }
    };

    let has_grade_discrepancy = match (parsed_grade, dob_grade) {
        (Some(reported), Some(computed)) => {
            has_grade_discrepancy(reported, computed, config.discrepancy_threshold)
        }
        _ => false,
    };

    let friend_requests = parse_friend_requests(&raw.friend_requests);
    let matches = match_friend_requests(&raw.athlete_id, &friend_requests, roster);
    if !matches.unmatched.is_empty() {
        warnings.push(format!(
            "{label}: {} friend request(s) matched no camper: {}",
            matches.unmatched.len(),
            matches.unmatched.join(", ")
        ));
    }

    let is_late_registration = raw.registered_at.map_or(false, |registered_at| {
        is_late_registration(registered_at, camp_start, config.late_registration_days)
    });

    debug!(
        "[Standardize] {label}: grade={grade} dob_grade={dob_grade:?} friends={} late={is_late_registration}",
        matches.matched_ids.len()
    );

    let camper = Camper {
        athlete_id: raw.athlete_id.clone(),
        registration_id: raw.registration_id.clone(),
        first_name: raw.first_name.trim().to_string(),
        last_name: raw.last_name.trim().to_string(),
        date_of_birth,
        age_years,
        age_months,
        reported_grade: raw.reported_grade.clone(),
        grade,
        dob_grade,
        has_grade_discrepancy,
        friend_requests,
        matched_friend_ids: matches.matched_ids,
        friend_group_id: None,
        is_late_registration,
        medical_notes: raw.medical_notes.clone(),
        allergies: raw.allergies.clone(),
        special_considerations: raw.special_considerations.clone(),
        assignment: raw.current_assignment.clone(),
    };

    StandardizedCamper { camper, warnings }
}

/// Standardize a whole camp roster.
///
/// Returns campers in input order plus every warning raised.
pub fn standardize_roster(
    raws: &[RawCamper],
    camp_start: NaiveDate,
    config: &GroupingConfig,
) -> (Vec<Camper>, Vec<String>) {
    let roster: Vec<RosterEntry> = raws.iter().map(RosterEntry::from_raw).collect();
    let mut campers = Vec::with_capacity(raws.len());
    let mut warnings = Vec::new();

    for raw in raws {
        let standardized = standardize(raw, camp_start, &roster, config);
        campers.push(standardized.camper);
        warnings.extend(standardized.warnings);
    }

    (campers, warnings)
}

/// Parallel version of [`standardize_roster`]. Output order matches input order.
#[cfg(feature = "parallel")]
pub fn standardize_roster_parallel(
    raws: &[RawCamper],
    camp_start: NaiveDate,
    config: &GroupingConfig,
) -> (Vec<Camper>, Vec<String>) {
    use rayon::prelude::*;

    let roster: Vec<RosterEntry> = raws.iter().map(RosterEntry::from_raw).collect();
    let standardized: Vec<StandardizedCamper> = raws
        .par_iter()
        .map(|raw| standardize(raw, camp_start, &roster, config))
        .collect();

    let mut campers = Vec::with_capacity(standardized.len());
    let mut warnings = Vec::new();
    for s in standardized {
        campers.push(s.camper);
        warnings.extend(s.warnings);
    }
    (campers, warnings)
}

/// Whole years and total whole months between `dob` and `on`.
///
/// A month or year only counts once its anniversary day has been reached.
pub fn calculate_age(dob: NaiveDate, on: NaiveDate) -> (u32, u32) {
    let mut months = (on.year() - dob.year()) * 12 + on.month() as i32 - dob.month() as i32;
    if on.day() < dob.day() {
        months -= 1;
    }
    let months = months.max(0) as u32;
    (months / 12, months)
}

/// First day of the school year that contains `camp_start`.
pub fn school_year_start(camp_start: NaiveDate, cutoff_month: u32) -> NaiveDate {
    let month = cutoff_month.clamp(1, 12);
    let year = if camp_start.month() >= month {
        camp_start.year()
    } else {
        camp_start.year() - 1
    };
    // Day 1 exists in every month
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(camp_start)
}

/// Grade implied by date of birth: age at school-year start minus five.
pub fn grade_from_dob(dob: NaiveDate, camp_start: NaiveDate, cutoff_month: u32) -> i32 {
    let year_start = school_year_start(camp_start, cutoff_month);
    let age = if dob <= year_start {
        calculate_age(dob, year_start).0 as i32
    } else {
        0
    };
    (age - SCHOOL_AGE_OFFSET).clamp(MIN_GRADE, MAX_GRADE)
}

/// Parse a free-text grade.
///
/// Recognizes Pre-K (-1), Kindergarten (0), numeric grades with optional
/// ordinal suffix and "grade" word, and spelled-out ordinals.
pub fn parse_grade(text: &str) -> Option<i32> {
    let lowered = text.trim().to_lowercase();
    let compact: String = lowered.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if compact.is_empty() {
        return None;
    }

    if matches!(compact.as_str(), "prek" | "pk" | "prekindergarten" | "preschool" | "tk") {
        return Some(-1);
    }
    if compact.starts_with("prek") {
        return Some(-1);
    }
    if matches!(compact.as_str(), "k" | "kg" | "kinder" | "gradek") || compact.starts_with("kindergar")
    {
        return Some(0);
    }

    let stripped = compact.replace("grade", "");
    let stripped = stripped.strip_prefix("gr").unwrap_or(&stripped);

    if let Some(idx) = SPELLED_ORDINALS.iter().position(|word| *word == stripped) {
        return Some(idx as i32 + 1);
    }

    let digits: String = stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
    let suffix = &stripped[digits.len()..];
    if digits.is_empty() || !matches!(suffix, "" | "st" | "nd" | "rd" | "th") {
        return None;
    }
    match digits.parse::<i32>() {
        Ok(n) if (1..=MAX_GRADE).contains(&n) => Some(n),
        _ => None,
    }
}

/// Whether reported and computed grades differ by more than `threshold` levels.
pub fn has_grade_discrepancy(reported: i32, computed: i32, threshold: i32) -> bool {
    (reported - computed).abs() > threshold
}

/// Whether a registration came in fewer than `window_days` days before camp start.
pub fn is_late_registration(
    registered_at: DateTime<Utc>,
    camp_start: NaiveDate,
    window_days: i64,
) -> bool {
    let days_before = (camp_start - registered_at.date_naive()).num_days();
    days_before < window_days
}

/// Split and normalize friend-request names.
///
/// Free text is split on commas, semicolons and newlines. Empty entries are
/// dropped.
pub fn parse_friend_requests(requests: &FriendRequests) -> Vec<String> {
    let pieces: Vec<&str> = match requests {
        FriendRequests::List(items) => items.iter().map(String::as_str).collect(),
        FriendRequests::Text(text) => text.split([',', ';', '\n']).collect(),
    };

    pieces
        .into_iter()
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Lower-case, keep only letters and spaces, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let letters: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphabetic() { c } else if c.is_whitespace() { ' ' } else { '\0' })
        .filter(|c| *c != '\0')
        .collect();
    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // Accept full timestamps by keeping only the date part
    let date_part = text.split(['T', ' ']).next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}

fn camper_label(raw: &RawCamper) -> String {
    let name = format!("{} {}", raw.first_name.trim(), raw.last_name.trim());
    let name = name.trim();
    if name.is_empty() {
        raw.athlete_id.clone()
    } else {
        format!("{name} ({})", raw.athlete_id)
    }
}
