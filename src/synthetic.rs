//! Synthetic camp rosters for stress testing and benchmarking.
//!
//! Generates seeded, reproducible rosters with known friend clusters, either
//! as already-standardized [`Camper`]s or as [`RawCamper`] registrations
//! whose dates of birth agree with their reported grades.
//!
//! Feature-gated behind `synthetic` and not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use campgroups::synthetic::SyntheticRoster;
//!
//! let roster = SyntheticRoster {
//!     camper_count: 60,
//!     seed: 7,
//!     ..SyntheticRoster::default()
//! };
//! let campers = roster.generate_campers();
//! assert_eq!(campers.len(), 60);
//! ```

use chrono::{Datelike, Days, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::standardize::school_year_start;
use crate::{Camper, FriendRequests, RawCamper, MAX_GRADE, MIN_GRADE};

const FIRST_NAMES: [&str; 16] = [
    "Ava", "Liam", "Maya", "Noah", "Zoe", "Eli", "Nora", "Owen", "Ruby", "Theo", "Iris", "Jude",
    "Lena", "Milo", "Tess", "Finn",
];

const LAST_NAMES: [&str; 12] = [
    "Parker", "Reyes", "Brooks", "Nguyen", "Foster", "Kim", "Hayes", "Silva", "Moore", "Patel",
    "Ward", "Quinn",
];

/// Roster generation parameters.
#[derive(Debug, Clone)]
pub struct SyntheticRoster {
    pub camper_count: usize,
    /// Lowest grade generated (clamped to Pre-K)
    pub min_grade: i32,
    /// Highest grade generated (clamped to 12)
    pub max_grade: i32,
    /// Chance (0.0-1.0) that a camper starts a new friend cluster
    pub friend_request_rate: f64,
    /// Largest friend cluster generated
    pub max_cluster_size: usize,
    /// RNG seed for deterministic reproduction
    pub seed: u64,
}

impl Default for SyntheticRoster {
    fn default() -> Self {
        Self {
            camper_count: 60,
            min_grade: 0,
            max_grade: 5,
            friend_request_rate: 0.3,
            max_cluster_size: 4,
            seed: 42,
        }
    }
}

/// One generated camper before it is rendered as either form.
struct Draft {
    id: String,
    first_name: String,
    last_name: String,
    grade: i32,
    /// Index of the camper this one asks to be with
    requests: Option<usize>,
}

impl SyntheticRoster {
    /// Standardized campers with matched friend ids already filled in.
    pub fn generate_campers(&self) -> Vec<Camper> {
        let drafts = self.drafts();
        drafts
            .iter()
            .map(|d| {
                let camper = Camper::new(&d.id, &d.first_name, &d.last_name, d.grade);
                match d.requests {
                    Some(friend) => camper.with_friends(&[drafts[friend].id.as_str()]),
                    None => camper,
                }
            })
            .collect()
    }

    /// Raw registrations for a camp starting on `camp_start`.
    ///
    /// Friend requests are written as full names and every camper registers
    /// well before the late window.
    pub fn generate_raw(&self, camp_start: NaiveDate, cutoff_month: u32) -> Vec<RawCamper> {
        let drafts = self.drafts();
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let year_start = school_year_start(camp_start, cutoff_month);
        let registered_at = camp_start
            .checked_sub_days(Days::new(60))
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt));

        drafts
            .iter()
            .map(|d| {
                let friend_requests = match d.requests {
                    Some(friend) => FriendRequests::Text(format!(
                        "{} {}",
                        drafts[friend].first_name, drafts[friend].last_name
                    )),
                    None => FriendRequests::default(),
                };
                RawCamper {
                    athlete_id: d.id.clone(),
                    registration_id: format!("reg-{}", d.id),
                    first_name: d.first_name.clone(),
                    last_name: d.last_name.clone(),
                    date_of_birth: Some(birth_date(year_start, d.grade, &mut rng).to_string()),
                    reported_grade: Some(grade_label(d.grade)),
                    friend_requests,
                    registered_at,
                    ..RawCamper::default()
                }
            })
            .collect()
    }

    fn drafts(&self) -> Vec<Draft> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let min = self.min_grade.clamp(MIN_GRADE, MAX_GRADE);
        let max = self.max_grade.clamp(min, MAX_GRADE);

        let mut drafts: Vec<Draft> = (0..self.camper_count)
            .map(|i| Draft {
                id: format!("syn-{i:04}"),
                first_name: FIRST_NAMES[i % FIRST_NAMES.len()].to_string(),
                last_name: unique_last_name(i),
                grade: rng.gen_range(min..=max),
                requests: None,
            })
            .collect();

        // Chain consecutive campers into clusters of near-grade friends
        let mut i = 0;
        while i < drafts.len() {
            if self.max_cluster_size >= 2 && rng.gen_bool(self.friend_request_rate.clamp(0.0, 1.0))
            {
                let size = rng.gen_range(2..=self.max_cluster_size);
                let end = (i + size).min(drafts.len());
                let anchor = drafts[i].grade;
                for j in i + 1..end {
                    drafts[j].requests = Some(j - 1);
                    let offset = rng.gen_range(-1..=1);
                    drafts[j].grade = (anchor + offset).clamp(min, max);
                }
                i = end;
            } else {
                i += 1;
            }
        }
        drafts
    }
}

/// Names are letters only so they survive name normalization unchanged.
fn unique_last_name(index: usize) -> String {
    let mut name = LAST_NAMES[index % LAST_NAMES.len()].to_string();
    let mut n = index / LAST_NAMES.len();
    while n > 0 {
        n -= 1;
        name.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
    }
    name
}

/// A birth date whose age at `year_start` maps to `grade`.
fn birth_date(year_start: NaiveDate, grade: i32, rng: &mut StdRng) -> NaiveDate {
    let base = year_start
        .with_year(year_start.year() - (grade + 5))
        .unwrap_or(year_start);
    base.checked_sub_days(Days::new(rng.gen_range(0..300)))
        .unwrap_or(base)
}

fn grade_label(grade: i32) -> String {
    match grade {
        -1 => "Pre-K".to_string(),
        0 => "K".to_string(),
        1 => "1st".to_string(),
        2 => "2nd".to_string(),
        3 => "3rd".to_string(),
        g => format!("{g}th"),
    }
}
