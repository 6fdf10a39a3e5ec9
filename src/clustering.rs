//! Friendship graph clustering.
//!
//! Builds an undirected graph from matched friend requests and groups
//! campers into connected components with Union-Find. Multi-member
//! components become [`FriendGroup`]s; isolated campers are solo campers.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::union_find::UnionFind;
use crate::{Camper, CamperId, FriendGroupId, GroupingConfig};

/// An undirected friendship edge between two campers.
///
/// Stored canonically with `from < to`. `mutual` is true when both campers
/// independently requested each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEdge {
    pub from: CamperId,
    pub to: CamperId,
    pub mutual: bool,
}

/// A connected component of the friendship graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendGroup {
    pub id: FriendGroupId,
    /// Members in roster order
    pub member_ids: Vec<CamperId>,
    pub min_grade: i32,
    pub max_grade: i32,
    pub grade_spread: i32,
    /// More members than a group can hold
    pub exceeds_size: bool,
    /// Grade spread larger than a group allows
    pub exceeds_grade_spread: bool,
    /// Why the group may need splitting
    pub placement_notes: Vec<String>,
}

impl FriendGroup {
    /// Build a friend group from its members, analysing it against `config`.
    pub fn from_members(
        id: FriendGroupId,
        member_ids: Vec<CamperId>,
        grades: &[i32],
        config: &GroupingConfig,
    ) -> Self {
        let min_grade = grades.iter().copied().min().unwrap_or(0);
        let max_grade = grades.iter().copied().max().unwrap_or(0);
        let grade_spread = max_grade - min_grade;
        let exceeds_size = member_ids.len() > config.max_group_size;
        let exceeds_grade_spread = grade_spread > config.max_grade_spread;

        let mut placement_notes = Vec::new();
        if exceeds_size {
            placement_notes.push(format!(
                "{} friends exceed the group size limit of {}; the group must be split",
                member_ids.len(),
                config.max_group_size
            ));
        }
        if exceeds_grade_spread {
            placement_notes.push(format!(
                "grades {} to {} span {} levels, more than the allowed {}; keeping them together violates the grade limit",
                min_grade, max_grade, grade_spread, config.max_grade_spread
            ));
        }

        Self {
            id,
            member_ids,
            min_grade,
            max_grade,
            grade_spread,
            exceeds_size,
            exceeds_grade_spread,
            placement_notes,
        }
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    /// True when the whole group fits one camp group without breaking a limit.
    pub fn can_be_placed_intact(&self) -> bool {
        !self.exceeds_size && !self.exceeds_grade_spread
    }
}

/// Summary counts from clustering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub total_campers: usize,
    pub edge_count: usize,
    pub mutual_edge_count: usize,
    pub friend_group_count: usize,
    pub clustered_campers: usize,
    pub solo_campers: usize,
    pub largest_group: usize,
    pub groups_needing_split: usize,
}

/// Result of clustering a roster.
#[derive(Debug, Clone, Default)]
pub struct ClusterResult {
    /// Friend groups, largest first
    pub friend_groups: Vec<FriendGroup>,
    /// Campers with no friendship edges, in roster order
    pub solo_camper_ids: Vec<CamperId>,
    /// Canonical deduplicated edges
    pub edges: Vec<FriendEdge>,
    pub warnings: Vec<String>,
    pub stats: ClusterStats,
}

/// Build canonical friendship edges from each camper's matched friend ids.
///
/// Self-references and ids outside the roster are skipped with a warning.
pub fn build_friend_edges(campers: &[Camper]) -> (Vec<FriendEdge>, Vec<String>) {
    let known: HashSet<&str> = campers.iter().map(|c| c.athlete_id.as_str()).collect();
    let mut directed: HashSet<(&str, &str)> = HashSet::new();
    let mut warnings = Vec::new();

    for camper in campers {
        for friend_id in &camper.matched_friend_ids {
            if friend_id == &camper.athlete_id {
                continue;
            }
            if !known.contains(friend_id.as_str()) {
                warnings.push(format!(
                    "{}: friend '{}' is not on this camp's roster",
                    camper.athlete_id, friend_id
                ));
                continue;
            }
            directed.insert((camper.athlete_id.as_str(), friend_id.as_str()));
        }
    }

    // Canonical unordered pairs; BTreeMap keeps edge order stable
    let mut pairs: BTreeMap<(&str, &str), bool> = BTreeMap::new();
    for &(a, b) in &directed {
        let key = if a < b { (a, b) } else { (b, a) };
        let mutual = directed.contains(&(b, a));
        pairs.insert(key, mutual);
    }

    let edges = pairs
        .into_iter()
        .map(|((from, to), mutual)| FriendEdge {
            from: from.to_string(),
            to: to.to_string(),
            mutual,
        })
        .collect();

    (edges, warnings)
}

/// Cluster campers into friend groups.
///
/// Stamps `friend_group_id` on every camper: the group id for clustered
/// campers, `None` for solo campers. This is the only mutation performed.
pub fn cluster(campers: &mut [Camper], config: &GroupingConfig) -> ClusterResult {
    let (edges, warnings) = build_friend_edges(campers);

    let ids: Vec<CamperId> = campers.iter().map(|c| c.athlete_id.clone()).collect();
    let mut uf = UnionFind::with_capacity(ids.len());
    for id in &ids {
        uf.make_set(id.clone());
    }
    for edge in &edges {
        uf.union(&edge.from, &edge.to);
    }

    let grade_of: HashMap<&str, i32> = campers
        .iter()
        .map(|c| (c.athlete_id.as_str(), c.grade))
        .collect();

    let mut friend_groups = Vec::new();
    let mut solo_camper_ids = Vec::new();
    for component in uf.components_in_order(&ids) {
        if component.len() == 1 {
            solo_camper_ids.extend(component);
            continue;
        }
        let grades: Vec<i32> = component
            .iter()
            .map(|id| grade_of.get(id.as_str()).copied().unwrap_or(0))
            .collect();
        let id = friend_groups.len() as FriendGroupId + 1;
        friend_groups.push(FriendGroup::from_members(id, component, &grades, config));
    }

    // Largest first for placement priority; stable keeps discovery order on ties
    friend_groups.sort_by(|a, b| b.member_count().cmp(&a.member_count()));

    let group_of: HashMap<&str, FriendGroupId> = friend_groups
        .iter()
        .flat_map(|g| g.member_ids.iter().map(move |id| (id.as_str(), g.id)))
        .collect();
    for camper in campers.iter_mut() {
        camper.friend_group_id = group_of.get(camper.athlete_id.as_str()).copied();
    }

    for group in &friend_groups {
        debug!(
            "[Cluster] Friend group {}: {} members, grades {}..={}, intact={}",
            group.id,
            group.member_count(),
            group.min_grade,
            group.max_grade,
            group.can_be_placed_intact()
        );
    }

    let clustered_campers: usize = friend_groups.iter().map(|g| g.member_count()).sum();
    let stats = ClusterStats {
        total_campers: ids.len(),
        edge_count: edges.len(),
        mutual_edge_count: edges.iter().filter(|e| e.mutual).count(),
        friend_group_count: friend_groups.len(),
        clustered_campers,
        solo_campers: solo_camper_ids.len(),
        largest_group: friend_groups.first().map_or(0, |g| g.member_count()),
        groups_needing_split: friend_groups
            .iter()
            .filter(|g| !g.can_be_placed_intact())
            .count(),
    };

    info!(
        "[Cluster] {} campers -> {} friend groups ({} campers), {} solo, {} edges ({} mutual)",
        stats.total_campers,
        stats.friend_group_count,
        stats.clustered_campers,
        stats.solo_campers,
        stats.edge_count,
        stats.mutual_edge_count
    );

    ClusterResult {
        friend_groups,
        solo_camper_ids,
        edges,
        warnings,
        stats,
    }
}
