//! Default display names and colors for camp groups.
//!
//! Plain lookup tables indexed by group position. Group numbers are 1-based.

/// Default group names, in group-number order.
pub const GROUP_NAMES: [&str; 12] = [
    "Eagles", "Falcons", "Hawks", "Owls", "Ravens", "Condors", "Kestrels", "Ospreys", "Herons",
    "Pelicans", "Cardinals", "Robins",
];

/// Default group colors (hex), in group-number order.
pub const GROUP_COLORS: [&str; 8] = [
    "#E53935", "#1E88E5", "#43A047", "#FB8C00", "#8E24AA", "#00ACC1", "#FDD835", "#6D4C41",
];

/// Display name for a group number. Numbers past the table become "Group N".
pub fn group_name(number: u32) -> String {
    number
        .checked_sub(1)
        .and_then(|idx| GROUP_NAMES.get(idx as usize))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Group {number}"))
}

/// Display color for a group number. Colors cycle when groups outnumber the table.
pub fn group_color(number: u32) -> &'static str {
    let idx = number.saturating_sub(1) as usize % GROUP_COLORS.len();
    GROUP_COLORS[idx]
}
