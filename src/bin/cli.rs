//! campgroups CLI - Debug tool for camp grouping runs
//!
//! Usage:
//!   campgroups-cli group <roster.json> --camp-start <YYYY-MM-DD> [--output <file>]
//!   campgroups-cli insert-late <roster.json> <groups.json> <camper.json> --camp-start <YYYY-MM-DD>
//!
//! Rosters are JSON arrays of raw registrations. `group` prints a verbose
//! summary of each phase's outcome and can write the full output as JSON;
//! `insert-late` seats one late registrant into a previous run's groups.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use campgroups::{
    cluster, insert_late, matching::RosterEntry, run, standardize, standardize_roster,
    GroupingConfig, GroupingInput, GroupingOutput, RawCamper, Severity,
};

#[derive(Parser)]
#[command(name = "campgroups-cli")]
#[command(about = "Debug tool for camper grouping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with grouping configuration (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Standardize, cluster and place a whole roster
    Group {
        /// JSON array of raw camper registrations
        roster: PathBuf,

        /// First day of camp
        #[arg(long)]
        camp_start: NaiveDate,

        /// Write the grouping output here as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the number of groups
        #[arg(long)]
        groups: Option<usize>,

        /// Override the maximum group size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Insert one late registrant into existing groups
    InsertLate {
        /// JSON array of the registrations already grouped
        roster: PathBuf,

        /// Grouping output JSON from a previous `group` run
        groups: PathBuf,

        /// JSON object with the late registration
        camper: PathBuf,

        /// First day of camp
        #[arg(long)]
        camp_start: NaiveDate,

        /// Write the updated grouping output here as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Group {
            roster,
            camp_start,
            output,
            groups,
            max_size,
        } => {
            let mut config = config;
            if let Some(n) = groups {
                config.num_groups = n;
            }
            if let Some(n) = max_size {
                config.max_group_size = n;
            }
            run_group(&roster, camp_start, output.as_deref(), &config, cli.verbose)
        }
        Commands::InsertLate {
            roster,
            groups,
            camper,
            camp_start,
            output,
        } => run_insert_late(
            &roster,
            &groups,
            &camper,
            camp_start,
            output.as_deref(),
            &config,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<GroupingConfig, String> {
    let config: GroupingConfig = match path {
        Some(path) => read_json(path)?,
        None => GroupingConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))
}

fn write_output(output: &GroupingOutput, path: &Path) -> Result<(), String> {
    let json = output.to_json().map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("{}: {}", path.display(), e))?;
    println!("\nWrote output to {}", path.display());
    Ok(())
}

/// Run a full grouping
fn run_group(
    roster_path: &Path,
    camp_start: NaiveDate,
    output: Option<&Path>,
    config: &GroupingConfig,
    verbose: bool,
) -> Result<(), String> {
    let raws: Vec<RawCamper> = read_json(roster_path)?;

    println!("\n{}", "=".repeat(60));
    println!("CAMP GROUPING");
    println!("{}", "=".repeat(60));
    println!(
        "  {} registrations, {} groups of up to {}, grade spread <= {}",
        raws.len(),
        config.num_groups,
        config.max_group_size,
        config.max_grade_spread
    );

    println!("\n[Step 1] Standardizing roster...");
    let (mut campers, warnings) = standardize_roster(&raws, camp_start, config);
    println!("  {} campers, {} warnings", campers.len(), warnings.len());
    if verbose {
        for w in &warnings {
            println!("    [WARN] {}", w);
        }
    }

    println!("\n[Step 2] Clustering friend requests...");
    let clusters = cluster(&mut campers, config);
    println!(
        "  {} edges ({} mutual), {} friend groups, {} solo campers",
        clusters.stats.edge_count,
        clusters.stats.mutual_edge_count,
        clusters.stats.friend_group_count,
        clusters.stats.solo_campers
    );
    if verbose {
        for group in &clusters.friend_groups {
            println!(
                "    Friend group {}: {} members, grades {}..={}",
                group.id,
                group.member_count(),
                group.min_grade,
                group.max_grade
            );
            for note in &group.placement_notes {
                println!("      note: {}", note);
            }
        }
    }

    println!("\n[Step 3] Placing campers...");
    let input = GroupingInput::new(&campers, &clusters.friend_groups, config);
    let result = run(&input).map_err(|e| e.to_string())?;

    print_summary(&result, verbose);

    if let Some(path) = output {
        write_output(&result, path)?;
    }
    Ok(())
}

/// Insert a late registrant into a previous run's groups
fn run_insert_late(
    roster_path: &Path,
    groups_path: &Path,
    camper_path: &Path,
    camp_start: NaiveDate,
    output: Option<&Path>,
    config: &GroupingConfig,
) -> Result<(), String> {
    let raws: Vec<RawCamper> = read_json(roster_path)?;
    let mut previous: GroupingOutput = read_json(groups_path)?;
    let late: RawCamper = read_json(camper_path)?;

    let mut roster: Vec<RosterEntry> = raws.iter().map(RosterEntry::from_raw).collect();
    roster.push(RosterEntry::from_raw(&late));
    let standardized = standardize(&late, camp_start, &roster, config);
    for w in &standardized.warnings {
        println!("  [WARN] {}", w);
    }

    let camper = standardized.camper;
    let insertion =
        insert_late(&camper, &mut previous.groups, config).map_err(|e| e.to_string())?;

    println!("\n{}", "-".repeat(60));
    println!(
        "{} ({}, grade {}) -> group {} (score {:.1})",
        camper.full_name(),
        camper.athlete_id,
        camper.grade,
        insertion.group_id,
        insertion.score
    );
    for v in &insertion.violations {
        println!("  [HARD] {}: {}", v.title, v.description);
    }
    println!("{}", "-".repeat(60));

    if let Some(path) = output {
        write_output(&previous, path)?;
    }
    Ok(())
}

fn print_summary(result: &GroupingOutput, verbose: bool) {
    println!("\n{}", "-".repeat(60));
    println!(
        "RESULTS: {} in {:.2}ms",
        if result.success {
            "success"
        } else {
            "hard violations remain"
        },
        result.execution_time_ms
    );
    println!("{}", "-".repeat(60));

    for group in &result.groups {
        let flags = [
            (group.has_size_violation, "size"),
            (group.has_grade_violation, "grade"),
            (group.has_friend_split, "split"),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>();

        println!(
            "\n  Group {} - {} ({}): {} campers, grades {}",
            group.number,
            group.name,
            group.color,
            group.camper_count(),
            match (group.min_grade(), group.max_grade()) {
                (Some(min), Some(max)) => format!("{}..={}", min, max),
                _ => "-".to_string(),
            }
        );
        if !flags.is_empty() {
            println!("    Flags: {}", flags.join(", "));
        }
        if verbose {
            for member in group.members() {
                println!("      - {} (grade {})", member.camper_id, member.grade);
            }
        }
    }

    let stats = &result.stats;
    println!("\n  Friend groups: {} intact, {} split", stats.friend_groups_intact, stats.friend_groups_split);
    println!(
        "  Mean group size {:.2}, variance {:.2}, {} balance moves",
        stats.average_group_size, stats.group_size_variance, stats.balance_moves
    );
    println!(
        "  {} late registrations, {} grade discrepancies",
        stats.late_registrations, stats.grade_discrepancies
    );

    if !result.violations.is_empty() {
        println!("\n  Violations:");
        for v in &result.violations {
            let level = match v.severity {
                Severity::Hard => "HARD",
                Severity::Warning => "WARN",
            };
            println!("    [{}] {}", level, v.title);
            if verbose {
                println!("      {}", v.description);
                println!("      -> {}", v.suggested_resolution);
            }
        }
    }
    for w in &result.warnings {
        println!("  [NOTE] {}", w);
    }
}
