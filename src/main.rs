use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use linefix::{
    apply_plans, check_plans, load_from_path, resolve_plans, ApplicationError, FixPlan, FixResult,
};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "linefix")]
#[command(about = "Guarded line-level fixups for generated server code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply fixes to a target tree
    Apply {
        /// Path to the target root (auto-detected if not specified)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Specific fix file to apply (otherwise applies all in fixes/)
        #[arg(short, long)]
        fixes: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check status of fixes without applying
    Check {
        /// Path to the target root (auto-detected if not specified)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Specific fix file to check
        #[arg(short, long)]
        fixes: Option<PathBuf>,
    },

    /// List available fix definitions
    List {
        /// Path to the target root (auto-detected if not specified)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            root,
            fixes,
            dry_run,
            diff,
        } => cmd_apply(root, fixes, dry_run, diff),

        Commands::Check { root, fixes } => cmd_check(root, fixes),

        Commands::List { root } => cmd_list(root),
    }
}

/// Helper: Discover all .toml fix files in `<root>/fixes`.
///
/// Fix files live alongside the target they repair; use `--fixes` to point
/// at one elsewhere. An empty result is not an error; callers fall back to
/// the built-in plan.
fn discover_fix_files(root: &Path) -> Result<Vec<PathBuf>> {
    let fixes_dir = root.join("fixes");
    if !fixes_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&fixes_dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Resolve the target root using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --root flag
/// 2. LINEFIX_ROOT environment variable
/// 3. Auto-detect from current directory
fn resolve_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    // 1. Explicit flag (highest priority)
    if let Some(path) = cli_root {
        return Ok(path.canonicalize()?);
    }

    // 2. Environment variable
    if let Ok(env_path) = env::var("LINEFIX_ROOT") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: LINEFIX_ROOT is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    // 3. Auto-detect from current directory
    if let Some(path) = auto_detect_root() {
        println!(
            "{}",
            format!("Auto-detected root: {}", path.display()).dimmed()
        );
        return Ok(path);
    }

    // 4. Helpful error with multiple solutions
    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a target root.".red(),
        "Try one of:".bold(),
        "1. cd into the directory holding index.js and run linefix apply",
        "2. Specify explicitly: linefix apply --root /path/to/server",
        "3. Set environment variable: export LINEFIX_ROOT=/path/to/server"
    )
}

/// Auto-detect the root by walking up from the current directory looking
/// for the target layout: a directory containing index.js, or a server/
/// subdirectory with one.
fn auto_detect_root() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;

    for ancestor in current.ancestors() {
        if ancestor.join("index.js").exists() {
            return Some(ancestor.to_path_buf());
        }
        let server = ancestor.join("server");
        if server.join("index.js").exists() {
            return Some(server);
        }
    }

    None
}

/// Load the plan sets to run: each discovered fix file becomes a labelled
/// set of plans, and the built-in route fixes stand in when nothing is found.
fn load_plan_sets(
    root: &Path,
    fixes: Option<PathBuf>,
) -> Result<Vec<(String, Vec<FixPlan>)>> {
    let fix_files = if let Some(path) = fixes {
        vec![path]
    } else {
        discover_fix_files(root)?
    };

    if fix_files.is_empty() {
        println!(
            "{}",
            "No fix definitions found; using built-in route fixes".dimmed()
        );
        return Ok(vec![("built-in".to_string(), vec![FixPlan::builtin()])]);
    }

    let mut sets = Vec::new();
    for fix_file in fix_files {
        let config = load_from_path(&fix_file)?;
        sets.push((fix_file.display().to_string(), resolve_plans(&config)));
    }
    Ok(sets)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(
    root: Option<PathBuf>,
    fixes: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let root = resolve_root(root)?;
    let plan_sets = load_plan_sets(&root, fixes)?;

    println!("Root: {}", root.display());
    println!();

    let mut total_applied = 0;
    let mut total_skipped = 0;
    let mut total_failed = 0;

    for (label, plans) in plan_sets {
        println!("Running fixes from {}...", label);

        // Capture target contents before applying (for diff output). On a
        // dry run nothing touches disk, so the would-be content is computed
        // in memory from the same plans.
        let mut contents_before: HashMap<PathBuf, String> = HashMap::new();
        let mut contents_after: HashMap<PathBuf, String> = HashMap::new();
        if show_diff {
            for plan in &plans {
                let target = resolve_target(&root, &plan.file);
                if let Ok(canonical) = target.canonicalize() {
                    if let Ok(content) = fs::read_to_string(&canonical) {
                        if dry_run {
                            if let Ok(report) = plan.apply_to_string(&content) {
                                contents_after.insert(canonical.clone(), report.content);
                            }
                        }
                        contents_before.insert(canonical, content);
                    }
                }
            }
        }

        let results = if dry_run {
            println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
            check_plans(&plans, &root)
        } else {
            apply_plans(&plans, &root)
        };

        for (fix_id, result) in results {
            match result {
                Ok(FixResult::Applied { ref file }) => {
                    if dry_run {
                        println!(
                            "{} {}: Would apply to {}",
                            "✓".green(),
                            fix_id,
                            file.display()
                        );
                    } else {
                        println!(
                            "{} {}: Applied to {}",
                            "✓".green(),
                            fix_id,
                            file.display()
                        );
                    }
                    total_applied += 1;

                    if show_diff {
                        if let Some(before) = contents_before.get(file) {
                            let after = if dry_run {
                                contents_after.get(file).cloned()
                            } else {
                                fs::read_to_string(file).ok()
                            };
                            if let Some(after) = after {
                                if before != &after {
                                    display_diff(file, before, &after);
                                }
                            }
                        }
                    }
                }
                Ok(FixResult::Skipped { file, reason }) => {
                    println!(
                        "{} {}: Skipped on {} ({})",
                        "⊙".yellow(),
                        fix_id,
                        file.display(),
                        reason.dimmed()
                    );
                    total_skipped += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: Error - {}", "✗".red(), fix_id, e);
                    total_failed += 1;

                    if let ApplicationError::Line { file, source } = &e {
                        eprintln!("  {}", "Target is shorter than the fix expects".red());
                        eprintln!("  File: {}", file.display());
                        eprintln!("  Detail: {}", source);
                    }
                }
            }
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} skipped", format!("{}", total_skipped).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(root: Option<PathBuf>, fixes: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let plan_sets = load_plan_sets(&root, fixes)?;

    println!("{}", "Fix Status Report".bold());
    println!("Root: {}", root.display());
    println!();

    let mut would_apply = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();

    // Read-only; does not mutate target files
    for (_, plans) in plan_sets {
        for (fix_id, result) in check_plans(&plans, &root) {
            match result {
                Ok(FixResult::Applied { .. }) => would_apply.push(fix_id),
                Ok(FixResult::Skipped { reason, .. }) => skipped.push((fix_id, reason)),
                Err(e) => failed.push((fix_id, e.to_string())),
            }
        }
    }

    if !would_apply.is_empty() {
        println!(
            "{} {} ({} fixes)",
            "✓".green(),
            "WOULD APPLY".green().bold(),
            would_apply.len()
        );
        for id in &would_apply {
            println!("  - {}", id);
        }
        println!();
    }

    if !skipped.is_empty() {
        println!(
            "{} {} ({} fixes)",
            "⊙".yellow(),
            "SKIPPED".yellow().bold(),
            skipped.len()
        );
        for (id, reason) in &skipped {
            println!("  - {} ({})", id, reason.dimmed());
        }
        println!();
    }

    if !failed.is_empty() {
        println!(
            "{} {} ({} fixes)",
            "✗".red(),
            "FAILED".red().bold(),
            failed.len()
        );
        for (id, reason) in &failed {
            println!("  - {} ({})", id, reason.dimmed());
        }
        println!();
    }

    Ok(())
}

fn cmd_list(root: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(root)?;
    let fix_files = discover_fix_files(&root)?;

    if fix_files.is_empty() {
        println!("{}", "Built-in route fixes:".bold());
        for step in &FixPlan::builtin().steps {
            println!("  - {} ({} in index.js)", step.id, step.fixup);
        }
        return Ok(());
    }

    for fix_file in fix_files {
        let config = load_from_path(&fix_file)?;
        println!("{}", fix_file.display().to_string().bold());
        if !config.meta.name.is_empty() {
            println!("  name: {}", config.meta.name);
        }
        if let Some(description) = &config.meta.description {
            println!("  {}", description.dimmed());
        }
        for fix in &config.fixes {
            println!("  - {} ({} in {})", fix.id, fix.op, fix.file);
        }
        println!();
    }

    Ok(())
}

fn resolve_target(root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
