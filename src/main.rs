mod files;
mod rewrite;
mod split;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use rewrite::Pass;

#[derive(Parser)]
#[command(name = "twee_migrate", about = "Twee macro migration and file-splitting utilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert <<set $var>> macros to the <<th-set>> form
    Convert {
        /// Twee file or directory of .twee files
        path: PathBuf,
        /// Show what would be converted without writing
        #[arg(long)]
        dry_run: bool,
        /// Skip writing .backup siblings before overwriting
        #[arg(long)]
        no_backup: bool,
    },
    /// Drop redundant self-assignments inside <<th-set>> values
    FixSelfAssign {
        /// Twee file or directory of .twee files
        path: PathBuf,
        /// Show what would be fixed without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Reroute <<th-set>> calls with temporary-variable values through <<sendAction>>
    FixLocals {
        /// Twee file or directory of .twee files
        path: PathBuf,
        /// Show what would be fixed without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Split one large twee file into topic-bucketed files
    Split {
        /// The twee file to split
        input: PathBuf,
        /// Output directory (created if missing)
        #[arg(short, long, default_value = "split")]
        out_dir: PathBuf,
        /// Ordered JSON rules file (array of {bucket, keywords})
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            path,
            dry_run,
            no_backup,
        } => run_rewrite(&path, Pass::ConvertSet, dry_run, !no_backup),
        Commands::FixSelfAssign { path, dry_run } => {
            run_rewrite(&path, Pass::SelfAssign, dry_run, false)
        }
        Commands::FixLocals { path, dry_run } => run_rewrite(&path, Pass::Locals, dry_run, false),
        Commands::Split {
            input,
            out_dir,
            rules,
        } => run_split(&input, &out_dir, rules.as_deref()),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn run_rewrite(path: &Path, pass: Pass, dry_run: bool, backup: bool) -> anyhow::Result<()> {
    let targets = files::collect_twee_files(path)?;
    println!("Found {} twee file(s) to process", targets.len());
    if dry_run {
        println!("*** DRY RUN - no files will be written ***");
    }

    let pb = (targets.len() > 1).then(|| {
        let pb = ProgressBar::new(targets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    });

    let mut changed: Vec<(String, usize)> = Vec::new();
    let mut total = 0;
    for file in &targets {
        let original = files::read_file(file)?;
        let rewritten = pass.apply(&original);

        if rewritten.count > 0 {
            if !dry_run {
                if backup {
                    files::write_backup(file, &original)?;
                }
                files::write_file(file, &rewritten.text)?;
            }
            total += rewritten.count;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());
            changed.push((name, rewritten.count));
        }

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    for (name, count) in &changed {
        println!("  {name}: {count} {}", pass.noun());
    }
    println!(
        "{} {} {} across {} file(s){}",
        pass.verb(),
        total,
        pass.noun(),
        changed.len(),
        if dry_run { " (dry run)" } else { "" }
    );
    if backup && !dry_run && !changed.is_empty() {
        println!("Backups written with .backup extension");
    }

    Ok(())
}

fn run_split(input: &Path, out_dir: &Path, rules_path: Option<&Path>) -> anyhow::Result<()> {
    let content = files::read_file(input)?;
    let rules = match rules_path {
        Some(p) => split::load_rules(p)?,
        None => split::default_rules(),
    };

    let buckets = split::split_into_buckets(&content, &rules);
    let total: usize = buckets.iter().map(|(_, passages)| passages.len()).sum();
    let written = split::write_buckets(out_dir, &buckets)?;

    for (filename, count) in &written {
        println!("  {filename}: {count} passage(s)");
    }
    println!(
        "Split {} passage(s) into {} file(s) under {}",
        total,
        written.len(),
        out_dir.display()
    );

    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn convert_rewrites_in_place_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("act1.twee");
        fs::write(&story, ":: Act 1\n<<set $ships = 11>>\n").unwrap();

        run_rewrite(dir.path(), Pass::ConvertSet, false, true).unwrap();

        assert_eq!(
            fs::read_to_string(&story).unwrap(),
            ":: Act 1\n<<th-set '$ships' to 11>>\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("act1.twee.backup")).unwrap(),
            ":: Act 1\n<<set $ships = 11>>\n"
        );
    }

    #[test]
    fn dry_run_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("act1.twee");
        let src = ":: Act 1\n<<set $ships = 11>>\n";
        fs::write(&story, src).unwrap();

        run_rewrite(dir.path(), Pass::ConvertSet, true, true).unwrap();

        assert_eq!(fs::read_to_string(&story).unwrap(), src);
        assert!(!dir.path().join("act1.twee.backup").exists());
    }

    #[test]
    fn unchanged_files_get_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("clean.twee");
        fs::write(&story, ":: Act 1\nNo macros here.\n").unwrap();

        run_rewrite(dir.path(), Pass::ConvertSet, false, true).unwrap();

        assert!(!dir.path().join("clean.twee.backup").exists());
    }

    #[test]
    fn split_writes_bucket_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("story.twee");
        fs::write(&input, ":: Act 1\none\n\n:: Somewhere else\ntwo\n").unwrap();
        let out = dir.path().join("out");

        run_split(&input, &out, None).unwrap();

        assert!(out.join("08_Acts.twee").exists());
        assert!(out.join("99_Uncategorized.twee").exists());
    }
}
