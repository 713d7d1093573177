use crate::commands::{build_pipeline, resolve_documents};
use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{Migrator, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Document file or directory (defaults to the configured srcDir)
    pub input: Option<PathBuf>,

    /// Rewrite documents at the current version instead of reporting
    #[arg(short, long)]
    pub write: bool,
}

/// What migrating one file did, or would do
#[derive(Debug, PartialEq)]
pub(crate) enum MigrateOutcome {
    UpToDate,
    Migrated { from: u32, applied: Vec<u32> },
    Failed(String),
}

pub fn migrate(args: MigrateArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = resolve_documents(args.input.as_deref(), &config, cwd)?;
    let pipeline = build_pipeline(&config);
    let migrator = Migrator::builtin();

    println!(
        "{} documents to version {}{}",
        "🔄 Migrating".bright_blue().bold(),
        pipeline.current_version(),
        if args.write { "" } else { " (dry run)" }
    );
    println!();

    let mut migrated = 0;
    let mut failed = 0;
    for file in &files {
        match migrate_file(&pipeline, file, args.write)? {
            MigrateOutcome::UpToDate => {
                println!("  {} {} (up to date)", "✓".green(), file.display());
            }
            MigrateOutcome::Migrated { from, applied } => {
                migrated += 1;
                println!(
                    "  {} {} v{} → v{}",
                    if args.write { "✓".green() } else { "→".cyan() },
                    file.display(),
                    from,
                    pipeline.current_version()
                );
                for version in applied {
                    let description = migrator
                        .migrations()
                        .iter()
                        .find(|m| m.version == version)
                        .map(|m| m.description)
                        .unwrap_or("");
                    println!("      v{}: {}", version, description.dimmed());
                }
            }
            MigrateOutcome::Failed(message) => {
                failed += 1;
                eprintln!("  {} {}: {}", "✗".red(), file.display(), message);
            }
        }
    }

    println!();
    println!(
        "   {} of {} documents {}",
        migrated,
        files.len(),
        if args.write { "migrated" } else { "need migration" }
    );
    if migrated > 0 && !args.write {
        println!("   Run with --write to apply");
    }

    if failed > 0 {
        bail!("{} document(s) could not be migrated", failed);
    }
    Ok(())
}

/// Migrate one document. With `write`, the migrated document is taken
/// through the rest of the load pipeline and saved at the current version.
pub(crate) fn migrate_file(pipeline: &Pipeline, path: &Path, write: bool) -> Result<MigrateOutcome> {
    let source = fs::read_to_string(path)?;

    let mut raw = match pipeline.parse(&source) {
        Ok(raw) => raw,
        Err(err) => return Ok(MigrateOutcome::Failed(err.to_string())),
    };
    let from = raw.version;

    if !write {
        return Ok(match pipeline.migrate(&mut raw) {
            Ok(applied) if applied.is_empty() => MigrateOutcome::UpToDate,
            Ok(applied) => MigrateOutcome::Migrated { from, applied },
            Err(err) => MigrateOutcome::Failed(err.to_string()),
        });
    }

    let loaded = match pipeline.load_raw(raw) {
        Ok(loaded) => loaded,
        Err(err) => return Ok(MigrateOutcome::Failed(err.to_string())),
    };
    if loaded.applied_migrations.is_empty() {
        return Ok(MigrateOutcome::UpToDate);
    }

    fs::write(path, pipeline.serialize(&loaded.content)?)?;
    Ok(MigrateOutcome::Migrated {
        from,
        applied: loaded.applied_migrations,
    })
}
