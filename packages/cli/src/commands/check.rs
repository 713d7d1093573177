use crate::commands::{build_pipeline, resolve_documents};
use crate::config::Config;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{repair_composition, Pipeline, PipelineError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document file or directory (defaults to the configured srcDir)
    pub input: Option<PathBuf>,

    /// Detach illegal children and write the repaired document back
    #[arg(long)]
    pub repair: bool,

    /// Show documents that pass
    #[arg(short, long)]
    pub verbose: bool,
}

/// Result of running the load pipeline over one file
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FileCheck {
    pub errors: usize,
    pub warnings: usize,
    pub repaired: usize,
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = resolve_documents(args.input.as_deref(), &config, cwd)?;
    let pipeline = build_pipeline(&config);

    println!("🔍 {} Pagecraft document check", "Starting".green().bold());
    println!("   Found {} documents", files.len());
    println!();

    let mut total = FileCheck::default();
    for file in &files {
        let result = check_file(&pipeline, file, args.repair, args.verbose)?;
        total.errors += result.errors;
        total.warnings += result.warnings;
        total.repaired += result.repaired;
    }

    println!();
    println!(
        "✨ {} Check complete!",
        if total.errors > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        }
    );
    println!("   Documents checked: {}", files.len());
    if total.errors > 0 {
        println!("   {} {}", "Errors:".red(), total.errors);
    }
    if total.warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), total.warnings);
    }
    if total.repaired > 0 {
        println!("   {} {}", "Repaired:".cyan(), total.repaired);
    }
    if total.errors == 0 && total.warnings == 0 {
        println!("   {} No issues found!", "✓".green());
    }

    if total.errors > 0 {
        bail!("{} document(s) cannot be opened", total.errors);
    }
    Ok(())
}

pub(crate) fn check_file(
    pipeline: &Pipeline,
    path: &Path,
    repair: bool,
    verbose: bool,
) -> Result<FileCheck> {
    let source = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = source.len(), "Checking document");

    let loaded = match pipeline.load_str(&source) {
        Ok(loaded) => loaded,
        Err(PipelineError::Format(err)) => {
            eprintln!("{} {}: {}", "✗".red(), path.display(), err);
            return Ok(FileCheck {
                errors: 1,
                ..FileCheck::default()
            });
        }
        Err(PipelineError::Structural(problems)) => {
            eprintln!("{} {}: structurally invalid", "✗".red(), path.display());
            for problem in &problems {
                eprintln!("    {}", problem);
            }
            return Ok(FileCheck {
                errors: 1,
                ..FileCheck::default()
            });
        }
    };

    if loaded.is_clean() {
        if verbose {
            println!("{} {}", "✓".green(), path.display());
        }
        return Ok(FileCheck::default());
    }

    println!("{} {}", "⚠".yellow(), path.display());
    for warning in &loaded.warnings {
        println!("    {}", warning.to_string().yellow());
    }

    let mut result = FileCheck {
        warnings: loaded.warnings.len(),
        ..FileCheck::default()
    };

    if repair {
        let (repaired, removed) = repair_composition(&loaded.content, pipeline.registry())?;
        fs::write(path, pipeline.serialize(&repaired)?)?;
        println!(
            "    {} Detached {} illegal block(s)",
            "✓".green(),
            removed.len()
        );
        result.repaired = removed.len();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, doc: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    fn gallery_with_text() -> serde_json::Value {
        json!({
            "version": 3,
            "rootId": "r",
            "nodes": {
                "r": { "id": "r", "type": "page", "childIds": ["s"] },
                "s": { "id": "s", "type": "section", "parentId": "r", "childIds": ["g"] },
                "g": { "id": "g", "type": "gallery", "parentId": "s", "childIds": ["t"] },
                "t": { "id": "t", "type": "text", "parentId": "g", "props": { "html": "hi" } }
            }
        })
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"version\": 3").unwrap();

        let pipeline = build_pipeline(&Config::default());
        let result = check_file(&pipeline, &path, false, false).unwrap();
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn test_dangling_child_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "dangling.json",
            json!({
                "version": 3,
                "rootId": "r",
                "nodes": { "r": { "id": "r", "type": "page", "childIds": ["ghost"] } }
            }),
        );

        let pipeline = build_pipeline(&Config::default());
        let result = check_file(&pipeline, &path, false, false).unwrap();
        assert_eq!(result.errors, 1);
    }

    #[test]
    fn test_composition_violation_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "page.json", gallery_with_text());
        let before = fs::read_to_string(&path).unwrap();

        let pipeline = build_pipeline(&Config::default());
        let result = check_file(&pipeline, &path, false, false).unwrap();
        assert_eq!(result.warnings, 1);
        assert_eq!(result.errors, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_repair_writes_back_a_clean_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "page.json", gallery_with_text());

        let pipeline = build_pipeline(&Config::default());
        let result = check_file(&pipeline, &path, true, false).unwrap();
        assert_eq!(result.repaired, 1);

        let again = check_file(&pipeline, &path, false, false).unwrap();
        assert_eq!(again, FileCheck::default());
    }
}
