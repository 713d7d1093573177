use crate::commands::{build_pipeline, resolve_documents};
use crate::config::Config;
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use pagecraft_editor::Pipeline;
use pagecraft_linter::{PublishOptions, PublishReport};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct PublishCheckArgs {
    /// Document file or directory (defaults to the configured srcDir)
    pub input: Option<PathBuf>,

    /// Enable an extra platform module for this run (repeatable)
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Publish readiness of one document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    #[serde(flatten)]
    pub report: PublishReport,
}

impl DocumentReport {
    pub fn is_publishable(&self) -> bool {
        self.load_error.is_none() && self.report.is_publishable()
    }
}

pub fn publish_check(args: PublishCheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = resolve_documents(args.input.as_deref(), &config, cwd)?;
    let pipeline = build_pipeline(&config);

    let mut options = config.editor.publish_options();
    options.enabled_modules.extend(args.modules);

    let reports: Vec<DocumentReport> = files
        .iter()
        .map(|file| publish_check_file(&pipeline, &options, file))
        .collect::<Result<_>>()?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => print_reports(&reports),
    }

    let blocked = reports.iter().filter(|r| !r.is_publishable()).count();
    if blocked > 0 {
        bail!("{} document(s) are not ready to publish", blocked);
    }
    Ok(())
}

pub(crate) fn publish_check_file(
    pipeline: &Pipeline,
    options: &PublishOptions,
    path: &Path,
) -> Result<DocumentReport> {
    let source = fs::read_to_string(path)?;
    let path = path.display().to_string();

    Ok(match pipeline.load_str(&source) {
        Ok(loaded) => DocumentReport {
            path,
            load_error: None,
            report: pipeline.publish_validate(&loaded.content, options),
        },
        Err(err) => DocumentReport {
            path,
            load_error: Some(err.to_string()),
            report: PublishReport::default(),
        },
    })
}

fn print_reports(reports: &[DocumentReport]) {
    println!("📋 {} Pagecraft publish check", "Starting".green().bold());
    println!();

    for report in reports {
        if let Some(err) = &report.load_error {
            eprintln!("{} {}: {}", "✗".red(), report.path, err);
            continue;
        }
        if report.report.is_publishable() {
            println!("{} {}", "✓".green(), report.path);
            continue;
        }

        println!("{} {}", "✗".red(), report.path);
        for error in &report.report.errors {
            let node = error.node_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
            match &error.module_key {
                Some(module) => println!(
                    "    {} {} {} ({})",
                    "☐".yellow(),
                    node.bright_white(),
                    error.message,
                    module.cyan()
                ),
                None => println!("    {} {} {}", "☐".yellow(), node.bright_white(), error.message),
            }
        }
    }

    let ready = reports.iter().filter(|r| r.is_publishable()).count();
    println!();
    println!("   Ready to publish: {}/{}", ready, reports.len());
}
