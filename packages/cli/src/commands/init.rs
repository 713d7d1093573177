use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::CURRENT_VERSION;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for page documents
    #[arg(short, long, default_value = "pages")]
    pub src_dir: String,

    /// Platform modules to enable (repeatable)
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Pagecraft project...".bright_blue().bold());

    let src_dir = PathBuf::from(cwd).join(&args.src_dir);
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir)?;
        println!("  {} Created {}/", "✓".green(), args.src_dir);
    }

    let example_file = src_dir.join("home.json");
    if !example_file.exists() {
        fs::write(&example_file, serde_json::to_string_pretty(&example_document())?)?;
        println!("  {} Created home.json", "✓".green());
    }

    let mut config = Config {
        src_dir: args.src_dir.clone(),
        ..Config::default()
    };
    config.editor.enabled_modules = args.modules;

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/home.json", args.src_dir);
    println!("  2. Run: pagecraft check");
    println!("  3. Run: pagecraft publish-check");

    Ok(())
}

/// A small, publishable page at the current document version
fn example_document() -> Value {
    json!({
        "version": CURRENT_VERSION,
        "rootId": "page",
        "nodes": {
            "page": {
                "id": "page",
                "type": "page",
                "childIds": ["hero"],
                "props": { "title": "Home" }
            },
            "hero": {
                "id": "hero",
                "type": "section",
                "parentId": "page",
                "childIds": ["headline", "intro", "photo"],
                "props": { "anchor": "top" }
            },
            "headline": {
                "id": "headline",
                "type": "heading",
                "parentId": "hero",
                "props": { "text": "Welcome", "level": 1 }
            },
            "intro": {
                "id": "intro",
                "type": "text",
                "parentId": "hero",
                "props": { "html": "<p>Built with <a href=\"https://example.com\">Pagecraft</a>.</p>" }
            },
            "photo": {
                "id": "photo",
                "type": "image",
                "parentId": "hero",
                "props": { "src": "https://example.com/hero.jpg", "altText": "Storefront at dusk" }
            }
        }
    })
}
