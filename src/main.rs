// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;

use map_markers::{build_controller, logging, AppConfig, ExportFormat};

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            logging::init(&config.log_filter);
            let path = args.get(2).context("Usage: map-markers import <file.json>")?;
            run_import(&config, path)?;
        }
        Some("export") => {
            logging::init(&config.log_filter);
            let format = args.get(2).map(String::as_str).unwrap_or("json");
            run_export(&config, format, args.get(3).map(String::as_str))?;
        }
        Some(other) => bail!("Unknown command: {} (expected import, export or no argument)", other),
        None => {
            // The alternate screen owns stdout, keep logs quiet
            logging::init("warn");
            run_ui_mode(&config)?;
        }
    }

    Ok(())
}

/// Import a JSON batch on top of the saved project and save the result.
fn run_import(config: &AppConfig, path: &str) -> Result<()> {
    println!("📥 Importing markers from {}", path);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;

    let mut controller = build_controller(config, false)?;
    if let Ok(previous) = controller.load_project() {
        println!("📂 Appending to saved project ({} markers)", previous.imported);
    }
    let before = controller.registry().len();
    let report = controller.import(&text)?;

    println!("✓ {}", report.summary());
    for skip in &report.skipped {
        println!("  ⚠️  item {} skipped: {:?}", skip.index, skip.reason);
    }

    let saved = controller.save_project()?;
    println!("\n💾 Project saved ({} markers, {} new)", saved, saved - before);

    Ok(())
}

/// Export the saved project to a file.
fn run_export(config: &AppConfig, format: &str, path: Option<&str>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let path = path.unwrap_or(format.file_name());

    let mut controller = build_controller(config, false)?;
    match controller.load_project() {
        Ok(report) => println!("📂 Loaded saved project: {}", report.summary()),
        Err(err) => println!("📂 {}", err),
    }

    let body = controller.export(format)?;
    fs::write(path, body).with_context(|| format!("Failed to write {}", path))?;
    println!(
        "✓ Exported {} markers to {} ({})",
        controller.registry().len(),
        path,
        format.mime_type()
    );

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🗺️  Loading map markers...\n");

    let controller = build_controller(config, true)?;
    println!("✓ {} markers ready", controller.registry().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(controller);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the JSON API: cargo run --bin map-server --features server");
    std::process::exit(1);
}
