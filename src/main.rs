//! Plotmap - field trial map planner with TUI

mod config;
mod tui;

use anyhow::Context;
use env_logger::{Builder, Env, Target};
use plotmap_core::{
    Catalog, Document, DragPolicy, ExportGrouping, GridLayout, MapSettings, Palette, load_catalog,
};
use std::env;
use std::path::{Path, PathBuf};

fn print_usage() {
    eprintln!("Usage: plotmap [OPTIONS] [MAP]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [MAP]                     Map file to open (.json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --catalog <FILE>      Genotype catalog spreadsheet (.xlsx or .csv)");
    eprintln!("  --view                    Open the read-only viewer");
    eprintln!("  -o, --output <FILE>       Export MAP to FILE (.xlsx, .csv, .json) and exit");
    eprintln!("  --grouped                 Group exported rows by plot number and column");
    eprintln!("  --per-cell                One exported row per cell");
    eprintln!("  --column-lock             Lock drag selection to the first column");
    eprintln!("  --row-major               Map files nest grid rows first (grid[row][col])");
    eprintln!("  --touch                   Tap-to-toggle selection");
    eprintln!("  --config <FILE>           Use this config file");
    eprintln!("  --log-file <FILE>         Write logs to FILE");
    eprintln!("  -h, --help                Print help");
}

/// Install the logger. The TUI owns the terminal, so interactive runs only
/// log when a file is given.
fn init_logging(log_file: Option<&Path>, interactive: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    match log_file {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Warning: Cannot open log file {}: {}", path.display(), e);
                if interactive {
                    return;
                }
            }
        },
        None if interactive => return,
        None => {
            builder.target(Target::Stderr);
        }
    }
    builder.init();
}

/// Non-interactive export of `map` to `output`.
fn export_once(
    map: &Path,
    output: &Path,
    catalog: Option<&Path>,
    settings: MapSettings,
    palette: Palette,
) -> anyhow::Result<()> {
    let catalog = match catalog {
        Some(path) => load_catalog(path, palette)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            log::warn!("No genotype catalog; parent columns will be empty");
            Catalog::empty(palette)
        }
    };
    let mut doc = Document::new(settings, catalog);
    doc.import_json_file(map)
        .with_context(|| format!("Failed to read map {}", map.display()))?;
    doc.export_file(output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut map_path: Option<PathBuf> = None;
    let mut catalog_file: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut log_file: Option<PathBuf> = None;
    let mut view = false;
    let mut grouping: Option<ExportGrouping> = None;
    let mut column_lock = false;
    let mut layout: Option<GridLayout> = None;
    let mut touch = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            flag @ ("-c" | "--catalog" | "-o" | "--output" | "--config" | "--log-file") => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: {} requires a file path", flag);
                    std::process::exit(1);
                }
                let value = Some(PathBuf::from(&args[i]));
                match flag {
                    "-c" | "--catalog" => catalog_file = value,
                    "-o" | "--output" => output_file = value,
                    "--config" => config_file = value,
                    _ => log_file = value,
                }
            }
            "--view" => view = true,
            "--grouped" => grouping = Some(ExportGrouping::Grouped),
            "--per-cell" => grouping = Some(ExportGrouping::PerCell),
            "--column-lock" => column_lock = true,
            "--row-major" => layout = Some(GridLayout::RowMajor),
            "--touch" => touch = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if map_path.is_none() {
                    map_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    if output_file.is_some() && map_path.is_none() {
        eprintln!("Error: --output requires a MAP file to export");
        print_usage();
        std::process::exit(1);
    }

    let interactive = output_file.is_none();
    init_logging(log_file.as_deref(), interactive);

    let (config, warnings) = config::load_config(config_file.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut settings = config.map.settings();
    if let Some(grouping) = grouping {
        settings.export_grouping = grouping;
    }
    if let Some(layout) = layout {
        settings.layout = layout;
    }
    if column_lock {
        settings.drag_policy = DragPolicy::ColumnLocked;
    }
    let palette = config.catalog.palette.unwrap_or(if view {
        Palette::Pastel
    } else {
        Palette::Distinct
    });
    let catalog_path = config::catalog_path(catalog_file, &config);

    if let (Some(output), Some(map)) = (output_file, map_path.as_ref()) {
        if let Err(e) = export_once(map, &output, catalog_path.as_deref(), settings, palette) {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        println!("Exported to {}", output.display());
        return;
    }

    let mut app = if view {
        tui::App::viewer(palette, settings.layout)
    } else {
        tui::App::editor(settings, palette)
    };
    app.touch = touch || config.input.touch;
    if let Some(path) = catalog_path {
        app.start_catalog_load(path);
    }
    if let Some(path) = map_path {
        app.open_or_create(path);
    }

    if let Err(e) = tui::run(&mut app) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
