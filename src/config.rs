//! User configuration (`config.toml`).
//!
//! Every problem becomes a warning; defaults are used for whatever could not
//! be read.

use directories::ProjectDirs;
use plotmap_core::grid::MAX_GRID_CELLS;
use plotmap_core::{DragPolicy, ExportGrouping, GridLayout, MapSettings, Palette};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Catalog file name looked up when none is configured.
pub const DEFAULT_CATALOG_FILE: &str = "Germplasm.xlsx";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map: MapConfig,
    pub catalog: CatalogConfig,
    pub input: InputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub columns: usize,
    pub plants_per_column: usize,
    pub starting_plot_number: u32,
    pub drag: DragPolicy,
    pub export_grouping: ExportGrouping,
    pub layout: GridLayout,
}

impl Default for MapConfig {
    fn default() -> Self {
        let defaults = MapSettings::default();
        Self {
            columns: defaults.columns,
            plants_per_column: defaults.plants_per_column,
            starting_plot_number: defaults.starting_plot_number,
            drag: defaults.drag_policy,
            export_grouping: defaults.export_grouping,
            layout: defaults.layout,
        }
    }
}

impl MapConfig {
    pub fn settings(&self) -> MapSettings {
        MapSettings {
            columns: self.columns,
            plants_per_column: self.plants_per_column,
            starting_plot_number: self.starting_plot_number,
            drag_policy: self.drag,
            export_grouping: self.export_grouping,
            layout: self.layout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    /// Unset means the surface's own default.
    pub palette: Option<Palette>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub touch: bool,
}

pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let path = config_file.map(Path::to_path_buf).or_else(user_config_path);
    let mut config = Config::default();

    if let Some(path) = path.as_ref() {
        if path.exists() {
            match read_config_file(path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(parsed) => config = parsed,
                    Err(err) => {
                        warnings.push(format!("Failed to parse {}: {}", path.display(), err))
                    }
                },
                Err(err) => warnings.push(err),
            }
        } else if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
    }

    let map = &config.map;
    let too_large = map
        .columns
        .checked_mul(map.plants_per_column)
        .is_none_or(|total| total > MAX_GRID_CELLS);
    if map.columns == 0 || map.plants_per_column == 0 || too_large {
        warnings.push(format!(
            "Ignoring map size {}x{}: dimensions must be positive and at most {} cells",
            map.columns, map.plants_per_column, MAX_GRID_CELLS
        ));
        let defaults = MapSettings::default();
        config.map.columns = defaults.columns;
        config.map.plants_per_column = defaults.plants_per_column;
    }

    (config, warnings)
}

fn read_config_file(path: &Path) -> Result<String, String> {
    let meta = std::fs::metadata(path)
        .map_err(|err| format!("Failed to read {}: {}", path.display(), err))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(format!(
            "Refusing to read {}: config file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        ));
    }
    std::fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {}", path.display(), err))
}

fn config_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "plotmap")?;
    Some(proj.config_dir().to_path_buf())
}

fn user_config_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Some(path)
}

/// Resolve the genotype catalog: the command line wins, then the config file,
/// then `Germplasm.xlsx` in the working directory, then in the config directory.
pub fn catalog_path(cli: Option<PathBuf>, config: &Config) -> Option<PathBuf> {
    cli.or_else(|| config.catalog.path.clone()).or_else(|| {
        let local = PathBuf::from(DEFAULT_CATALOG_FILE);
        if local.exists() {
            return Some(local);
        }
        let in_config = config_dir()?.join(DEFAULT_CATALOG_FILE);
        in_config.exists().then_some(in_config)
    })
}
