// ⚙️ Configuration - environment variables with defaults

use crate::geo::LatLng;
use crate::transfer::ImportOptions;
use crate::widget::MapConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "data/map-state.db";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite file backing the persisted UI state (`MAP_DB_PATH`)
    pub db_path: PathBuf,
    /// HTTP port for `map-server` (`MAP_PORT`)
    pub port: u16,
    /// `MAP_CONTAINER`, `MAP_CENTER_LAT`, `MAP_CENTER_LNG`, `MAP_ZOOM`
    pub map: MapConfig,
    /// `MAP_IMPORT_VALIDATE`
    pub import_validate: bool,
    /// Fallback tracing filter when `RUST_LOG` is unset (`MAP_LOG`)
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            port: DEFAULT_PORT,
            map: MapConfig::default(),
            import_validate: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take their default; set but
    /// unparsable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let db_path = lookup("MAP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let port = parse_var(&lookup, "MAP_PORT")?.unwrap_or(defaults.port);

        let container = lookup("MAP_CONTAINER").unwrap_or(defaults.map.container);
        let lat = parse_var(&lookup, "MAP_CENTER_LAT")?.unwrap_or(defaults.map.center.lat);
        let lng = parse_var(&lookup, "MAP_CENTER_LNG")?.unwrap_or(defaults.map.center.lng);
        let zoom = parse_var(&lookup, "MAP_ZOOM")?.unwrap_or(defaults.map.zoom);

        let import_validate =
            parse_var(&lookup, "MAP_IMPORT_VALIDATE")?.unwrap_or(defaults.import_validate);
        let log_filter = lookup("MAP_LOG").unwrap_or(defaults.log_filter);

        Ok(AppConfig {
            db_path,
            port,
            map: MapConfig {
                container,
                center: LatLng::new(lat, lng),
                zoom,
            },
            import_validate,
            log_filter,
        })
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            validate: self.import_validate,
            ..ImportOptions::default()
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}
