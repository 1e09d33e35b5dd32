//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields
//! and where values are validated.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigError;
use super::settings::*;
use crate::coord::{MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

/// One INI section, possibly absent.
struct Section<'a> {
    name: &'static str,
    props: Option<&'a Properties>,
}

impl<'a> Section<'a> {
    fn new(ini: &'a Ini, name: &'static str) -> Self {
        Self {
            name,
            props: ini.section(Some(name)),
        }
    }

    /// Trimmed value, treating empty values as absent.
    fn get(&self, key: &str) -> Option<&'a str> {
        self.props
            .and_then(|p| p.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingValue {
            section: self.name.to_string(),
            key: key.to_string(),
        })
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            Some(v) => v.parse().map(Some).map_err(|_| self.invalid(key, v, reason)),
            None => Ok(None),
        }
    }

    fn required_parse<T: FromStr>(&self, key: &str, reason: &str) -> Result<T, ConfigError> {
        let v = self.required(key)?;
        v.parse().map_err(|_| self.invalid(key, v, reason))
    }

    fn required_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        self.required(key).map(expand_tilde)
    }

    /// Fails with `reason` unless `check` holds for the parsed value.
    fn ensure<T: std::fmt::Display>(
        &self,
        key: &str,
        value: T,
        check: bool,
        reason: &str,
    ) -> Result<T, ConfigError> {
        if check {
            Ok(value)
        } else {
            Err(self.invalid(key, &value.to_string(), reason))
        }
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigError> {
    Ok(ConfigFile {
        map: parse_map(&Section::new(ini, "map"))?,
        style: parse_style(&Section::new(ini, "style"))?,
        backend: parse_backend(&Section::new(ini, "backend"))?,
        fetch: parse_fetch(&Section::new(ini, "fetch"))?,
        data: parse_data(&Section::new(ini, "data"))?,
        output: parse_output(&Section::new(ini, "output")),
        service: parse_service(&Section::new(ini, "service"))?,
        logging: parse_logging(&Section::new(ini, "logging")),
    })
}

fn parse_map(s: &Section) -> Result<MapSettings, ConfigError> {
    let lon = |key: &str| -> Result<f64, ConfigError> {
        let v: f64 = s.required_parse(key, "must be a number")?;
        s.ensure(key, v, (MIN_LON..=MAX_LON).contains(&v), "must be within -180..180")
    };
    let lat = |key: &str| -> Result<f64, ConfigError> {
        let v: f64 = s.required_parse(key, "must be a number")?;
        s.ensure(
            key,
            v,
            (MIN_LAT..=MAX_LAT).contains(&v),
            "must be within -85.05112878..85.05112878",
        )
    };

    let zoom: u8 = s.required_parse("zoom", "must be an integer")?;
    let zoom = s.ensure("zoom", zoom, zoom <= MAX_ZOOM, "must be at most 22")?;
    let tile_size = s
        .parse("tile_size", "must be a positive integer")?
        .unwrap_or_else(default_tile_size);
    let tile_size = s.ensure("tile_size", tile_size, tile_size > 0, "must be greater than 0")?;

    let map = MapSettings {
        lon_min: lon("lon_min")?,
        lat_min: lat("lat_min")?,
        lon_max: lon("lon_max")?,
        lat_max: lat("lat_max")?,
        zoom,
        tile_size,
    };
    map.grid()?;
    Ok(map)
}

fn parse_style(s: &Section) -> Result<StyleSettings, ConfigError> {
    let fill_opacity: f64 = s.required_parse("fill_opacity", "must be a number")?;
    let fill_opacity = s.ensure(
        "fill_opacity",
        fill_opacity,
        (0.0..=1.0).contains(&fill_opacity),
        "must be within 0..1",
    )?;

    Ok(StyleSettings {
        path: s.required_path("path")?,
        backup_path: s.required_path("backup_path")?,
        fill_color: s.required("fill_color")?.to_string(),
        fill_opacity,
    })
}

fn parse_backend(s: &Section) -> Result<BackendSettings, ConfigError> {
    Ok(BackendSettings {
        base_url: s.required("base_url")?.to_string(),
        container_name: s.required("container_name")?.to_string(),
        docker_endpoint: s
            .get("docker_endpoint")
            .map(str::to_string)
            .unwrap_or_else(default_backend_endpoint),
        reload_signal: s
            .get("reload_signal")
            .map(str::to_string)
            .unwrap_or_else(default_reload_signal),
    })
}

fn parse_fetch(s: &Section) -> Result<FetchSettings, ConfigError> {
    let defaults = FetchSettings::default();

    let max_attempts = s
        .parse("max_attempts", "must be a positive integer")?
        .unwrap_or(defaults.max_attempts);
    let max_attempts = s.ensure(
        "max_attempts",
        max_attempts,
        max_attempts >= 1,
        "must be at least 1",
    )?;

    let timeout_secs = s
        .parse("timeout_secs", "must be a positive integer (seconds)")?
        .unwrap_or(defaults.timeout_secs);
    let timeout_secs = s.ensure(
        "timeout_secs",
        timeout_secs,
        timeout_secs >= 1,
        "must be at least 1",
    )?;

    let max_concurrent = s
        .parse("max_concurrent", "must be a positive integer")?
        .unwrap_or(defaults.max_concurrent);
    let max_concurrent = s.ensure(
        "max_concurrent",
        max_concurrent,
        max_concurrent >= 1,
        "must be at least 1",
    )?;

    Ok(FetchSettings {
        max_attempts,
        retry_delay_ms: s
            .parse("retry_delay_ms", "must be a non-negative integer (milliseconds)")?
            .unwrap_or(defaults.retry_delay_ms),
        timeout_secs,
        max_concurrent,
    })
}

fn parse_data(s: &Section) -> Result<DataSettings, ConfigError> {
    Ok(DataSettings {
        countries_path: s.required_path("countries_path")?,
        messages_path: s.required_path("messages_path")?,
    })
}

fn parse_output(s: &Section) -> OutputSettings {
    s.get("path")
        .map(|v| OutputSettings {
            path: expand_tilde(v),
        })
        .unwrap_or_default()
}

fn parse_service(s: &Section) -> Result<ServiceSettings, ConfigError> {
    Ok(ServiceSettings {
        on_failure: s
            .parse("on_failure", "must be 'continue' or 'exit'")?
            .unwrap_or_default(),
    })
}

fn parse_logging(s: &Section) -> LoggingSettings {
    s.get("file")
        .map(|v| LoggingSettings {
            file: expand_tilde(v),
        })
        .unwrap_or_default()
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
