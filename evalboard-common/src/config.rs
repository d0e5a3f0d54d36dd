//! Configuration loading and settings resolution

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Bind address used when nothing else is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Resolved service settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Which record store backend to run against.
    pub store: StoreConfig,
}

/// Record store selection.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    /// Seeded in-memory store; no external service is contacted.
    Demo,
    /// Hosted REST service.
    Rest { url: String, key: String },
}

/// Optional values read from the TOML config file.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub bind: Option<String>,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub demo: Option<bool>,
}

/// Per-setting resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. Compiled default (bind and demo only; the store settings are
///    required unless demo mode is on)
pub fn resolve_settings(
    cli_bind: Option<&str>,
    cli_store_url: Option<&str>,
    cli_store_key: Option<&str>,
    cli_demo: bool,
    cli_config: Option<&Path>,
) -> Result<Settings> {
    let file = load_config_file(cli_config)?;

    let bind = resolve(cli_bind, "EVALBOARD_BIND", file.bind.as_deref())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let demo = cli_demo || env_flag("EVALBOARD_DEMO") || file.demo.unwrap_or(false);
    if demo {
        return Ok(Settings {
            bind,
            store: StoreConfig::Demo,
        });
    }

    let store_url = resolve(cli_store_url, "EVALBOARD_STORE_URL", file.store_url.as_deref())
        .ok_or_else(|| {
            Error::Config(
                "store URL not set (use --store-url, EVALBOARD_STORE_URL, or the config file)"
                    .to_string(),
            )
        })?;

    let store_key = resolve(cli_store_key, "EVALBOARD_STORE_KEY", file.store_key.as_deref())
        .ok_or_else(|| {
            Error::Config(
                "store API key not set (use --store-key, EVALBOARD_STORE_KEY, or the config file)"
                    .to_string(),
            )
        })?;

    Ok(Settings {
        bind,
        store: StoreConfig::Rest {
            url: store_url,
            key: store_key,
        },
    })
}

fn env_flag(env_var: &str) -> bool {
    matches!(
        std::env::var(env_var).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

fn resolve(cli: Option<&str>, env_var: &str, file: Option<&str>) -> Option<String> {
    if let Some(value) = cli {
        return Some(value.to_string());
    }
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Some(value);
        }
    }
    file.map(str::to_string)
}

/// Read the TOML config file. An explicitly passed path must exist and
/// parse; the default path is used only when present.
fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(ConfigFile::default()),
        },
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(ConfigFile::default());
    }

    let raw = std::fs::read_to_string(&path)?;
    toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// `~/.config/evalboard/config.toml` (or the platform equivalent).
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("evalboard").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var("EVALBOARD_BIND");
        std::env::remove_var("EVALBOARD_STORE_URL");
        std::env::remove_var("EVALBOARD_STORE_KEY");
        std::env::remove_var("EVALBOARD_DEMO");
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    #[serial]
    fn cli_beats_env_beats_file() {
        clear_env();
        std::env::set_var("EVALBOARD_STORE_URL", "https://env.example");
        let file = write_config(
            "store_url = \"https://file.example\"\nstore_key = \"file-key\"\n",
        );

        let settings = resolve_settings(
            None,
            Some("https://cli.example"),
            None,
            false,
            Some(file.path()),
        )
        .expect("settings");
        assert_eq!(
            settings.store,
            StoreConfig::Rest {
                url: "https://cli.example".to_string(),
                key: "file-key".to_string(),
            }
        );

        let settings =
            resolve_settings(None, None, None, false, Some(file.path())).expect("settings");
        assert!(matches!(
            settings.store,
            StoreConfig::Rest { url, .. } if url == "https://env.example"
        ));

        clear_env();
        let settings =
            resolve_settings(None, None, None, false, Some(file.path())).expect("settings");
        assert!(matches!(
            settings.store,
            StoreConfig::Rest { url, .. } if url == "https://file.example"
        ));
    }

    #[test]
    #[serial]
    fn bind_defaults_when_unset() {
        clear_env();
        let file = write_config("store_url = \"https://s.example\"\nstore_key = \"k\"\n");
        let settings =
            resolve_settings(None, None, None, false, Some(file.path())).expect("settings");
        assert_eq!(settings.bind, DEFAULT_BIND);
    }

    #[test]
    #[serial]
    fn missing_store_url_is_a_config_error() {
        clear_env();
        let file = write_config("store_key = \"k\"\n");
        let err = resolve_settings(None, None, None, false, Some(file.path()))
            .expect_err("should fail");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn demo_mode_needs_no_store_settings() {
        clear_env();
        let empty = write_config("");
        let settings =
            resolve_settings(None, None, None, true, Some(empty.path())).expect("settings");
        assert_eq!(settings.store, StoreConfig::Demo);

        std::env::set_var("EVALBOARD_DEMO", "1");
        let settings =
            resolve_settings(None, None, None, false, Some(empty.path())).expect("settings");
        assert_eq!(settings.store, StoreConfig::Demo);
        clear_env();

        let file = write_config("demo = true\n");
        let settings =
            resolve_settings(None, None, None, false, Some(file.path())).expect("settings");
        assert_eq!(settings.store, StoreConfig::Demo);
    }

    #[test]
    #[serial]
    fn explicit_config_path_must_exist() {
        clear_env();
        let err = resolve_settings(
            None,
            Some("https://s.example"),
            Some("k"),
            false,
            Some(Path::new("/nonexistent/evalboard.toml")),
        )
        .expect_err("should fail");
        assert!(matches!(err, Error::Config(_)));
    }
}
