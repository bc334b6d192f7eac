use std::{env, path::PathBuf};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::core::DownloadOptions;
use crate::tui::keybindings::KeyBinding;

const CONFIG: &str = include_str!("../.config/config.json5");

/// Backend connection settings
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout in seconds; 0 disables it
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Initial download options and where results are saved
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DownloadConfig {
    pub tag_name: String,
    pub remove_duplicates: bool,
    pub remove_empty: bool,
    pub output_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            tag_name: "Tag".to_string(),
            remove_duplicates: true,
            remove_empty: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl DownloadConfig {
    pub fn options(&self) -> DownloadOptions {
        DownloadOptions {
            tag_name: self.tag_name.clone(),
            tag_value: String::new(),
            remove_duplicates: self.remove_duplicates,
            remove_empty: self.remove_empty,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    /// Overrides applied on top of the default key map
    #[serde(default)]
    pub keybindings: Vec<KeyBinding>,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Load the embedded defaults and layer user configuration on top.
    ///
    /// An explicit `config_path` must exist. Without one, the optional
    /// `$SENDYPREP_CONFIG/config.json5` and `~/.sendyprep-config.json5` are read.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        if let Some(p) = config_path {
            builder = builder.add_source(
                config::File::from(expand_tilde(p))
                    .format(config::FileFormat::Json5)
                    .required(true),
            );
        } else {
            builder = builder.add_source(
                config::File::from(default_home_config_path())
                    .format(config::FileFormat::Json5)
                    .required(false),
            );
            if let Some(dir) = CONFIG_FOLDER.clone() {
                builder = builder.add_source(
                    config::File::from(dir.join("config.json5"))
                        .format(config::FileFormat::Json5)
                        .required(false),
                );
            }
        }

        builder.build()?.try_deserialize()
    }
}

pub fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".sendyprep-config.json5");
    }
    PathBuf::from(".sendyprep-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".data")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    use super::*;
    use crate::tui::Action;

    #[test]
    fn test_embedded_defaults_match_default_impls() {
        let embedded: Config = json5::from_str(CONFIG).unwrap();
        assert_eq!(embedded, Config::default());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json5");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                // only override what differs
                api: {{ base_url: "https://lists.example.com" }},
                download: {{ remove_empty: true }},
                keybindings: [ {{ key: "Ctrl+s", action: "Download" }} ],
            }}"#
        )
        .unwrap();
        drop(file);

        let config = Config::from_path(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://lists.example.com");
        assert_eq!(config.api.timeout_secs, 120);
        assert!(config.download.remove_empty);
        assert!(config.download.remove_duplicates);
        assert_eq!(config.download.tag_name, "Tag");
        assert_eq!(config.keybindings.len(), 1);
        assert_eq!(config.keybindings[0].action, Action::Download);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let missing = PathBuf::from("/nonexistent/sendyprep.json5");
        assert!(Config::from_path(Some(&missing)).is_err());
    }

    #[test]
    fn test_download_options_from_config() {
        let options = DownloadConfig::default().options();
        assert_eq!(options.tag_name, "Tag");
        assert!(options.tag_value.is_empty());
        assert!(options.remove_duplicates);
        assert!(!options.remove_empty);
    }
}
