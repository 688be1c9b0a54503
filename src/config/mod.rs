pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use parse::{load_config, parse_config, validate_config, ConfigError};
pub use types::{Config, GeneratorConfig, StoreConfig};

/// Matches `$env{NAME}` references inside config files
pub(crate) fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Replaces every `$env{NAME}` whose variable is set; unset ones stay as written.
pub fn expand_env_vars(text: &str) -> String {
    env_var_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// System-wide config location, tried last
const SYSTEM_CONFIG_PATH: &str = "/etc/logsurge/config.yml";

/// Config locations searched when `--config` is not given, in order
pub fn default_config_paths() -> Vec<PathBuf> {
    let user = dirs::home_dir().map(|home| home.join(".config/logsurge/config.yml"));
    user.into_iter()
        .chain(std::iter::once(PathBuf::from(SYSTEM_CONFIG_PATH)))
        .collect()
}

/// The config file to load, if any.
///
/// An explicit path is returned even when missing so that loading reports it.
/// Without one, the first default location holding a file wins; `None` means
/// built-in defaults only.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(expand_home(path)),
        None => default_config_paths().into_iter().find(|p| p.is_file()),
    }
}

/// `~` and `~/...` relative to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
