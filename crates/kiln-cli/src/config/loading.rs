use crate::cli::DevelopArgs;
use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::Serialize;
use std::path::Path;

/// Config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "kiln.config.json";

/// Flags given on the command line. Unset flags leave lower layers alone.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    https: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<bool>,
}

impl From<&DevelopArgs> for CliOverrides {
    fn from(args: &DevelopArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            https: args.https.then_some(true),
            open: args.open.then_some(true),
        }
    }
}

impl KilnConfig {
    /// Load configuration for a project rooted at `root`.
    ///
    /// Priority: CLI args > `KILN_*` environment variables > config file >
    /// defaults. An explicit `--config` path must exist; the default
    /// `kiln.config.json` is optional.
    pub fn load(args: &DevelopArgs, root: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                };
                if !path.exists() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        // KILN_DEBOUNCE_MS -> debounceMs
        figment = figment.merge(
            Env::prefixed("KILN_")
                .map(|key| snake_to_camel(key.as_str()).into())
                .lowercase(false),
        );

        figment = figment.merge(Serialized::defaults(CliOverrides::from(args)));

        figment.extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: format!("Check {} syntax and field types", CONFIG_FILE_NAME),
            }
            .into()
        })
    }
}

/// Convert `snake_case` keys to `camelCase`.
pub(crate) fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
