use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

/// Longest accepted debounce.
const MAX_DEBOUNCE_MS: u64 = 10_000;

impl KilnConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "host".to_string(),
                hint: "Use localhost, or 0.0.0.0 to listen on every interface".to_string(),
            }
            .into());
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::InvalidValue {
                field: "debounceMs".to_string(),
                value: self.debounce_ms.to_string(),
                hint: format!("Use at most {}ms", MAX_DEBOUNCE_MS),
            }
            .into());
        }

        if !self.pages_dir.starts_with(&self.src_dir) {
            return Err(ConfigError::InvalidValue {
                field: "pagesDir".to_string(),
                value: self.pages_dir.display().to_string(),
                hint: format!(
                    "Pages are compiled with the rest of the sources and must live inside srcDir ({})",
                    self.src_dir.display()
                ),
            }
            .into());
        }

        if self.out_dir == self.src_dir || self.src_dir.starts_with(&self.out_dir) {
            return Err(ConfigError::InvalidValue {
                field: "outDir".to_string(),
                value: self.out_dir.display().to_string(),
                hint: "The output directory must not contain the sources".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
