//! Running-program descriptor, served URLs and the browser opener.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Describes the develop process the coordinator serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Project root
    pub directory: PathBuf,
    /// Host the server listens on
    pub host: String,
    /// Port the server listens on
    pub port: u16,
    /// Serve over HTTPS
    pub https: bool,
    /// Open a browser after the first successful build
    pub open: bool,
}

impl Program {
    /// URLs to print and open for this program.
    pub fn urls(&self) -> DevelopUrls {
        let protocol = if self.https { "https" } else { "http" };
        let unspecified = matches!(self.host.as_str(), "0.0.0.0" | "::" | "[::]");
        let loopback = matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1" | "[::1]");
        let pretty_host = if unspecified { "localhost" } else { self.host.as_str() };

        let local = format!("{}://{}:{}/", protocol, pretty_host, self.port);
        let lan = (!unspecified && !loopback).then(|| local.clone());

        DevelopUrls {
            local_for_terminal: local.clone(),
            local_for_browser: local,
            lan_for_terminal: lan,
        }
    }
}

/// Addresses the develop server is reachable at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopUrls {
    pub local_for_terminal: String,
    pub local_for_browser: String,
    pub lan_for_terminal: Option<String>,
}

/// Opens URLs in a browser. Failures are reported, never fatal.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
///
/// - macOS: `open`
/// - Windows: `cmd /C start`
/// - others: `xdg-open`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

#[async_trait]
impl BrowserLauncher for SystemBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        use std::process::Command;

        let spawned = if cfg!(target_os = "macos") {
            Command::new("open").arg(url).spawn()
        } else if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", "start", url]).spawn()
        } else {
            Command::new("xdg-open").arg(url).spawn()
        };

        spawned.map(drop).map_err(|source| CoreError::Browser {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(host: &str, https: bool) -> Program {
        Program {
            directory: PathBuf::from("."),
            host: host.to_string(),
            port: 8000,
            https,
            open: false,
        }
    }

    #[test]
    fn test_unspecified_host_prints_localhost() {
        let urls = program("0.0.0.0", false).urls();
        assert_eq!(urls.local_for_browser, "http://localhost:8000/");
        assert_eq!(urls.lan_for_terminal, None);
    }

    #[test]
    fn test_https_protocol() {
        let urls = program("localhost", true).urls();
        assert_eq!(urls.local_for_terminal, "https://localhost:8000/");
        assert_eq!(urls.lan_for_terminal, None);
    }

    #[test]
    fn test_lan_host_is_reported() {
        let urls = program("192.168.1.20", false).urls();
        assert_eq!(urls.lan_for_terminal.as_deref(), Some("http://192.168.1.20:8000/"));
    }
}
