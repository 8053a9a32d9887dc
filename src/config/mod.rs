//! # Configuration Management Module
//!
//! Meshgopher uses a TOML configuration file organized into logical sections:
//!
//! - [`BotConfig`] - Bot identity and session housekeeping
//! - [`GopherConfig`] - Gopher client limits (timeouts, response cap)
//! - [`PagingConfig`] - Page sizes for menu and file views
//! - [`DeliveryConfig`] - Chunk sizing and pacing for outbound DMs
//! - [`LoggingConfig`] - Logging level and optional log file
//! - `aliases` - Short names resolvable with `u <alias>` (e.g. `u local`)
//!
//! All sections have serde defaults so a partial file loads cleanly.
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "meshgopher"
//! session_idle_minutes = 30
//!
//! [gopher]
//! default_port = 70
//! response_timeout_secs = 15
//!
//! [delivery]
//! chunk_bytes = 190
//! inter_chunk_delay_ms = 1200
//!
//! [aliases]
//! local = "gopher://127.0.0.1:7070/1/"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Evict a user's navigation session after this many minutes of
    /// inactivity. 0 disables eviction.
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u32,
}

fn default_session_idle_minutes() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GopherConfig {
    /// Port used when a gopher URL carries no explicit port.
    pub default_port: u16,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total read timeout for a response in seconds.
    pub response_timeout_secs: u64,
    /// Hard cap on response size; bytes beyond this are discarded.
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Selectable items per menu page. Digit labels cover at most 10
    /// entries regardless of this value.
    pub menu_page_size: usize,
    /// Lines per file page.
    pub file_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum UTF-8 bytes per outbound chunk. Keep comfortably below the
    /// ~230-byte Meshtastic frame budget to leave room for protocol overhead.
    pub chunk_bytes: usize,
    /// Pacing delay between consecutive chunks of one reply (milliseconds).
    pub inter_chunk_delay_ms: u64,
    /// Add [n/total] chunk markers to multi-part replies to help detect
    /// out-of-order delivery. Markers change the reassembled text, so this
    /// is off by default.
    #[serde(default)]
    pub show_chunk_markers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub gopher: GopherConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,
    /// Bot-defined shortcuts: `u <alias>[/more]` resolves against this map.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            menu_page_size: 10,
            file_page_size: 20,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 190,
            inter_chunk_delay_ms: 1200,
            show_chunk_markers: false,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Resolve a bot-defined alias to a concrete gopher URL.
    ///
    /// `path` is the argument of a `u` command that is not an absolute
    /// `gopher://` URL: the first `/`-separated segment names the alias and
    /// the remainder (if any) is appended to the aliased URL. Returns `None`
    /// when the alias is unknown; callers surface that as a normal fetch
    /// error.
    pub fn resolve_alias(&self, path: &str) -> Option<String> {
        let (name, rest) = match path.split_once('/') {
            Some((n, r)) => (n, Some(r)),
            None => (path, None),
        };
        let base = self.aliases.get(name)?;
        match rest {
            None | Some("") => Some(base.clone()),
            Some(rest) => {
                let mut url = base.trim_end_matches('/').to_string();
                url.push('/');
                url.push_str(rest);
                Some(url)
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut aliases = HashMap::new();
        aliases.insert(
            "local".to_string(),
            "gopher://127.0.0.1:7070/1/".to_string(),
        );

        Config {
            bot: BotConfig {
                name: "meshgopher".to_string(),
                session_idle_minutes: 30,
            },
            gopher: GopherConfig {
                default_port: 70,
                connect_timeout_secs: 10,
                response_timeout_secs: 15,
                max_response_bytes: 512 * 1024,
            },
            paging: PagingConfig::default(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("meshgopher.log".to_string()),
            },
            aliases,
        }
    }
}
