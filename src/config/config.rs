use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data::list_table::{ListOptions, PAGE_SIZES};
use crate::data::records_table::TableOptions;
use crate::data::view_state::ViewState;

/// Environment variable that overrides `[server] base_url`
pub const API_URL_ENV: &str = "SYMPTOM_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub records: RecordsConfig,
    pub events: EventsConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,

    /// Keep the session cookie between invocations
    pub persist_session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Leading columns pinned on every page
    pub fixed_columns: usize,

    /// Date columns per page
    pub columns_per_page: usize,

    pub show_row_sum: bool,
    pub show_row_average: bool,

    /// Trailing rows excluded from the highlight computation
    pub rows_to_ignore: usize,

    pub searchable: bool,
    pub sortable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// One of 5, 10, 25 or 50
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use Unicode glyphs for status messages
    pub use_glyphs: bool,

    /// Color the highlighted rows and total cells
    pub use_colors: bool,

    pub icons: IconConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub highest: String,
    pub lowest: String,
    pub warning: String,
    pub error: String,
    pub info: String,
    pub success: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            persist_session: true,
        }
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            fixed_columns: 1,
            columns_per_page: 14,
            show_row_sum: true,
            show_row_average: true,
            rows_to_ignore: 1,
            searchable: true,
            sortable: false,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { page_size: 25 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            use_glyphs: true,
            use_colors: true,
            icons: IconConfig::default(),
        }
    }
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            highest: "▲".to_string(),
            lowest: "▼".to_string(),
            warning: "⚠️".to_string(),
            error: "❌".to_string(),
            info: "ℹ️".to_string(),
            success: "✅".to_string(),
        }
    }
}

impl IconConfig {
    /// ASCII alternatives for terminals without glyph support
    pub fn simple() -> Self {
        Self {
            highest: "[+]".to_string(),
            lowest: "[-]".to_string(),
            warning: "[!]".to_string(),
            error: "[X]".to_string(),
            info: "[i]".to_string(),
            success: "[OK]".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            info!("Created default config at {}", config_path.display());
            return Ok(default_config.with_env_overrides());
        }

        Ok(Self::load_from(&config_path)?.with_env_overrides())
    }

    /// Parse a config file without applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.display.use_glyphs {
            config.display.icons = IconConfig::simple();
        }
        if !PAGE_SIZES.contains(&config.events.page_size) {
            debug!(
                "events.page_size {} is not one of {:?}, using default",
                config.events.page_size, PAGE_SIZES
            );
            config.events.page_size = EventsConfig::default().page_size;
        }
        config.records.columns_per_page = config.records.columns_per_page.max(1);

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                debug!("Using {} from {}", url, API_URL_ENV);
                self.server.base_url = url.trim().to_string();
            }
        }
        self
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("symptom-cli").join("config.toml"))
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.records.fixed_columns, self.records.columns_per_page)
    }

    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            searchable: self.records.searchable,
            sortable: self.records.sortable,
            show_row_sum: self.records.show_row_sum,
            show_row_average: self.records.show_row_average,
            rows_to_ignore: self.records.rows_to_ignore,
        }
    }

    /// List options for the events table; actions are chosen by the caller
    pub fn events_list_options(&self) -> ListOptions {
        ListOptions {
            page_size: self.events.page_size,
            searchable: true,
            ..ListOptions::default()
        }
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Symptom CLI Configuration File
# Location: ~/.config/symptom-cli/config.toml (Linux)
#           ~/Library/Application Support/symptom-cli/config.toml (macOS)
#           %APPDATA%\symptom-cli\config.toml (Windows)

[server]
# Backend address (SYMPTOM_API_URL overrides this)
base_url = "http://localhost:3000"

# Keep the login session between runs
persist_session = true

[records]
# Leading columns shown on every page (the symptom name)
fixed_columns = 1

# Date columns per page
columns_per_page = 14

# Extra columns at the end of each row
show_row_sum = true
show_row_average = true

# Trailing rows (the "Total" row) left out of the row highlights
rows_to_ignore = 1

searchable = true
sortable = false

[events]
# Rows per page: 5, 10, 25 or 50
page_size = 25

[display]
# Set to false for ASCII-only output
use_glyphs = true

# Color highlighted rows and total cells
use_colors = true
"#
        .to_string()
    }

    /// Initialize config with a setup wizard
    pub fn init_wizard() -> Result<Self> {
        println!("Symptom CLI Configuration Setup");
        println!("===============================");

        let mut config = Config::default();

        print!("Backend URL [{}]: ", config.server.base_url);
        std::io::Write::flush(&mut std::io::stdout())?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().is_empty() {
            config.server.base_url = input.trim().trim_end_matches('/').to_string();
        }

        print!("Does your terminal support Unicode icons? (y/n) [y]: ");
        std::io::Write::flush(&mut std::io::stdout())?;
        input.clear();
        std::io::stdin().read_line(&mut input)?;
        config.display.use_glyphs = !input.trim().eq_ignore_ascii_case("n");
        if !config.display.use_glyphs {
            config.display.icons = IconConfig::simple();
        }

        config.save()?;

        println!("\nConfiguration saved to: {:?}", Config::get_config_path()?);
        println!("You can edit this file directly to customize further.");

        Ok(config)
    }
}
