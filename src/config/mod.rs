//! Configuration module for the FR generator backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Placement of itemized rows and free text inside spreadsheet templates.
///
/// These offsets are agreed with the template design; they are not derived from the
/// template content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// First 1-based row written for scripts, stored procedures and file changes
    pub item_start_row: u32,
    /// Cell on the primary sheet receiving the observations text
    pub observations_cell: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            item_start_row: 9,
            observations_cell: "A20".to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (optional for a loopback-only service)
    pub api_psk: Option<String>,
    /// Path to SQLite database file backing the object store
    pub db_path: PathBuf,
    /// Object store namespace for this application
    pub namespace: String,
    /// Default root for generated output folders
    pub output_root: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Spreadsheet template layout
    pub sheet_layout: SheetLayout,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("FRGEN_API_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("FRGEN_DB_PATH")
            .unwrap_or_else(|_| "./data/frgen.sqlite".to_string())
            .into();

        let namespace = env::var("FRGEN_NAMESPACE").unwrap_or_else(|_| "FR-Generator".to_string());

        let output_root = env::var("FRGEN_OUTPUT_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let bind_addr = env::var("FRGEN_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid FRGEN_BIND_ADDR format: {}", e))?;

        let log_level = env::var("FRGEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut sheet_layout = SheetLayout::default();
        if let Ok(row) = env::var("FRGEN_ITEM_START_ROW") {
            sheet_layout.item_start_row = row
                .parse()
                .ok()
                .filter(|r| *r >= 1)
                .ok_or_else(|| format!("Invalid FRGEN_ITEM_START_ROW: {}", row))?;
        }
        if let Ok(cell) = env::var("FRGEN_OBSERVATIONS_CELL") {
            sheet_layout.observations_cell = cell.trim().to_ascii_uppercase();
        }

        Ok(Self {
            api_psk,
            db_path,
            namespace,
            output_root,
            bind_addr,
            log_level,
            sheet_layout,
        })
    }

    /// Resolve the root folder generated files go to when the caller gives none.
    ///
    /// Falls back to the user's downloads directory, then to `./output`.
    pub fn resolve_default_output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("./output"))
    }
}
