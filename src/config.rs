use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_ENV: &str = "FACET_GRID_CONFIG";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

/// Viewer settings. Every field is optional in the file; missing fields take
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window title.
    pub title: String,
    /// Rows per page when a dataset is first shown.
    pub page_size: usize,
    /// Page sizes offered in the pager.
    pub page_sizes: Vec<usize>,
    /// Explicit column keys and their order. `None` keeps the file's order.
    pub columns: Option<Vec<String>>,
    /// File opened at start-up.
    pub data_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Facet Grid".to_string(),
            page_size: 25,
            page_sizes: vec![10, 25, 50, 100, 500],
            columns: None,
            data_file: None,
        }
    }
}

impl ViewerConfig {
    /// Read the file named by [`CONFIG_ENV`], or fall back to defaults when
    /// the variable is unset.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(&PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: ViewerConfig = serde_json::from_str(text)?;
        if config.page_sizes.is_empty() {
            config.page_sizes = Self::default().page_sizes;
        }
        if config.page_size == 0 {
            config.page_size = config.page_sizes[0];
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = ViewerConfig::from_json(r#"{ "page_size": 50 }"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.page_sizes, vec![10, 25, 50, 100, 500]);
        assert_eq!(config.title, "Facet Grid");
        assert!(config.columns.is_none());
    }

    #[test]
    fn zero_page_size_falls_back_to_first_option() {
        let config =
            ViewerConfig::from_json(r#"{ "page_size": 0, "page_sizes": [20, 40] }"#).unwrap();
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn column_list_is_read_in_order() {
        let config =
            ViewerConfig::from_json(r#"{ "columns": ["reg_no", "status", "course"] }"#).unwrap();
        assert_eq!(
            config.columns.as_deref(),
            Some(&["reg_no".to_string(), "status".to_string(), "course".to_string()][..])
        );
    }
}
