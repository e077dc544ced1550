/// View configuration.
///
/// Every field is defaulted, so an empty JSON object is a valid config:
///
/// ```
/// use gridview::ViewConfig;
///
/// let config = ViewConfig::from_json_str(r#"{ "nulls_first": true }"#).unwrap();
/// assert!(config.nulls_first);
/// assert!(config.stripe_rows);
/// assert_eq!(config.plot_style, None);
/// ```

use crate::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Alternate row shading in `row_style`
    pub stripe_rows: bool,
    /// Place null cells before non-null cells when sorting
    pub nulls_first: bool,
    /// Intern string columns when loading
    pub intern_strings: bool,
    /// Named plot style for the presentation layer. Never applied by the view.
    pub plot_style: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            stripe_rows: true,
            nulls_first: false,
            intern_strings: false,
            plot_style: None,
        }
    }
}

impl ViewConfig {
    pub fn from_json_str(json: &str) -> GridResult<Self> {
        serde_json::from_str(json).map_err(|e| GridError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GridResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| GridError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded view config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GridError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert!(config.stripe_rows);
        assert!(!config.intern_strings);
    }

    #[test]
    fn test_all_fields() {
        let config = ViewConfig::from_json_str(
            r#"{"stripe_rows": false, "nulls_first": true, "intern_strings": true, "plot_style": "dark"}"#,
        )
        .unwrap();
        assert!(!config.stripe_rows);
        assert!(config.nulls_first);
        assert!(config.intern_strings);
        assert_eq!(config.plot_style.as_deref(), Some("dark"));

        let reparsed = ViewConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            ViewConfig::from_json_str("{ not json"),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            ViewConfig::from_json_str(r#"{"stripe_rows": "yes"}"#),
            Err(GridError::Config(_))
        ));
        assert!(matches!(
            ViewConfig::from_json_file("/nonexistent/gridview.json"),
            Err(GridError::Config(_))
        ));
    }
}
