//! Widget appearance and behaviour settings shared by the embed generator,
//! the loader bootstrap and the dashboard

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const DEFAULT_PRIMARY_COLOR: &str = "#5c6bc0";
pub const DEFAULT_WIDGET_TITLE: &str = "AI Assistant";
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
            Position::TopRight => "top-right",
            Position::TopLeft => "top-left",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings a site owner picks when installing the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub api_key: String,
    pub position: Position,
    pub theme: Theme,
    pub primary_color: String,
    pub widget_title: String,
    pub welcome_message: String,
    pub show_branding: bool,
    pub auto_open: bool,
    pub logo_url: Option<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            position: Position::default(),
            theme: Theme::default(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            widget_title: DEFAULT_WIDGET_TITLE.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            show_branding: true,
            auto_open: false,
            logo_url: None,
        }
    }
}

impl WidgetConfig {
    /// Logo URL when set to something non-blank.
    pub fn logo(&self) -> Option<&str> {
        self.logo_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.len() > 256 {
            return Err("API key too long (max 256 chars)".to_string());
        }
        if self.api_key.chars().any(|c| c.is_control()) {
            return Err("API key contains invalid characters".to_string());
        }

        validate_color(&self.primary_color)?;

        if self.widget_title.trim().is_empty() {
            return Err("Widget title cannot be empty".to_string());
        }
        if self.widget_title.chars().count() > 100 {
            return Err("Widget title too long (max 100 chars)".to_string());
        }
        if self.welcome_message.chars().count() > 1000 {
            return Err("Welcome message too long (max 1000 chars)".to_string());
        }

        if let Some(logo) = self.logo() {
            let url = Url::parse(logo).map_err(|_| format!("Invalid logo URL: {}", logo))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err("Logo URL must use http or https".to_string());
            }
        }

        Ok(())
    }
}

/// `#rgb` or `#rrggbb`.
pub fn validate_color(color: &str) -> Result<(), String> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| format!("Color '{}' must start with '#'", color))?;
    if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Color '{}' is not a hex color", color));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::default();
        assert_eq!(config.primary_color, "#5c6bc0");
        assert_eq!(config.widget_title, "AI Assistant");
        assert_eq!(config.welcome_message, "Hello! How can I help you today?");
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.theme, Theme::Light);
        assert!(config.show_branding);
        assert!(!config.auto_open);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_camel_case_document() {
        let config: WidgetConfig = serde_json::from_str(
            r#"{"theme":"dark","position":"top-left","showBranding":false,"logoUrl":"https://x.example/logo.png"}"#,
        )
        .unwrap();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.position, Position::TopLeft);
        assert!(!config.show_branding);
        assert_eq!(config.logo(), Some("https://x.example/logo.png"));
        assert_eq!(config.widget_title, "AI Assistant");
    }

    #[test]
    fn test_unknown_position_rejected() {
        assert!(serde_json::from_str::<WidgetConfig>(r#"{"position":"middle"}"#).is_err());
    }

    #[test]
    fn test_blank_logo_is_absent() {
        let config = WidgetConfig {
            logo_url: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(config.logo(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_colors() {
        assert!(validate_color("#fff").is_ok());
        assert!(validate_color("#5c6bc0").is_ok());
        assert!(validate_color("5c6bc0").is_err());
        assert!(validate_color("#5c6bcz").is_err());
        assert!(validate_color("#5c6b").is_err());
    }

    #[test]
    fn test_bad_logo_scheme() {
        let config = WidgetConfig {
            logo_url: Some("javascript:alert(1)".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
