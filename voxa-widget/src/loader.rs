//! Widget loader bootstrap
//!
//! `LoaderConfig` is the full customization surface the hosted widget reads:
//! every `WidgetConfig` field plus labels, icons and colors. The bootstrap
//! script served to host pages merges `window.AIAssistantConfig` over these
//! defaults.

use crate::config::{Position, Theme, WidgetConfig};
use crate::embed::{self, EmbedFormat, DEFAULT_WIDGET_HOST};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use voxa_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderConfig {
    pub api_key: String,
    pub position: Position,
    pub theme: Theme,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub logo_url: Option<String>,
    pub welcome_message: String,
    pub widget_title: String,
    pub widget_icon: String,
    pub widget_close_icon: String,
    pub knowledge_button_icon: String,
    pub knowledge_button_text: String,
    pub placeholder_text: String,
    pub send_button_text: String,
    pub mic_button_text_start: String,
    pub mic_button_text_stop: String,
    pub loading_indicator: String,
    pub show_branding: bool,
    pub auto_open: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::from_widget(&WidgetConfig::default())
    }
}

impl LoaderConfig {
    /// Loader defaults with the widget-level fields taken from `widget`.
    pub fn from_widget(widget: &WidgetConfig) -> Self {
        Self {
            api_key: widget.api_key.clone(),
            position: widget.position,
            theme: widget.theme,
            primary_color: widget.primary_color.clone(),
            secondary_color: "#3f51b5".to_string(),
            font_family: "Inter, system-ui, sans-serif".to_string(),
            logo_url: widget.logo_url.clone(),
            welcome_message: widget.welcome_message.clone(),
            widget_title: widget.widget_title.clone(),
            widget_icon: "💬".to_string(),
            widget_close_icon: "✕".to_string(),
            knowledge_button_icon: "📚".to_string(),
            knowledge_button_text: "Knowledge".to_string(),
            placeholder_text: "Type your message...".to_string(),
            send_button_text: "Send".to_string(),
            mic_button_text_start: "🎤 Speak".to_string(),
            mic_button_text_stop: "🔴 Stop".to_string(),
            loading_indicator: "...".to_string(),
            show_branding: widget.show_branding,
            auto_open: widget.auto_open,
        }
    }

    /// Merge a user-supplied object key by key over the defaults. Unknown
    /// keys are ignored; known keys with the wrong type are rejected.
    pub fn merge_over_defaults(user: Value) -> Result<Self> {
        Self::default().merge(user)
    }

    pub fn merge(&self, user: Value) -> Result<Self> {
        let overrides = match user {
            Value::Null => return Ok(self.clone()),
            Value::Object(map) => map,
            other => {
                return Err(Error::Validation(format!(
                    "Widget configuration must be an object, got {}",
                    type_name(&other)
                )))
            }
        };

        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(Error::Serialization("loader config is not an object".to_string())),
        };

        for (key, value) in overrides {
            if let Some(slot) = merged.get_mut(&key) {
                *slot = value;
            }
        }

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::Validation(format!("Invalid widget configuration: {}", e)))
    }

    pub fn widget(&self) -> WidgetConfig {
        WidgetConfig {
            api_key: self.api_key.clone(),
            position: self.position,
            theme: self.theme,
            primary_color: self.primary_color.clone(),
            widget_title: self.widget_title.clone(),
            welcome_message: self.welcome_message.clone(),
            show_branding: self.show_branding,
            auto_open: self.auto_open,
            logo_url: self.logo_url.clone(),
        }
    }

    /// Markup snippet reproducing this configuration.
    pub fn embed_snippet(&self) -> String {
        embed::generate(EmbedFormat::Markup, &self.widget())
    }

    pub fn theme_palette(&self) -> ThemePalette {
        let (background, text, input_bg) = match self.theme {
            Theme::Dark => ("#2d2d2d", "white", "#3d3d3d"),
            Theme::Light => ("white", "#333", "#f5f5f5"),
        };

        ThemePalette {
            properties: vec![
                ("--primary-color", self.primary_color.clone()),
                ("--secondary-color", self.secondary_color.clone()),
                ("--font-family", self.font_family.clone()),
                ("--widget-position", self.position.as_str().to_string()),
                ("--theme-background", background.to_string()),
                ("--theme-text", text.to_string()),
                ("--theme-input-bg", input_bg.to_string()),
            ],
        }
    }

    pub fn uses_inter_font(&self) -> bool {
        self.font_family.contains("Inter")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// CSS custom properties applied to the widget root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemePalette {
    pub properties: Vec<(&'static str, String)>,
}

impl ThemePalette {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_css(&self) -> String {
        self.properties
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Hosting details baked into the bootstrap script.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub widget_host: String,
    pub auto_open_delay_ms: u64,
    pub defaults: LoaderConfig,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            widget_host: DEFAULT_WIDGET_HOST.to_string(),
            auto_open_delay_ms: 1000,
            defaults: LoaderConfig::default(),
        }
    }
}

impl LoaderOptions {
    fn host(&self) -> &str {
        self.widget_host.trim_end_matches('/')
    }
}

const INTER_FONT_URL: &str =
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600&display=swap";

const LOADER_TEMPLATE: &str = r#"(function() {
  var defaultConfig = __DEFAULTS__;
  var config = Object.assign({}, defaultConfig, window.AIAssistantConfig || {});

  function createWidgetContainer() {
    var container = document.createElement('div');
    container.id = __CONTAINER_ID__;
    document.body.appendChild(container);
    return container;
  }

  function loadStyles() {
    var link = document.createElement('link');
    link.rel = 'stylesheet';
    link.href = __STYLESHEET__;
    document.head.appendChild(link);

    if (String(config.fontFamily).indexOf('Inter') !== -1) {
      var fontLink = document.createElement('link');
      fontLink.rel = 'stylesheet';
      fontLink.href = __FONT__;
      document.head.appendChild(fontLink);
    }
  }

  function loadScript() {
    var script = document.createElement('script');
    script.src = __SCRIPT__;
    script.onload = function() {
      window.AIAssistant.init(config);
    };
    document.body.appendChild(script);
  }

  function generateEmbedCode() {
    var keys = ['apiKey', 'position', 'theme', 'primaryColor', 'widgetTitle', 'welcomeMessage', 'showBranding', 'autoOpen'];
    var logoUrl = typeof config.logoUrl === 'string' ? config.logoUrl.trim() : '';
    if (logoUrl) {
      keys.push('logoUrl');
    }
    var lines = keys.map(function(key) {
      var value = key === 'logoUrl' ? logoUrl : config[key];
      return '    ' + key + ': ' + JSON.stringify(value).replace(/</g, '\\u003c').replace(/>/g, '\\u003e').replace(/&/g, '\\u0026');
    });
    return [
      '<!-- AI Assistant Widget -->',
      '<script>',
      '  window.AIAssistantConfig = {',
      lines.join(',\n'),
      '  };',
      '<\/script>',
      '<script src="' + __LOADER__ + '"><\/script>',
      '<!-- End AI Assistant Widget -->'
    ].join('\n');
  }

  function init() {
    createWidgetContainer();
    loadStyles();
    loadScript();

    if (config.autoOpen) {
      setTimeout(function() {
        window.AIAssistant.open();
      }, __DELAY__);
    }

    window.AIAssistant = window.AIAssistant || {};
    window.AIAssistant.getEmbedCode = generateEmbedCode;
  }

  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', init);
  } else {
    init();
  }
})();
"#;

/// JSON text safe to splice into a script.
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Bootstrap script served as `widget-loader.js`.
pub fn render_loader_script(options: &LoaderOptions) -> Result<String> {
    let host = options.host();
    Ok(LOADER_TEMPLATE
        .replace("__CONTAINER_ID__", &script_json(&embed::CONTAINER_ID)?)
        .replace("__STYLESHEET__", &script_json(&format!("{}/widget.css", host))?)
        .replace("__FONT__", &script_json(&INTER_FONT_URL)?)
        .replace("__SCRIPT__", &script_json(&format!("{}/widget.js", host))?)
        .replace(
            "__LOADER__",
            &script_json(&embed::html_attr(&format!("{}/widget-loader.js", host)))?,
        )
        .replace("__DELAY__", &options.auto_open_delay_ms.to_string())
        // user-controlled text goes in last so it is never rescanned
        .replace("__DEFAULTS__", &script_json(&options.defaults)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.secondary_color, "#3f51b5");
        assert_eq!(config.font_family, "Inter, system-ui, sans-serif");
        assert_eq!(config.widget_icon, "💬");
        assert_eq!(config.widget_close_icon, "✕");
        assert_eq!(config.knowledge_button_icon, "📚");
        assert_eq!(config.knowledge_button_text, "Knowledge");
        assert_eq!(config.placeholder_text, "Type your message...");
        assert_eq!(config.send_button_text, "Send");
        assert_eq!(config.mic_button_text_start, "🎤 Speak");
        assert_eq!(config.mic_button_text_stop, "🔴 Stop");
        assert_eq!(config.loading_indicator, "...");
        assert_eq!(config.widget(), WidgetConfig::default());
    }

    #[test]
    fn test_merge_overrides_known_keys() {
        let merged = LoaderConfig::merge_over_defaults(json!({
            "theme": "dark",
            "sendButtonText": "Go",
            "somethingElse": 42
        }))
        .unwrap();
        assert_eq!(merged.theme, Theme::Dark);
        assert_eq!(merged.send_button_text, "Go");
        assert_eq!(merged.placeholder_text, "Type your message...");
    }

    #[test]
    fn test_merge_rejects_wrong_types() {
        let err = LoaderConfig::merge_over_defaults(json!({ "autoOpen": "yes" })).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = LoaderConfig::merge_over_defaults(json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_merge_null_is_defaults() {
        assert_eq!(
            LoaderConfig::merge_over_defaults(Value::Null).unwrap(),
            LoaderConfig::default()
        );
    }

    #[test]
    fn test_theme_palette() {
        let dark = LoaderConfig {
            theme: Theme::Dark,
            ..Default::default()
        };
        let palette = dark.theme_palette();
        assert_eq!(palette.get("--theme-background"), Some("#2d2d2d"));
        assert_eq!(palette.get("--theme-text"), Some("white"));
        assert_eq!(palette.get("--theme-input-bg"), Some("#3d3d3d"));

        let light = LoaderConfig::default().theme_palette();
        assert_eq!(light.get("--theme-background"), Some("white"));
        assert_eq!(light.get("--theme-text"), Some("#333"));
        assert!(light.to_css().starts_with("--primary-color: #5c6bc0;"));
    }

    #[test]
    fn test_embed_snippet_matches_generator() {
        let config = LoaderConfig {
            widget_title: "Helper".into(),
            ..Default::default()
        };
        assert_eq!(
            config.embed_snippet(),
            embed::generate(EmbedFormat::Markup, &config.widget())
        );
    }

    #[test]
    fn test_render_loader_script() {
        let script = render_loader_script(&LoaderOptions::default()).unwrap();
        assert!(script.contains("\"secondaryColor\":\"#3f51b5\""));
        assert!(script.contains("container.id = \"ai-assistant-widget-container\";"));
        assert!(script.contains("link.href = \"https://your-widget-host.com/widget.css\";"));
        assert!(script.contains("script.src = \"https://your-widget-host.com/widget.js\";"));
        assert!(script.contains("}, 1000);"));
        assert!(script.contains("window.AIAssistant.getEmbedCode = generateEmbedCode;"));
        assert!(script.contains("config.logoUrl.trim()"));
        assert!(script.contains("if (logoUrl) {"));
        assert!(!script.contains("__"));
    }

    #[test]
    fn test_render_escapes_defaults() {
        let options = LoaderOptions {
            defaults: LoaderConfig {
                widget_title: "</script>".into(),
                ..Default::default()
            },
            widget_host: "https://cdn.example/".into(),
            auto_open_delay_ms: 250,
        };
        let script = render_loader_script(&options).unwrap();
        assert!(script.contains("\\u003c/script\\u003e"));
        assert!(script.contains("https://cdn.example/widget.js"));
        assert!(script.contains("}, 250);"));
    }
}
