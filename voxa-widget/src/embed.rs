//! Embed code generation
//!
//! Turns a `WidgetConfig` into an installable snippet: plain markup for any
//! page, a React component, or a WordPress plugin. Output depends only on the
//! input, so the same config always yields the same bytes.

use crate::config::WidgetConfig;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

pub const DEFAULT_WIDGET_HOST: &str = "https://your-widget-host.com";
pub const CONTAINER_ID: &str = "ai-assistant-widget-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedFormat {
    Markup,
    Component,
    Plugin,
}

impl EmbedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedFormat::Markup => "markup",
            EmbedFormat::Component => "component",
            EmbedFormat::Plugin => "plugin",
        }
    }
}

impl fmt::Display for EmbedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markup" | "html" => Ok(EmbedFormat::Markup),
            "component" | "react" => Ok(EmbedFormat::Component),
            "plugin" | "wordpress" => Ok(EmbedFormat::Plugin),
            other => Err(format!(
                "Unknown embed format '{}' (expected markup, component or plugin)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    /// URL of the loader script the snippet pulls in
    pub script_src: String,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self::for_host(DEFAULT_WIDGET_HOST)
    }
}

impl EmbedOptions {
    pub fn for_host(host: &str) -> Self {
        Self {
            script_src: format!("{}/widget-loader.js", host.trim_end_matches('/')),
        }
    }
}

enum Value<'a> {
    Str(&'a str),
    Url(&'a str),
    Bool(bool),
}

/// Config entries in their fixed output order.
fn entries(config: &WidgetConfig) -> Vec<(&'static str, Value<'_>)> {
    let mut entries = vec![
        ("apiKey", Value::Str(&config.api_key)),
        ("position", Value::Str(config.position.as_str())),
        ("theme", Value::Str(config.theme.as_str())),
        ("primaryColor", Value::Str(&config.primary_color)),
        ("widgetTitle", Value::Str(&config.widget_title)),
        ("welcomeMessage", Value::Str(&config.welcome_message)),
        ("showBranding", Value::Bool(config.show_branding)),
        ("autoOpen", Value::Bool(config.auto_open)),
    ];
    if let Some(logo) = config.logo() {
        entries.push(("logoUrl", Value::Url(logo)));
    }
    entries
}

fn js_entries(config: &WidgetConfig, indent: &str) -> String {
    entries(config)
        .into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::Str(s) | Value::Url(s) => js_string(s),
                Value::Bool(b) => b.to_string(),
            };
            format!("{}{}: {}", indent, key, rendered)
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Flags that keep `wp_json_encode` output safe inside an inline script.
const PHP_JSON_FLAGS: &str = "JSON_HEX_TAG | JSON_HEX_AMP | JSON_HEX_APOS | JSON_HEX_QUOT";

/// Values are emitted as complete JS literals by `wp_json_encode`, so
/// backslashes and line breaks survive into the script intact.
fn php_entries(config: &WidgetConfig, indent: &str) -> String {
    entries(config)
        .into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::Str(s) => format!(
                    "<?php echo wp_json_encode({}, {}); ?>",
                    php_string(s),
                    PHP_JSON_FLAGS
                ),
                Value::Url(s) => format!(
                    "<?php echo wp_json_encode(esc_url_raw({}), {}); ?>",
                    php_string(s),
                    PHP_JSON_FLAGS
                ),
                Value::Bool(b) => format!("<?php echo {} ? 'true' : 'false'; ?>", b),
            };
            format!("{}{}: {}", indent, key, rendered)
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Double-quoted JavaScript string literal that is also safe inside an
/// inline `<script>` element.
pub fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-quoted PHP string literal.
pub fn php_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Escape for a double-quoted HTML attribute.
pub fn html_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Generate a snippet with the default loader location.
pub fn generate(format: EmbedFormat, config: &WidgetConfig) -> String {
    generate_with(format, config, &EmbedOptions::default())
}

pub fn generate_with(format: EmbedFormat, config: &WidgetConfig, options: &EmbedOptions) -> String {
    match format {
        EmbedFormat::Markup => markup(config, options),
        EmbedFormat::Component => component(config, options),
        EmbedFormat::Plugin => plugin(config, options),
    }
}

fn markup(config: &WidgetConfig, options: &EmbedOptions) -> String {
    format!(
        r#"<!-- AI Assistant Widget -->
<script>
  window.AIAssistantConfig = {{
{entries}
  }};
</script>
<script src="{src}"></script>
<!-- End AI Assistant Widget -->"#,
        entries = js_entries(config, "    "),
        src = html_attr(&options.script_src),
    )
}

fn component(config: &WidgetConfig, options: &EmbedOptions) -> String {
    format!(
        r#"import {{ useEffect }} from 'react';

const AIAssistantWidget = () => {{
  useEffect(() => {{
    window.AIAssistantConfig = {{
{entries}
    }};

    const script = document.createElement('script');
    script.src = {src};
    script.async = true;
    document.body.appendChild(script);

    return () => {{
      if (script.parentNode) {{
        script.parentNode.removeChild(script);
      }}
      const container = document.getElementById('{container}');
      if (container) {{
        container.parentNode.removeChild(container);
      }}
    }};
  }}, []);

  return null;
}};

export default AIAssistantWidget;
"#,
        entries = js_entries(config, "      "),
        src = js_string(&options.script_src),
        container = CONTAINER_ID,
    )
}

fn plugin(config: &WidgetConfig, options: &EmbedOptions) -> String {
    format!(
        r#"<?php
/**
 * Plugin Name: AI Assistant Widget
 * Description: Adds an AI Assistant powered by Eleven Labs to your WordPress site
 * Version: 1.0.0
 * Author: Your Name
 */

if (!defined('ABSPATH')) {{
    exit;
}}

function ai_assistant_enqueue_script() {{
    ?>
    <script>
        window.AIAssistantConfig = {{
{entries}
        }};
    </script>
    <script src="<?php echo esc_url({src}); ?>"></script>
    <?php
}}
add_action('wp_footer', 'ai_assistant_enqueue_script');

function ai_assistant_add_settings_page() {{
    add_options_page(
        'AI Assistant Settings',
        'AI Assistant',
        'manage_options',
        'ai-assistant',
        'ai_assistant_settings_page'
    );
}}
add_action('admin_menu', 'ai_assistant_add_settings_page');

function ai_assistant_settings_page() {{
    ?>
    <div class="wrap">
        <h1>AI Assistant Widget Settings</h1>
        <form method="post" action="options.php">
            <?php
            settings_fields('ai_assistant_options');
            do_settings_sections('ai-assistant');
            submit_button();
            ?>
        </form>
    </div>
    <?php
}}

function ai_assistant_register_settings() {{
    register_setting('ai_assistant_options', 'ai_assistant_options');

    add_settings_section(
        'ai_assistant_main',
        'Widget Configuration',
        'ai_assistant_section_callback',
        'ai-assistant'
    );

    add_settings_field(
        'api_key',
        'Eleven Labs API Key',
        'ai_assistant_api_key_callback',
        'ai-assistant',
        'ai_assistant_main'
    );
}}
add_action('admin_init', 'ai_assistant_register_settings');

function ai_assistant_section_callback() {{
    echo '<p>Configure your AI Assistant widget settings below:</p>';
}}

function ai_assistant_api_key_callback() {{
    $options = get_option('ai_assistant_options');
    $api_key = isset($options['api_key']) ? $options['api_key'] : '';
    ?>
    <input type="text" name="ai_assistant_options[api_key]" value="<?php echo esc_attr($api_key); ?>" class="regular-text">
    <?php
}}
"#,
        entries = php_entries(config, "            "),
        src = php_string(&options.script_src),
    )
}
