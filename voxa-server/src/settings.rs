// Server configuration: file document, environment overrides, validation

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use tracing::debug;
use url::Url;
use voxa_core::config::{env_parse, env_var, parse_document, read_document};
use voxa_core::{Error, Result};
use voxa_kb::KnowledgeConfig;
use voxa_sc::CaptureConfig;
use voxa_spk::SpeechConfig;
use voxa_widget::embed::DEFAULT_WIDGET_HOST;
use voxa_widget::{ChatConfig, WidgetConfig};

pub const PORT_ENV: &str = "VOXA_PORT";
pub const HOST_ENV: &str = "VOXA_HOST";
pub const LOG_LEVEL_ENV: &str = "VOXA_LOG_LEVEL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Public origin the widget assets are served from
    pub widget_host: String,
    pub log_level: String,
    /// Accept browser recognition results on the voice endpoints
    pub voice_input: bool,
    pub auto_open_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            widget_host: DEFAULT_WIDGET_HOST.to_string(),
            log_level: "info".to_string(),
            voice_input: true,
            auto_open_delay_ms: 1000,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.bind_address
            .parse::<IpAddr>()
            .map_err(|_| format!("Invalid bind address '{}'", self.bind_address))?;

        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }

        let host = Url::parse(&self.widget_host)
            .map_err(|_| format!("Invalid widget host '{}'", self.widget_host))?;
        if !matches!(host.scheme(), "http" | "https") || host.host_str().is_none() {
            return Err(format!("Widget host must be an http(s) origin: '{}'", self.widget_host));
        }

        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(format!("Unknown log level '{}'", self.log_level));
        }

        if self.auto_open_delay_ms > 60_000 {
            return Err("auto_open_delay_ms too large (max 60000)".to_string());
        }

        Ok(())
    }
}

/// Everything the server needs, one section per crate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxaConfig {
    pub server: ServerConfig,
    pub speech: SpeechConfig,
    pub knowledge: KnowledgeConfig,
    pub chat: ChatConfig,
    pub capture: CaptureConfig,
    pub widget: WidgetConfig,
}

impl VoxaConfig {
    /// Parse a JSON or TOML document.
    pub fn from_str(content: &str) -> Result<Self> {
        parse_document(content)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = read_document(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Loaded configuration file");
        Ok(config)
    }

    /// Environment wins over the file.
    pub fn apply_env(&mut self) {
        if let Some(port) = env_parse::<u16>(PORT_ENV) {
            self.server.port = port;
        }
        if let Some(host) = env_var(HOST_ENV) {
            self.server.bind_address = host;
        }
        if let Some(level) = env_var(LOG_LEVEL_ENV) {
            self.server.log_level = level;
        }
        self.speech.apply_env();
    }

    pub fn validate(&self) -> Result<()> {
        let sections: [(&str, std::result::Result<(), String>); 6] = [
            ("server", self.server.validate()),
            ("speech", self.speech.validate()),
            ("knowledge", self.knowledge.validate()),
            ("chat", self.chat.validate()),
            ("capture", self.capture.validate()),
            ("widget", self.widget.validate()),
        ];

        for (name, result) in sections {
            result.map_err(|e| Error::Configuration(format!("[{}] {}", name, e)))?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr> {
        let ip: IpAddr = self.server.bind_address.parse().map_err(|_| {
            Error::Configuration(format!("Invalid bind address '{}'", self.server.bind_address))
        })?;
        Ok(std::net::SocketAddr::new(ip, self.server.port))
    }
}
