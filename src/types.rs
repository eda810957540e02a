use std::env;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FIELD_NAME: &str = "image";
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const SUPPORTED_MIME_TYPES: [&str; 11] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/avif",
    "image/heic",
    "image/heif",
    "image/tiff",
    "image/bmp",
    "image/svg+xml",
    "image/x-icon",
];

pub const SUPPORTED_EXTENSIONS: [&str; 12] = [
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".avif", ".heic", ".heif", ".tiff", ".tif", ".bmp",
    ".svg",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid PORT number: {0:?}")]
    InvalidPort(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub field_name: String,
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
            },
            upload: UploadConfig {
                field_name: DEFAULT_FIELD_NAME.to_string(),
                max_file_size: DEFAULT_MAX_FILE_SIZE,
                allowed_mime_types: SUPPORTED_MIME_TYPES.map(String::from).to_vec(),
                allowed_extensions: SUPPORTED_EXTENSIONS.map(String::from).to_vec(),
            },
        }
    }
}

impl Config {
    /// Built-in defaults with `HOST` and `PORT` taken from the environment when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST").filter(|host| !host.is_empty()) {
            config.app.host = host;
        }

        if let Some(port) = lookup("PORT").filter(|port| !port.is_empty()) {
            config.app.port = port
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }

        Ok(config)
    }
}

#[derive(Clone, Debug)]
pub struct AppContext {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct UploadContext {
    pub field_name: String,
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Context {
    pub app: AppContext,
    pub upload: UploadContext,
}

pub trait ToContext {
    fn to_context(self) -> Context;
}

impl ToContext for Config {
    fn to_context(self) -> Context {
        Context {
            app: AppContext {
                host: self.app.host,
                port: self.app.port,
            },
            upload: UploadContext {
                field_name: self.upload.field_name,
                max_file_size: self.upload.max_file_size,
                allowed_mime_types: self
                    .upload
                    .allowed_mime_types
                    .into_iter()
                    .map(|mime| mime.to_lowercase())
                    .collect(),
                allowed_extensions: self
                    .upload
                    .allowed_extensions
                    .into_iter()
                    .map(|ext| ext.to_lowercase())
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_listen_on_all_interfaces_port_3000() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.port, 3000);
        assert_eq!(config.upload.field_name, "image");
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn port_is_read_from_env() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.app.port, 8080);
    }

    #[test]
    fn empty_port_falls_back_to_default() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "")])).unwrap();
        assert_eq!(config.app.port, 3000);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(port) if port == "not-a-port"));
    }

    #[test]
    fn allow_lists_are_lowercased_in_context() {
        let mut config = Config::default();
        config.upload.allowed_extensions = vec![".PNG".to_string()];
        let ctx = config.to_context();
        assert_eq!(ctx.upload.allowed_extensions, vec![".png".to_string()]);
    }
}
