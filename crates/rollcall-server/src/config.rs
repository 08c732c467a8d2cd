use rollcall_core::AppError;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 8 * 1024 * 1024;

/// Listener and upload settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Largest accepted `PUT /v1/document` body.
    pub max_document_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `ROLLCALL_SERVER_PORT` (optional, defaults to 3000)
    /// - `ROLLCALL_MAX_DOCUMENT_BYTES` (optional, defaults to 8 MiB)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let port = match lookup("ROLLCALL_SERVER_PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!(
                    "Invalid ROLLCALL_SERVER_PORT '{raw}': must be a port number"
                ))
            })?,
        };

        let max_document_bytes = match lookup("ROLLCALL_MAX_DOCUMENT_BYTES") {
            None => DEFAULT_MAX_DOCUMENT_BYTES,
            Some(raw) => {
                let parsed: usize = raw.trim().parse().map_err(|_| {
                    AppError::ConfigError(format!(
                        "Invalid ROLLCALL_MAX_DOCUMENT_BYTES '{raw}': must be a positive integer"
                    ))
                })?;
                if parsed == 0 {
                    return Err(AppError::ConfigError(
                        "ROLLCALL_MAX_DOCUMENT_BYTES must be at least 1".into(),
                    ));
                }
                parsed
            }
        };

        Ok(Self {
            port,
            max_document_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
