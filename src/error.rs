//! Error handling for the Shelly panel crate.
//!
//! Two layers live here: [`PanelError`] for failures of the panel itself
//! (configuration, web server, HTTP client setup) and [`ErrorCode`] for the
//! per-device taxonomy reported back to the dashboard inside results.

/// A specialized `Result` type for panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;

/// The main error type for panel operations.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// The HTTP client needed to reach any device is unavailable
    #[error("HTTP client unavailable: {0}")]
    MissingCapability(String),
}

impl PanelError {
    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new missing capability error
    pub fn capability_error(msg: impl Into<String>) -> Self {
        Self::MissingCapability(msg.into())
    }
}

/// Structured error tag attached to a single device outcome.
///
/// The [`tag`](ErrorCode::tag) is stable and machine readable; the `Display`
/// output is the human description including any detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCode {
    #[error("missing_host: device has no base URL configured")]
    MissingHost,

    #[error("invalid_host: device base URL is not an absolute URL")]
    InvalidHost,

    #[error("invalid_auth: device credential contains characters not allowed in a header")]
    InvalidAuth,

    #[error("transport_error: {0}")]
    Transport(String),

    #[error("http_error: device responded with HTTP {status}")]
    Http { status: u16 },

    #[error("json_decode_error: {0}")]
    JsonDecode(String),

    #[error("invalid_action: '{0}' is not one of on, off, toggle")]
    InvalidAction(String),

    #[error("device_not_found: no device with id '{0}'")]
    DeviceNotFound(String),

    #[error("missing_capability: {0}")]
    MissingCapability(String),
}

/// Coarse classification used by callers to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The device descriptor itself is unusable.
    Configuration,
    /// The caller sent something we refuse to act on.
    Validation,
    /// The caller referenced something that does not exist.
    NotFound,
    /// The device could not be reached or answered badly.
    Upstream,
    /// No device can be reached at all.
    Capability,
}

impl ErrorCode {
    /// Stable machine tag, as exposed in JSON `error` fields.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MissingHost => "missing_host",
            Self::InvalidHost => "invalid_host",
            Self::InvalidAuth => "invalid_auth",
            Self::Transport(_) => "transport_error",
            Self::Http { .. } => "http_error",
            Self::JsonDecode(_) => "json_decode_error",
            Self::InvalidAction(_) => "invalid_action",
            Self::DeviceNotFound(_) => "device_not_found",
            Self::MissingCapability(_) => "missing_capability",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingHost | Self::InvalidHost | Self::InvalidAuth => ErrorClass::Configuration,
            Self::InvalidAction(_) => ErrorClass::Validation,
            Self::DeviceNotFound(_) => ErrorClass::NotFound,
            Self::Transport(_) | Self::Http { .. } | Self::JsonDecode(_) => ErrorClass::Upstream,
            Self::MissingCapability(_) => ErrorClass::Capability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_stable() {
        assert_eq!(ErrorCode::InvalidHost.tag(), "invalid_host");
        assert_eq!(ErrorCode::Http { status: 503 }.tag(), "http_error");
        assert_eq!(
            ErrorCode::Transport("connection refused".into()).tag(),
            "transport_error"
        );
    }

    #[test]
    fn test_display_carries_detail() {
        let err = ErrorCode::Http { status: 401 };
        assert!(err.to_string().contains("401"));

        let err = ErrorCode::JsonDecode("expected value at line 1".into());
        assert!(err.to_string().starts_with("json_decode_error"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_classes() {
        assert_eq!(ErrorCode::MissingHost.class(), ErrorClass::Configuration);
        assert_eq!(ErrorCode::InvalidAuth.class(), ErrorClass::Configuration);
        assert_eq!(
            ErrorCode::InvalidAction("spin".into()).class(),
            ErrorClass::Validation
        );
        assert_eq!(
            ErrorCode::DeviceNotFound("x".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(ErrorCode::Http { status: 500 }.class(), ErrorClass::Upstream);
        assert_eq!(
            ErrorCode::MissingCapability("no client".into()).class(),
            ErrorClass::Capability
        );
    }

    #[test]
    fn test_panel_error_helpers() {
        let err = PanelError::config_error("duplicate device id");
        assert!(err.to_string().contains("duplicate device id"));

        let err = PanelError::capability_error("tls backend");
        assert!(matches!(err, PanelError::MissingCapability(ref reason) if reason == "tls backend"));
    }
}
