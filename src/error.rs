//! Process-level error type.
//!
//! Every fallible operation returns `AppError`; the binary maps it to an exit code.

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_FEED: u8 = 4;
pub const EXIT_SERVER: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Invalid or missing configuration.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    /// Download, schema or CSV failure during an update cycle.
    pub fn feed(message: impl Into<String>) -> Self {
        Self::new(EXIT_FEED, message)
    }

    /// Listener bind or serve failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(EXIT_SERVER, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
