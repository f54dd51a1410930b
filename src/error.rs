use num_enum::{IntoPrimitive, TryFromPrimitive};

// Error codes published by the ZSM SDK.
#[derive(Debug, IntoPrimitive, TryFromPrimitive, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum ZsmErrorCode {
    Error = 0,
    NetworkFailure = 1,
    InvalidLogin = 2,
    UnauthorizedUser = 3,
    BadCryptographicValue = 100,
    CryptographicFailure = 101,
    CryptographicKey = 102,
    SecureStorageUnavailable = 103,
    SecureStorageFailure = 104,
    SecureStorageUnauthenticated = 105,
    RegistrationFailure = 200,
    RegistrationIncomplete = 201,
    DeviceSuspended = 300,
    DeviceDeactivated = 301,
    AccountSuspended = 302,
    AccountDeactivated = 303,
    InvalidKeychainSetup = 400,
    DuplicateKeychainItem = 401,
    InvalidKeychainGroup = 402,
}

/// Error reported by a provider operation. The trace id, when present,
/// matches the server-side transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZsmError {
    pub code: ZsmErrorCode,
    pub trace_id: Option<String>,
    pub message: Option<String>,
}

impl ZsmError {
    pub fn new(code: ZsmErrorCode) -> Self {
        Self {
            code,
            trace_id: None,
            message: None,
        }
    }

    pub fn with_message(code: ZsmErrorCode, message: &str) -> Self {
        Self {
            code,
            trace_id: None,
            message: Some(message.to_owned()),
        }
    }
}

impl std::error::Error for ZsmError {}

impl std::fmt::Display for ZsmError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    InvalidConfig(String),
    Provider(ZsmError),
}

impl std::error::Error for InitError {}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InitError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            InitError::Provider(error) => write!(f, "{}", error),
        }
    }
}

impl From<ZsmError> for InitError {
    fn from(error: ZsmError) -> Self {
        InitError::Provider(error)
    }
}

/// Failure of a single ceremony run. Never propagated past the driver;
/// rendered into the output slot instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyError {
    InvalidJson,
    NotInitialized,
    Operation(ZsmError),
    MalformedResult(&'static str),
}

impl CeremonyError {
    /// Text shown in the output slot for this failure.
    pub fn render(&self) -> String {
        match self {
            CeremonyError::InvalidJson => "Invalid JSON input".to_owned(),
            CeremonyError::NotInitialized => "ZSM is not initialized".to_owned(),
            CeremonyError::Operation(error) => format!("Error: {}", error),
            CeremonyError::MalformedResult(reason) => format!("Error: {}", reason),
        }
    }
}

impl std::error::Error for CeremonyError {}

impl std::fmt::Display for CeremonyError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<ZsmError> for CeremonyError {
    fn from(error: ZsmError) -> Self {
        CeremonyError::Operation(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips_through_primitive() {
        let raw: i32 = ZsmErrorCode::RegistrationFailure.into();
        assert_eq!(raw, 200);
        assert_eq!(
            ZsmErrorCode::try_from(200),
            Ok(ZsmErrorCode::RegistrationFailure)
        );
        assert!(ZsmErrorCode::try_from(999).is_err());
    }

    #[test]
    fn operation_error_renders_message() {
        let error = CeremonyError::Operation(ZsmError::with_message(
            ZsmErrorCode::Error,
            "user cancelled",
        ));
        assert_eq!(error.render(), "Error: user cancelled");
    }

    #[test]
    fn operation_error_without_message_renders_unknown() {
        let error = CeremonyError::Operation(ZsmError::new(ZsmErrorCode::NetworkFailure));
        assert_eq!(error.render(), "Error: Unknown");
    }

    #[test]
    fn local_failures_render_verbatim() {
        assert_eq!(CeremonyError::InvalidJson.render(), "Invalid JSON input");
        assert_eq!(
            CeremonyError::NotInitialized.render(),
            "ZSM is not initialized"
        );
    }
}
