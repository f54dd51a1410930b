use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ZsmConfig;
use crate::error::{InitError, ZsmError};

/// Free-form JSON object supplied as ceremony parameters. No schema is
/// enforced at this boundary.
pub type OptionsDocument = Map<String, Value>;

/// JSON object returned by the provider on ceremony success.
pub type ResultDocument = Map<String, Value>;

/// An initialized ZSM instance, able to run the three WebAuthn ceremonies.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn webauthn_create(
        &mut self,
        options: &OptionsDocument,
    ) -> Result<ResultDocument, ZsmError>;

    async fn webauthn_get(&mut self, options: &OptionsDocument)
        -> Result<ResultDocument, ZsmError>;

    /// Retrieves the attestation retained from the last create.
    async fn webauthn_retrieve(&self) -> Result<ResultDocument, ZsmError>;
}

/// Constructs [`Authenticator`] instances from a configuration record.
#[async_trait]
pub trait AuthenticatorProvider: Send + Sync {
    async fn create_instance(
        &self,
        config: &ZsmConfig,
    ) -> Result<Box<dyn Authenticator>, InitError>;
}

pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready(Box<dyn Authenticator>),
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready(_) => "ready",
            SessionState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Holds the provider instance across ceremonies. Each initialization
/// replaces the instance wholesale; nothing is mutated in place.
pub struct ProviderSession {
    state: SessionState,
}

impl ProviderSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// On success the new instance replaces any existing one. On failure a
    /// previously ready instance is kept; otherwise the session is failed.
    pub async fn initialize(
        &mut self,
        provider: &dyn AuthenticatorProvider,
        config: &ZsmConfig,
    ) -> Result<(), InitError> {
        let prior = std::mem::replace(&mut self.state, SessionState::Initializing);
        let config_json = Value::Object(config.to_json());
        debug!(config = %config_json, "creating ZSM instance");
        match provider.create_instance(config).await {
            Ok(authenticator) => {
                info!(host_url = %config.host_url, "ZSM instance ready");
                self.state = SessionState::Ready(authenticator);
                Ok(())
            }
            Err(error) => {
                warn!(%error, prior = prior.name(), "ZSM initialization failed");
                self.state = match prior {
                    ready @ SessionState::Ready(_) => ready,
                    _ => SessionState::Failed(error.to_string()),
                };
                Err(error)
            }
        }
    }

    /// The active instance, if any. Ceremonies are only permitted while the
    /// session is ready.
    pub fn authenticator(&mut self) -> Option<&mut dyn Authenticator> {
        match &mut self.state {
            SessionState::Ready(authenticator) => Some(authenticator.as_mut()),
            _ => None,
        }
    }
}

impl Default for ProviderSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZsmErrorCode;

    struct NoopAuthenticator;

    #[async_trait]
    impl Authenticator for NoopAuthenticator {
        async fn webauthn_create(
            &mut self,
            _options: &OptionsDocument,
        ) -> Result<ResultDocument, ZsmError> {
            Ok(ResultDocument::new())
        }

        async fn webauthn_get(
            &mut self,
            _options: &OptionsDocument,
        ) -> Result<ResultDocument, ZsmError> {
            Ok(ResultDocument::new())
        }

        async fn webauthn_retrieve(&self) -> Result<ResultDocument, ZsmError> {
            Ok(ResultDocument::new())
        }
    }

    struct FlakyProvider {
        failures_first: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl AuthenticatorProvider for FlakyProvider {
        async fn create_instance(
            &self,
            _config: &ZsmConfig,
        ) -> Result<Box<dyn Authenticator>, InitError> {
            use std::sync::atomic::Ordering;
            if self.failures_first.load(Ordering::SeqCst) > 0 {
                self.failures_first.fetch_sub(1, Ordering::SeqCst);
                return Err(InitError::Provider(ZsmError::with_message(
                    ZsmErrorCode::NetworkFailure,
                    "host unreachable",
                )));
            }
            Ok(Box::new(NoopAuthenticator))
        }
    }

    fn flaky(failures_first: usize) -> FlakyProvider {
        FlakyProvider {
            failures_first: std::sync::atomic::AtomicUsize::new(failures_first),
        }
    }

    #[tokio::test]
    async fn starts_uninitialized() {
        let mut session = ProviderSession::new();
        assert_eq!(session.state().name(), "uninitialized");
        assert!(session.authenticator().is_none());
    }

    #[tokio::test]
    async fn failed_initialization_without_prior_session() {
        let mut session = ProviderSession::new();
        let result = session.initialize(&flaky(1), &ZsmConfig::default()).await;
        assert!(result.is_err());
        assert_eq!(session.state().name(), "failed");
        assert!(session.authenticator().is_none());
    }

    #[tokio::test]
    async fn failed_reinitialization_keeps_ready_session() {
        let mut session = ProviderSession::new();
        let provider = flaky(0);
        session
            .initialize(&provider, &ZsmConfig::default())
            .await
            .unwrap();
        assert_eq!(session.state().name(), "ready");

        let result = session.initialize(&flaky(1), &ZsmConfig::default()).await;
        assert!(result.is_err());
        assert_eq!(session.state().name(), "ready");
        assert!(session.authenticator().is_some());
    }

    #[tokio::test]
    async fn successful_reinitialization_replaces_session() {
        let mut session = ProviderSession::new();
        session
            .initialize(&flaky(1), &ZsmConfig::default())
            .await
            .unwrap_err();
        session
            .initialize(&flaky(0), &ZsmConfig::default())
            .await
            .unwrap();
        assert_eq!(session.state().name(), "ready");
    }
}
