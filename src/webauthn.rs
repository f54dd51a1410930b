use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::ZsmConfig;
use crate::error::CeremonyError;
use crate::provider::{
    AuthenticatorProvider, OptionsDocument, ProviderSession, ResultDocument, SessionState,
};
use crate::templates;

/// Field extracted from a successful creation result and retained for
/// assertion examples.
const RAW_ID_FIELD: &str = "rawId";

/// Drives the three WebAuthn ceremonies against a provider session and
/// renders every outcome into a single output slot. Entry points take
/// `&mut self`: at most one ceremony is in flight per driver.
pub struct WebAuthnDriver {
    provider: Box<dyn AuthenticatorProvider>,
    session: ProviderSession,
    config: ZsmConfig,
    input_text: String,
    output_text: String,
    error_message: Option<String>,
    credential_id: Option<String>,
}

impl WebAuthnDriver {
    pub fn new(provider: Box<dyn AuthenticatorProvider>, config: ZsmConfig) -> Self {
        Self {
            provider,
            session: ProviderSession::new(),
            config,
            input_text: String::new(),
            output_text: String::new(),
            error_message: None,
            credential_id: None,
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn set_input_text(&mut self, text: &str) {
        self.input_text = text.to_owned();
    }

    pub fn output_text(&self) -> &str {
        &self.output_text
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn credential_id(&self) -> Option<&str> {
        self.credential_id.as_deref()
    }

    pub fn config(&self) -> &ZsmConfig {
        &self.config
    }

    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    /// Builds the provider session from the current configuration. A failure
    /// lands in the error-message slot; existing output is left untouched.
    #[instrument(skip_all)]
    pub async fn initialize(&mut self) {
        self.error_message = None;
        if let Err(error) = self
            .session
            .initialize(self.provider.as_ref(), &self.config)
            .await
        {
            self.error_message = Some(format!("Error initializing ZSM: {}", error));
        }
    }

    /// Replaces the configuration with the given record and re-initializes.
    pub async fn save_config(&mut self, config: ZsmConfig) {
        self.config = config;
        self.initialize().await;
    }

    #[instrument(skip_all)]
    pub async fn create(&mut self) {
        let outcome = self.ceremony_create().await;
        self.output_text = render_outcome(outcome);
    }

    #[instrument(skip_all)]
    pub async fn get(&mut self) {
        let outcome = self.ceremony_get().await;
        self.output_text = render_outcome(outcome);
    }

    #[instrument(skip_all)]
    pub async fn retrieve(&mut self) {
        let outcome = self.ceremony_retrieve().await;
        self.output_text = render_outcome(outcome);
    }

    /// Resets the input and output slots. Session state and the retained
    /// credential id survive.
    pub fn clear_input(&mut self) {
        self.input_text.clear();
        self.output_text.clear();
    }

    /// Resets the output slot and any pending initialization error.
    pub fn clear_output(&mut self) {
        self.output_text.clear();
        self.error_message = None;
    }

    pub fn load_example_create(&mut self) {
        self.input_text = format_json(&templates::example_create());
    }

    /// Loads the assertion example for the credential created earlier in
    /// this session, if there is one.
    pub fn load_example_get(&mut self) {
        match &self.credential_id {
            Some(credential_id) => {
                self.input_text = format_json(&templates::example_get(credential_id));
            }
            None => {
                self.error_message =
                    Some("No credential available. Run Create first.".to_owned());
            }
        }
    }

    async fn ceremony_create(&mut self) -> Result<ResultDocument, CeremonyError> {
        let options = parse_options(&self.input_text)?;
        let authenticator = self
            .session
            .authenticator()
            .ok_or(CeremonyError::NotInitialized)?;
        let result = authenticator.webauthn_create(&options).await?;
        let raw_id = result
            .get(RAW_ID_FIELD)
            .and_then(Value::as_str)
            .ok_or(CeremonyError::MalformedResult(
                "malformed create result: missing rawId",
            ))?;
        info!(raw_id, "credential created");
        self.credential_id = Some(raw_id.to_owned());
        Ok(result)
    }

    async fn ceremony_get(&mut self) -> Result<ResultDocument, CeremonyError> {
        let options = parse_options(&self.input_text)?;
        let authenticator = self
            .session
            .authenticator()
            .ok_or(CeremonyError::NotInitialized)?;
        let result = authenticator.webauthn_get(&options).await?;
        Ok(result)
    }

    async fn ceremony_retrieve(&mut self) -> Result<ResultDocument, CeremonyError> {
        let authenticator = self
            .session
            .authenticator()
            .ok_or(CeremonyError::NotInitialized)?;
        let result = authenticator.webauthn_retrieve().await?;
        Ok(result)
    }
}

fn parse_options(input: &str) -> Result<OptionsDocument, CeremonyError> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => {
            debug!(kind = json_kind(&other), "input is not a JSON object");
            Err(CeremonyError::InvalidJson)
        }
        Err(error) => {
            debug!(%error, "input failed to parse");
            Err(CeremonyError::InvalidJson)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_outcome(outcome: Result<ResultDocument, CeremonyError>) -> String {
    match outcome {
        Ok(result) => format_json(&result),
        Err(error) => {
            warn!(%error, "ceremony failed");
            error.render()
        }
    }
}

fn format_json(document: &OptionsDocument) -> String {
    serde_json::to_string_pretty(document)
        .unwrap_or_else(|_| "Error formatting JSON".to_owned())
}
