use async_trait::async_trait;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::ZsmConfig;
use crate::error::{InitError, ZsmError, ZsmErrorCode};
use crate::provider::{Authenticator, AuthenticatorProvider, OptionsDocument, ResultDocument};

/// In-memory software authenticator. Credential ids derive from the request
/// contents and an invocation counter, so a given sequence of ceremonies
/// always produces the same documents.
pub struct SoftAuthenticator {
    created: u64,
    sign_count: u64,
    credential_ids: Vec<String>,
    attestation: Option<ResultDocument>,
}

impl SoftAuthenticator {
    pub fn new() -> Self {
        Self {
            created: 0,
            sign_count: 0,
            credential_ids: Vec::new(),
            attestation: None,
        }
    }

    fn known(&self, credential_id: &str) -> bool {
        self.credential_ids.iter().any(|id| id == credential_id)
    }
}

impl Default for SoftAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for SoftAuthenticator {
    async fn webauthn_create(
        &mut self,
        options: &OptionsDocument,
    ) -> Result<ResultDocument, ZsmError> {
        let challenge = required_str(options, "challenge")?;
        let rp_id = options
            .get("rp")
            .and_then(|rp| rp.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let user_id = options
            .get("user")
            .and_then(|user| user.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("");

        self.created += 1;
        let credential_id = derive_id(&[
            rp_id.as_bytes(),
            user_id.as_bytes(),
            &self.created.to_be_bytes(),
        ]);
        debug!(%credential_id, rp_id, "webauthn create");

        let client_data = client_data_json("webauthn.create", challenge, rp_id);
        let attestation_object = opaque(&[credential_id.as_bytes(), challenge.as_bytes()]);
        let result = to_object(json!({
            "id": credential_id,
            "rawId": credential_id,
            "type": "public-key",
            "authenticatorAttachment": "platform",
            "response": {
                "clientDataJSON": client_data,
                "attestationObject": attestation_object,
                "transports": ["internal"]
            }
        }));

        self.credential_ids.push(credential_id);
        self.attestation = Some(result.clone());
        Ok(result)
    }

    async fn webauthn_get(
        &mut self,
        options: &OptionsDocument,
    ) -> Result<ResultDocument, ZsmError> {
        let challenge = required_str(options, "challenge")?;
        let rp_id = options.get("rpId").and_then(Value::as_str).unwrap_or("");

        let allowed: Vec<&str> = options
            .get("allowCredentials")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| entry.get("id").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        // An empty allow list is the discoverable-credential flow: any
        // resident credential may answer.
        let credential_id = if allowed.is_empty() {
            self.credential_ids.last().map(String::as_str)
        } else {
            allowed.into_iter().find(|id| self.known(id))
        };
        let Some(credential_id) = credential_id.map(str::to_owned) else {
            return Err(ZsmError::with_message(
                ZsmErrorCode::UnauthorizedUser,
                "no matching credential",
            ));
        };

        self.sign_count += 1;
        debug!(%credential_id, rp_id, sign_count = self.sign_count, "webauthn get");
        Ok(to_object(json!({
            "id": credential_id,
            "rawId": credential_id,
            "type": "public-key",
            "authenticatorAttachment": "platform",
            "response": {
                "clientDataJSON": client_data_json("webauthn.get", challenge, rp_id),
                "authenticatorData": opaque(&[rp_id.as_bytes(), &self.sign_count.to_be_bytes()]),
                "signature": opaque(&[
                    credential_id.as_bytes(),
                    challenge.as_bytes(),
                    &self.sign_count.to_be_bytes(),
                ]),
                "userHandle": null
            }
        })))
    }

    async fn webauthn_retrieve(&self) -> Result<ResultDocument, ZsmError> {
        self.attestation.clone().ok_or_else(|| {
            ZsmError::with_message(ZsmErrorCode::Error, "no attestation available")
        })
    }
}

/// Validates the configuration and yields a fresh software authenticator.
pub struct SoftProvider;

#[async_trait]
impl AuthenticatorProvider for SoftProvider {
    async fn create_instance(
        &self,
        config: &ZsmConfig,
    ) -> Result<Box<dyn Authenticator>, InitError> {
        config.validate()?;
        info!(
            host_url = %config.host_url,
            consumer_id = %config.consumer_id,
            "software authenticator ready"
        );
        Ok(Box::new(SoftAuthenticator::new()))
    }
}

fn required_str<'a>(options: &'a OptionsDocument, field: &'static str) -> Result<&'a str, ZsmError> {
    options.get(field).and_then(Value::as_str).ok_or_else(|| {
        ZsmError::with_message(
            ZsmErrorCode::Error,
            &format!("options missing {}", field),
        )
    })
}

fn client_data_json(ceremony_type: &str, challenge: &str, rp_id: &str) -> String {
    let client_data = json!({
        "type": ceremony_type,
        "challenge": challenge,
        "origin": format!("https://{}", rp_id),
        "crossOrigin": false
    });
    base64_url::encode(client_data.to_string().as_bytes())
}

fn derive_id(parts: &[&[u8]]) -> String {
    base64_url::encode(&digest(parts)[..16])
}

fn opaque(parts: &[&[u8]]) -> String {
    base64_url::encode(&digest(parts)[..])
}

fn digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    hasher.finalize().into()
}

fn to_object(value: Value) -> ResultDocument {
    let Value::Object(map) = value else {
        unreachable!()
    };
    map
}
