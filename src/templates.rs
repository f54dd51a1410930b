use serde_json::{json, Value};

use crate::provider::OptionsDocument;

// Canonical option documents for the demo relying party. You will need to
// substitute your own relying party data against a real backend.

pub fn example_create() -> OptionsDocument {
    to_object(json!({
        "rp": { "name": "zsm.app", "id": "zsm.app" },
        "user": {
            "id": "wdrGRM8-QVGObt2fluIsnw",
            "name": "user123",
            "displayName": "user123"
        },
        "challenge": "dae5Moljx_7gqaB2482nJ9Sytls_04mdAxbrApwgGcQ",
        "pubKeyCredParams": [
            { "type": "public-key", "alg": -7 },
            { "type": "public-key", "alg": -257 }
        ],
        "timeout": 300000,
        "authenticatorSelection": {
            "residentKey": "discouraged",
            "requireResidentKey": false,
            "userVerification": "required"
        },
        "attestation": "none",
        "extensions": {
            "credentialProtectionPolicy": "userVerificationRequired",
            "enforceCredentialProtectionPolicy": false,
            "uvm": true,
            "credProps": true
        }
    }))
}

/// Assertion options allowing exactly the given credential.
pub fn example_get(credential_id: &str) -> OptionsDocument {
    to_object(json!({
        "challenge": "EeLxRgy2MyLAFsrrv0AH_qf5YQZEtC6ZkTtY4sCtNn8",
        "timeout": 300000,
        "rpId": "zsm.app",
        "allowCredentials": [
            { "id": credential_id, "type": "public-key" }
        ],
        "userVerification": "required"
    }))
}

fn to_object(value: Value) -> OptionsDocument {
    let Value::Object(map) = value else {
        unreachable!()
    };
    map
}
