//! Credential resolution chain
//!
//! Each credential component resolves independently: explicit argument,
//! then process environment, then same-named inventory entry. When
//! nothing resolves, authentication is left to the SDK default chain
//! (profiles, IAM instance roles).

use crate::error::{Error, Result};
use crate::inventory::Inventory;
use tracing::debug;

/// Environment variable / inventory entry for the access key id
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";

/// Environment variable / inventory entry for the secret access key
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// An explicitly resolved static credential pair
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// Resolve one credential component: explicit argument, then process
/// environment, then same-named inventory entry.
pub fn resolve_value(explicit: Option<&str>, name: &str, inventory: &Inventory) -> Option<String> {
    if let Some(value) = explicit {
        return Some(value.to_string());
    }
    if let Ok(value) = std::env::var(name) {
        return Some(value);
    }
    inventory.var(name).map(str::to_string)
}

/// Resolve the credential pair.
///
/// Returns `None` when neither component resolves. Resolving exactly one
/// component is a caller error: handing a half-pair to the SDK would fail
/// later with an opaque signing error.
pub fn resolve_credentials(
    access_key_id: Option<&str>,
    secret_access_key: Option<&str>,
    inventory: &Inventory,
) -> Result<Option<StaticCredentials>> {
    pair(
        resolve_value(access_key_id, AWS_ACCESS_KEY_ID, inventory),
        resolve_value(secret_access_key, AWS_SECRET_ACCESS_KEY, inventory),
    )
}

/// Pair the two resolved components: both, neither, or an error.
fn pair(
    access: Option<String>,
    secret: Option<String>,
) -> Result<Option<StaticCredentials>> {
    match (access, secret) {
        (Some(access_key_id), Some(secret_access_key)) => {
            debug!("Using explicitly resolved AWS credentials");
            Ok(Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }))
        }
        (None, None) => {
            debug!("No explicit AWS credentials, deferring to the SDK default chain");
            Ok(None)
        }
        (Some(_), None) => Err(Error::InvalidArgument(
            "access key id resolved without a secret access key".to_string(),
        )),
        (None, Some(_)) => Err(Error::InvalidArgument(
            "secret access key resolved without an access key id".to_string(),
        )),
    }
}
