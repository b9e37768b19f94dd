use serde::{Deserialize, Serialize};
use std::fmt;

/// Digest credential for one realm.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    pub realm: String,
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(
        realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("realm", &self.realm)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
