use crate::ports::CredentialProvider;
use ferrous_sip_domain::Credential;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Credentials fixed at startup, keyed by realm. A credential stored under
/// the empty realm answers challenges from any realm without its own entry.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    by_realm: FxHashMap<String, Credential>,
}

impl StaticCredentials {
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let by_realm = credentials
            .into_iter()
            .map(|c| (c.realm.to_ascii_lowercase(), c))
            .collect();
        Self { by_realm }
    }

    pub fn insert(&mut self, credential: Credential) {
        self.by_realm
            .insert(credential.realm.to_ascii_lowercase(), credential);
    }

    pub fn len(&self) -> usize {
        self.by_realm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_realm.is_empty()
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential_for(&self, realm: &str) -> Option<Credential> {
        let found = self
            .by_realm
            .get(&realm.to_ascii_lowercase())
            .or_else(|| self.by_realm.get(""))
            .cloned();
        if found.is_none() {
            debug!(realm = %realm, "No credential for realm");
        }
        found
    }
}
