use ferrous_sip_domain::Credential;

/// Source of digest credentials for an identity, looked up by realm.
pub trait CredentialProvider: Send + Sync {
    fn credential_for(&self, realm: &str) -> Option<Credential>;
}
