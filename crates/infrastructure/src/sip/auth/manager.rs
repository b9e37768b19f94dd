use super::challenge::Challenge;
use super::digest::{compute_response, format_nonce_count, DigestInput};
use crate::sip::dialog::dialog_set_id_of;
use crate::sip::errors::AuthError;
use ferrous_sip_application::ports::CredentialProvider;
use ferrous_sip_domain::{Credential, DialogSetId};
use rsip::prelude::UntypedHeader;
use rsip::{Header, Request, Response};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

const CNONCE_LEN: usize = 16;

/// Where a dialog set stands with its digest credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Invalid,
    /// Credentials were accepted; reused on later requests.
    Cached,
    /// Credentials were just computed for a challenge and not yet confirmed.
    Current,
    /// The server rejected what we had. Terminal for the dialog set.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChallengeKind {
    Proxy,
    Www,
}

#[derive(Debug, Clone)]
struct CachedCredential {
    challenge: Challenge,
    credential: Credential,
    cnonce: String,
    nonce_count: u32,
}

impl CachedCredential {
    fn new(challenge: Challenge, credential: Credential) -> Self {
        Self {
            challenge,
            credential,
            cnonce: make_cnonce(),
            nonce_count: 0,
        }
    }

    /// Takes the latest challenge parameters. Only a new server nonce gets a
    /// new client nonce and restarts the count.
    fn refresh(&mut self, challenge: Challenge) {
        if challenge.nonce != self.challenge.nonce {
            self.cnonce = make_cnonce();
            self.nonce_count = 0;
        }
        self.challenge = challenge;
    }

    fn authorize(&mut self, method: &str, uri: &str, body: &[u8]) -> String {
        let qop = self.challenge.preferred_qop();
        if qop.is_some() {
            self.nonce_count += 1;
        }

        let response = compute_response(&DigestInput {
            username: &self.credential.username,
            realm: &self.challenge.realm,
            password: &self.credential.password,
            nonce: &self.challenge.nonce,
            method,
            uri,
            body,
            algorithm: self.challenge.algorithm,
            qop,
            cnonce: &self.cnonce,
            nonce_count: self.nonce_count,
        });

        let mut value = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}", algorithm={}"#,
            self.credential.username,
            self.challenge.realm,
            self.challenge.nonce,
            uri,
            response,
            self.challenge.algorithm
        );
        if qop.is_some() || self.challenge.algorithm.is_session() {
            value.push_str(&format!(r#", cnonce="{}""#, self.cnonce));
        }
        if let Some(qop) = qop {
            value.push_str(&format!(
                ", qop={}, nc={}",
                qop,
                format_nonce_count(self.nonce_count)
            ));
        }
        if let Some(opaque) = &self.challenge.opaque {
            value.push_str(&format!(r#", opaque="{}""#, opaque));
        }
        value
    }
}

#[derive(Debug)]
struct AuthState {
    proxy: Vec<(String, CachedCredential)>,
    www: Vec<(String, CachedCredential)>,
    status: AuthStatus,
}

impl AuthState {
    fn new() -> Self {
        Self {
            proxy: Vec::new(),
            www: Vec::new(),
            status: AuthStatus::Invalid,
        }
    }

    fn handle_challenge(
        &mut self,
        kind: ChallengeKind,
        challenge: Challenge,
        credentials: &dyn CredentialProvider,
    ) -> Result<(), AuthError> {
        let realm = challenge.realm.to_ascii_lowercase();
        let previous_status = self.status;
        let entries = match kind {
            ChallengeKind::Proxy => &mut self.proxy,
            ChallengeKind::Www => &mut self.www,
        };

        if let Some((_, cached)) = entries.iter_mut().find(|(r, _)| *r == realm) {
            if challenge.stale {
                debug!(realm = %realm, "Stale nonce, keeping credential");
                cached.refresh(challenge);
                return Ok(());
            }
            // credentials sent on the last attempt were refused
            if previous_status == AuthStatus::Current {
                return Err(AuthError::CredentialRejected(challenge.realm));
            }
            cached.refresh(challenge);
            return Ok(());
        }

        let credential = credentials
            .credential_for(&challenge.realm)
            .ok_or_else(|| AuthError::NoCredential(challenge.realm.clone()))?;
        entries.push((realm, CachedCredential::new(challenge, credential)));
        Ok(())
    }
}

fn make_cnonce() -> String {
    (0..CNONCE_LEN).map(|_| fastrand::alphanumeric()).collect()
}

/// Digest state per dialog set. Entries live until the owning dialog set
/// reports that it is gone.
#[derive(Debug, Default)]
pub struct ClientAuthManager {
    states: FxHashMap<DialogSetId, AuthState>,
}

impl ClientAuthManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a response to `request` through the manager. For a 401/407
    /// every challenge is answered (Proxy-Authenticate before
    /// WWW-Authenticate) and the credentials are written into `request`;
    /// returns true when the caller should resend it. Any other response
    /// confirms credentials in use.
    pub fn handle(
        &mut self,
        credentials: &dyn CredentialProvider,
        request: &mut Request,
        response: &Response,
    ) -> Result<bool, AuthError> {
        let id = dialog_set_id_of(request)?;
        let code = response.status_code.code();

        if code != 401 && code != 407 {
            if let Some(state) = self.states.get_mut(&id) {
                if state.status == AuthStatus::Current && code < 300 {
                    debug!(dialog_set = %id, "Credentials accepted");
                    state.status = AuthStatus::Cached;
                }
            }
            return Ok(false);
        }

        let mut challenges: Vec<(ChallengeKind, String)> = response
            .headers
            .iter()
            .filter_map(|h| match h {
                Header::ProxyAuthenticate(h) => Some((ChallengeKind::Proxy, h.value().to_string())),
                _ => None,
            })
            .collect();
        challenges.extend(response.headers.iter().filter_map(|h| match h {
            Header::WwwAuthenticate(h) => Some((ChallengeKind::Www, h.value().to_string())),
            _ => None,
        }));

        if challenges.is_empty() {
            warn!(dialog_set = %id, status = code, "Challenge response without challenge headers");
            return Ok(false);
        }

        let state = self.states.entry(id.clone()).or_insert_with(AuthState::new);
        if state.status == AuthStatus::Failed {
            debug!(dialog_set = %id, "Authentication already failed");
            return Ok(false);
        }

        for (kind, value) in challenges {
            let outcome = Challenge::parse(&value)
                .and_then(|challenge| state.handle_challenge(kind, challenge, credentials));
            if let Err(e) = outcome {
                warn!(dialog_set = %id, error = %e, "Cannot answer challenge");
                state.status = AuthStatus::Failed;
                return Ok(false);
            }
        }

        state.status = AuthStatus::Current;
        info!(dialog_set = %id, "Answering digest challenge");
        self.add_authentication(request)?;
        Ok(true)
    }

    /// Writes the dialog set's credentials into `request` without waiting
    /// for a challenge. Each reuse bumps the nonce count.
    pub fn add_authentication(&mut self, request: &mut Request) -> Result<(), AuthError> {
        let id = dialog_set_id_of(request)?;
        let Some(state) = self.states.get_mut(&id) else {
            return Ok(());
        };
        if !matches!(state.status, AuthStatus::Cached | AuthStatus::Current) {
            return Ok(());
        }

        request
            .headers
            .retain(|h| !matches!(h, Header::Authorization(_) | Header::ProxyAuthorization(_)));

        let method = request.method.to_string();
        let uri = request.uri.to_string();

        for (_, cached) in state.proxy.iter_mut() {
            let value = cached.authorize(&method, &uri, &request.body);
            request
                .headers
                .push(Header::ProxyAuthorization(rsip::headers::ProxyAuthorization::new(value)));
        }
        for (_, cached) in state.www.iter_mut() {
            let value = cached.authorize(&method, &uri, &request.body);
            request
                .headers
                .push(Header::Authorization(rsip::headers::Authorization::new(value)));
        }
        Ok(())
    }

    pub fn dialog_set_destroyed(&mut self, id: &DialogSetId) -> bool {
        let removed = self.states.remove(id).is_some();
        if removed {
            debug!(dialog_set = %id, "Auth state released");
        }
        removed
    }

    pub fn status(&self, id: &DialogSetId) -> AuthStatus {
        self.states
            .get(id)
            .map(|s| s.status)
            .unwrap_or(AuthStatus::Invalid)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
