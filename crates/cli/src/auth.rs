use ferrous_sip_application::services::StaticCredentials;
use ferrous_sip_domain::Config;
use ferrous_sip_infrastructure::sip::dialog::make_tag;
use ferrous_sip_infrastructure::sip::ClientAuthManager;
use rsip::headers::{CSeq, CallId, From, ProxyAuthenticate, To, WwwAuthenticate};
use rsip::prelude::UntypedHeader;
use rsip::{Header, Method, Request, Response, StatusCode, Uri};
use tracing::debug;

/// Answers one challenge header value with the configured credentials and
/// returns the resulting authorization header lines.
pub fn authorize(
    config: &Config,
    challenge: &str,
    method: Method,
    uri: &str,
    proxy: bool,
) -> anyhow::Result<Vec<String>> {
    let target = Uri::try_from(uri)?;
    let credentials = StaticCredentials::new(config.sip.credentials.iter().cloned());

    let mut request = Request {
        method,
        uri: target.clone(),
        headers: vec![
            From::new(format!("<{}>;tag={}", target, make_tag())).into(),
            To::new(format!("<{}>", target)).into(),
            CallId::new(make_tag()).into(),
            CSeq::new(format!("1 {}", method)).into(),
        ]
        .into(),
        version: rsip::Version::V2,
        body: vec![],
    };

    let (status, header): (StatusCode, Header) = if proxy {
        (
            StatusCode::ProxyAuthenticationRequired,
            ProxyAuthenticate::new(challenge).into(),
        )
    } else {
        (StatusCode::Unauthorized, WwwAuthenticate::new(challenge).into())
    };
    let response = Response {
        status_code: status,
        headers: vec![header].into(),
        body: vec![],
        version: rsip::Version::V2,
    };

    let mut manager = ClientAuthManager::new();
    if !manager.handle(&credentials, &mut request, &response)? {
        anyhow::bail!("challenge could not be answered with the configured credentials");
    }
    debug!(method = %method, uri = %target, "Challenge answered");

    Ok(request
        .headers
        .iter()
        .filter_map(|h| match h {
            Header::Authorization(a) => Some(format!("Authorization: {}", a.value())),
            Header::ProxyAuthorization(a) => Some(format!("Proxy-Authorization: {}", a.value())),
            _ => None,
        })
        .collect())
}
