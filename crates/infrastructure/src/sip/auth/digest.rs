use crate::sip::errors::AuthError;
use md5::{Digest, Md5};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Md5Sess => "MD5-sess",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha256Sess => "SHA-256-sess",
        }
    }

    pub fn is_session(&self) -> bool {
        matches!(self, DigestAlgorithm::Md5Sess | DigestAlgorithm::Sha256Sess)
    }

    /// Lower-case hex digest of `data`.
    pub fn hash(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Md5 | DigestAlgorithm::Md5Sess => format!("{:x}", Md5::digest(data)),
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha256Sess => {
                format!("{:x}", Sha256::digest(data))
            }
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "md5-sess" => Ok(DigestAlgorithm::Md5Sess),
            "sha-256" => Ok(DigestAlgorithm::Sha256),
            "sha-256-sess" => Ok(DigestAlgorithm::Sha256Sess),
            _ => Err(AuthError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    Auth,
    AuthInt,
}

impl Qop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Qop::Auth => "auth",
            Qop::AuthInt => "auth-int",
        }
    }
}

impl fmt::Display for Qop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that goes into one digest `response` value.
#[derive(Debug, Clone)]
pub struct DigestInput<'a> {
    pub username: &'a str,
    pub realm: &'a str,
    pub password: &'a str,
    pub nonce: &'a str,
    pub method: &'a str,
    pub uri: &'a str,
    pub body: &'a [u8],
    pub algorithm: DigestAlgorithm,
    pub qop: Option<Qop>,
    pub cnonce: &'a str,
    pub nonce_count: u32,
}

pub fn format_nonce_count(nonce_count: u32) -> String {
    format!("{:08x}", nonce_count)
}

/// RFC 2617 / RFC 7616 request digest.
pub fn compute_response(input: &DigestInput<'_>) -> String {
    let alg = input.algorithm;

    let mut ha1 = alg.hash(format!("{}:{}:{}", input.username, input.realm, input.password).as_bytes());
    if alg.is_session() {
        ha1 = alg.hash(format!("{}:{}:{}", ha1, input.nonce, input.cnonce).as_bytes());
    }

    let ha2 = match input.qop {
        Some(Qop::AuthInt) => alg.hash(
            format!("{}:{}:{}", input.method, input.uri, alg.hash(input.body)).as_bytes(),
        ),
        _ => alg.hash(format!("{}:{}", input.method, input.uri).as_bytes()),
    };

    match input.qop {
        Some(qop) => alg.hash(
            format!(
                "{}:{}:{}:{}:{}:{}",
                ha1,
                input.nonce,
                format_nonce_count(input.nonce_count),
                input.cnonce,
                qop,
                ha2
            )
            .as_bytes(),
        ),
        None => alg.hash(format!("{}:{}:{}", ha1, input.nonce, ha2).as_bytes()),
    }
}
