use super::digest::{DigestAlgorithm, Qop};
use crate::sip::errors::AuthError;
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_till, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::{delimited, separated_pair},
    IResult, Parser,
};

/// A parsed WWW-Authenticate / Proxy-Authenticate challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: DigestAlgorithm,
    pub qop_options: Vec<String>,
    pub stale: bool,
    pub domain: Option<String>,
}

impl Challenge {
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        let (scheme, params) = match challenge(value.trim()) {
            Ok((_, parsed)) => parsed,
            Err(e) => return Err(AuthError::MalformedChallenge(e.to_string())),
        };

        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(AuthError::UnsupportedScheme(scheme.to_string()));
        }

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = DigestAlgorithm::default();
        let mut qop_options = Vec::new();
        let mut stale = false;
        let mut domain = None;

        for (name, value) in params {
            match name.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value.to_string()),
                "nonce" => nonce = Some(value.to_string()),
                "opaque" => opaque = Some(value.to_string()),
                "algorithm" => algorithm = value.parse()?,
                "qop" => {
                    qop_options = value
                        .split(',')
                        .map(|q| q.trim().to_ascii_lowercase())
                        .filter(|q| !q.is_empty())
                        .collect()
                }
                "stale" => stale = value.eq_ignore_ascii_case("true"),
                "domain" => domain = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm.ok_or_else(|| AuthError::MalformedChallenge("missing realm".into()))?,
            nonce: nonce.ok_or_else(|| AuthError::MalformedChallenge("missing nonce".into()))?,
            opaque,
            algorithm,
            qop_options,
            stale,
            domain,
        })
    }

    /// `auth` when offered, else `auth-int`, else no qop.
    pub fn preferred_qop(&self) -> Option<Qop> {
        if self.qop_options.iter().any(|q| q == "auth") {
            Some(Qop::Auth)
        } else if self.qop_options.iter().any(|q| q == "auth-int") {
            Some(Qop::AuthInt)
        } else {
            None
        }
    }
}

fn challenge(input: &str) -> IResult<&str, (&str, Vec<(&str, &str)>)> {
    all_consuming(separated_pair(
        token,
        multispace1,
        separated_list1(delimited(multispace0, char(','), multispace0), param),
    ))
    .parse(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || "-_.!%*+`'~".contains(c)).parse(input)
}

fn param(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        token,
        delimited(multispace0, char('='), multispace0),
        alt((
            delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
            map(is_not(", \t\r\n"), |v: &str| v.trim()),
        )),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_challenge() {
        let c = Challenge::parse(
            r#"Digest realm="atlanta.example.com", nonce="84a4cc6f3082121f32b42a2187831a9e", qop="auth,auth-int", algorithm=MD5-sess, opaque="5ccc069c403ebaf9f0171e9517f40e41", stale=TRUE"#,
        )
        .unwrap();

        assert_eq!(c.realm, "atlanta.example.com");
        assert_eq!(c.nonce, "84a4cc6f3082121f32b42a2187831a9e");
        assert_eq!(c.algorithm, DigestAlgorithm::Md5Sess);
        assert_eq!(c.qop_options, vec!["auth", "auth-int"]);
        assert_eq!(c.preferred_qop(), Some(Qop::Auth));
        assert_eq!(c.opaque.as_deref(), Some("5ccc069c403ebaf9f0171e9517f40e41"));
        assert!(c.stale);
    }

    #[test]
    fn test_defaults_without_optional_params() {
        let c = Challenge::parse(r#"Digest realm="biloxi.com", nonce="abc""#).unwrap();
        assert_eq!(c.algorithm, DigestAlgorithm::Md5);
        assert_eq!(c.preferred_qop(), None);
        assert!(!c.stale);
    }

    #[test]
    fn test_auth_int_only() {
        let c = Challenge::parse(r#"Digest realm="r", nonce="n", qop="auth-int""#).unwrap();
        assert_eq!(c.preferred_qop(), Some(Qop::AuthInt));
    }

    #[test]
    fn test_rejects_other_schemes_and_garbage() {
        assert!(matches!(
            Challenge::parse(r#"Basic realm="x""#),
            Err(AuthError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            Challenge::parse("Digest"),
            Err(AuthError::MalformedChallenge(_))
        ));
        assert!(matches!(
            Challenge::parse(r#"Digest nonce="n""#),
            Err(AuthError::MalformedChallenge(_))
        ));
    }
}
