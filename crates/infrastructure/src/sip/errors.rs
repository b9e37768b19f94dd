use super::usage::UsageHandle;
use thiserror::Error;

/// Structured failure raised while creating or driving a dialog. The usage
/// layer decides whether it tears down the dialog, the dialog set, or
/// nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("SIP message error: {0}")]
    Message(String),

    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Missing tag on {0} header")]
    MissingTag(&'static str),

    #[error("Message does not establish a dialog: {0}")]
    NotDialogEstablishing(String),

    #[error("Remote CSeq {received} is lower than last seen {last}")]
    CSeqOutOfOrder { last: u32, received: u32 },

    #[error("Message belongs to dialog {actual}, not {expected}")]
    DialogMismatch { expected: String, actual: String },

    #[error("No usage accepts {0}")]
    NoMatchingUsage(String),

    #[error("Dialog {0} is not part of this dialog set")]
    UnknownDialog(String),

    #[error("Usage {0} is not attached to this dialog")]
    UnknownUsage(UsageHandle),
}

impl From<rsip::Error> for DialogError {
    fn from(e: rsip::Error) -> Self {
        DialogError::Message(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed challenge: {0}")]
    MalformedChallenge(String),

    #[error("Unsupported auth scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("No credential for realm {0}")]
    NoCredential(String),

    #[error("Challenge for realm {0} rejected the cached credential")]
    CredentialRejected(String),

    #[error("CSeq {0} cannot be incremented for a resend")]
    CSeqExhausted(u32),

    #[error("SIP message error: {0}")]
    Message(String),
}

impl From<rsip::Error> for AuthError {
    fn from(e: rsip::Error) -> Self {
        AuthError::Message(e.to_string())
    }
}

impl From<DialogError> for AuthError {
    fn from(e: DialogError) -> Self {
        AuthError::Message(e.to_string())
    }
}
