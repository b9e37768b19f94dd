pub mod auth;
pub mod dialog;
pub mod dialog_set;
pub mod errors;
pub mod usage;

pub use auth::{AuthStatus, Challenge, ClientAuthManager, DigestAlgorithm, Qop};
pub use dialog::{Dialog, DialogLiveness, Dispatched};
pub use dialog_set::DialogSet;
pub use errors::{AuthError, DialogError};
pub use usage::{Usage, UsageHandle, UsageKind, UsageRegistry};
