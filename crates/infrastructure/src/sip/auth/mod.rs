pub mod challenge;
pub mod digest;
pub mod manager;

pub use challenge::Challenge;
pub use digest::{compute_response, format_nonce_count, DigestAlgorithm, DigestInput, Qop};
pub use manager::{AuthStatus, ClientAuthManager};
