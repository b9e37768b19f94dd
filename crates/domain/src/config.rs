mod dns;
mod errors;
mod logging;
mod root;
mod sip;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use sip::SipConfig;
