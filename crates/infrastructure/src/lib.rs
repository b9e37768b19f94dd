//! Ferrous SIP Infrastructure Layer
//!
//! The DNS stub resolver with its record cache, and the SIP dialog and
//! client digest-authentication cores.
pub mod dns;
pub mod sip;
