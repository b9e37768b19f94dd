//! Ferrous SIP Application Layer
//!
//! Ports the resolver and dialog cores are written against.
pub mod ports;
pub mod services;
