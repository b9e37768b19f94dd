#![allow(dead_code)]
pub mod answers;
pub mod scripted_port;
