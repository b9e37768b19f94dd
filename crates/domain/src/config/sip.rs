use serde::{Deserialize, Serialize};

use crate::Credential;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SipConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Default for SipConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            credentials: Vec::new(),
        }
    }
}

fn default_user_agent() -> String {
    format!("ferrous-sip/{}", env!("CARGO_PKG_VERSION"))
}
