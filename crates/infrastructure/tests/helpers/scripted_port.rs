use async_trait::async_trait;
use ferrous_sip_application::ports::RawQueryPort;
use ferrous_sip_domain::{DomainError, RecordType};
use std::collections::HashMap;
use std::sync::Mutex;

/// Raw query port answering from a fixed script keyed by (name, type).
/// Unscripted queries time out.
#[derive(Default)]
pub struct ScriptedPort {
    script: Mutex<HashMap<(String, RecordType), Result<Vec<u8>, DomainError>>>,
    calls: Mutex<Vec<(String, RecordType)>>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, name: &str, record_type: RecordType, bytes: Vec<u8>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert((name.to_ascii_lowercase(), record_type), Ok(bytes));
        self
    }

    pub fn fail(&self, name: &str, record_type: RecordType, error: DomainError) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert((name.to_ascii_lowercase(), record_type), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<(String, RecordType)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RawQueryPort for ScriptedPort {
    async fn issue_query(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<u8>, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), record_type));
        self.script
            .lock()
            .unwrap()
            .get(&(name.to_ascii_lowercase(), record_type))
            .cloned()
            .unwrap_or(Err(DomainError::QueryTimeout))
    }
}
