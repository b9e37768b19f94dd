use std::fmt;

/// Identity of one dialog: call-id plus the local and remote tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DialogId {
    pub call_id: String,
    pub local_tag: String,
    pub remote_tag: String,
}

impl DialogId {
    pub fn new(
        call_id: impl Into<String>,
        local_tag: impl Into<String>,
        remote_tag: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            local_tag: local_tag.into(),
            remote_tag: remote_tag.into(),
        }
    }

    pub fn dialog_set_id(&self) -> DialogSetId {
        DialogSetId::new(self.call_id.clone(), self.local_tag.clone())
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.call_id, self.local_tag, self.remote_tag)
    }
}

/// Identity shared by every dialog forked from one original request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DialogSetId {
    pub call_id: String,
    pub local_tag: String,
}

impl DialogSetId {
    pub fn new(call_id: impl Into<String>, local_tag: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            local_tag: local_tag.into(),
        }
    }
}

impl fmt::Display for DialogSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.call_id, self.local_tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogType {
    Invitation,
    Subscription,
    /// Created for a request that does not establish a dialog (e.g. REGISTER,
    /// PUBLISH, out-of-dialog MESSAGE) so usages have somewhere to live.
    Fake,
}

impl DialogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogType::Invitation => "invitation",
            DialogType::Subscription => "subscription",
            DialogType::Fake => "fake",
        }
    }
}

impl fmt::Display for DialogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
