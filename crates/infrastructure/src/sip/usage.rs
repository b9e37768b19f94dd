use rsip::Method;
use std::fmt;

/// The kinds of interaction a dialog can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageKind {
    InviteSession,
    ClientSubscription,
    ServerSubscription,
    ClientRegistration,
    ServerRegistration,
    ClientPublication,
    ServerPublication,
    OutOfDialogRequest,
}

impl UsageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageKind::InviteSession => "invite-session",
            UsageKind::ClientSubscription => "client-subscription",
            UsageKind::ServerSubscription => "server-subscription",
            UsageKind::ClientRegistration => "client-registration",
            UsageKind::ServerRegistration => "server-registration",
            UsageKind::ClientPublication => "client-publication",
            UsageKind::ServerPublication => "server-publication",
            UsageKind::OutOfDialogRequest => "out-of-dialog-request",
        }
    }

    /// Usage that handles `method` when the remote side sends it.
    pub fn for_incoming_request(method: Method) -> UsageKind {
        match method {
            Method::Invite
            | Method::Ack
            | Method::Bye
            | Method::Cancel
            | Method::Update
            | Method::PRack
            | Method::Info => UsageKind::InviteSession,
            Method::Subscribe | Method::Refer => UsageKind::ServerSubscription,
            Method::Notify => UsageKind::ClientSubscription,
            Method::Register => UsageKind::ServerRegistration,
            Method::Publish => UsageKind::ServerPublication,
            _ => UsageKind::OutOfDialogRequest,
        }
    }

    /// Usage that owns the transaction when we send `method`, used to route
    /// responses back.
    pub fn for_outgoing_request(method: Method) -> UsageKind {
        match method {
            Method::Invite
            | Method::Ack
            | Method::Bye
            | Method::Cancel
            | Method::Update
            | Method::PRack
            | Method::Info => UsageKind::InviteSession,
            Method::Subscribe | Method::Refer => UsageKind::ClientSubscription,
            Method::Notify => UsageKind::ServerSubscription,
            Method::Register => UsageKind::ClientRegistration,
            Method::Publish => UsageKind::ClientPublication,
            _ => UsageKind::OutOfDialogRequest,
        }
    }

    /// Whether an incoming `method` with no matching usage may create one.
    /// A NOTIFY can arrive before the 2xx to its SUBSCRIBE; a re-INVITE or
    /// BYE cannot conjure an invite session.
    pub fn created_by(method: Method) -> bool {
        matches!(
            method,
            Method::Notify
                | Method::Subscribe
                | Method::Refer
                | Method::Message
                | Method::Options
                | Method::Publish
                | Method::Register
        )
    }

    pub fn is_subscription(&self) -> bool {
        matches!(
            self,
            UsageKind::ClientSubscription | UsageKind::ServerSubscription
        )
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsageHandle(u64);

impl UsageHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UsageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "usage-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub handle: UsageHandle,
    pub kind: UsageKind,
    /// Event package for subscriptions ("presence", "refer", ...).
    pub event: Option<String>,
}

/// Usages attached to one dialog. The owner count tracks attach/detach
/// separately from the list so a lost usage shows up as a mismatch.
#[derive(Debug, Default)]
pub struct UsageRegistry {
    usages: Vec<Usage>,
    next_handle: u64,
    owners: usize,
}

impl UsageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, kind: UsageKind, event: Option<String>) -> UsageHandle {
        self.next_handle += 1;
        let handle = UsageHandle(self.next_handle);
        self.usages.push(Usage {
            handle,
            kind,
            event,
        });
        self.owners += 1;
        debug_assert_eq!(self.owners, self.usages.len());
        handle
    }

    pub fn detach(&mut self, handle: UsageHandle) -> Option<Usage> {
        let idx = self.usages.iter().position(|u| u.handle == handle)?;
        let usage = self.usages.remove(idx);
        self.owners -= 1;
        debug_assert_eq!(self.owners, self.usages.len());
        Some(usage)
    }

    /// First usage of `kind`; subscriptions also match on event package.
    pub fn find(&self, kind: UsageKind, event: Option<&str>) -> Option<UsageHandle> {
        self.usages
            .iter()
            .find(|u| {
                u.kind == kind
                    && (!kind.is_subscription()
                        || event.is_none()
                        || u.event.as_deref() == event)
            })
            .map(|u| u.handle)
    }

    pub fn get(&self, handle: UsageHandle) -> Option<&Usage> {
        self.usages.iter().find(|u| u.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Usage> {
        self.usages.iter()
    }

    pub fn owner_count(&self) -> usize {
        self.owners
    }

    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_count_follows_attach_and_detach() {
        let mut registry = UsageRegistry::new();
        let invite = registry.attach(UsageKind::InviteSession, None);
        let sub = registry.attach(UsageKind::ClientSubscription, Some("presence".into()));
        assert_eq!(registry.owner_count(), 2);

        assert!(registry.detach(invite).is_some());
        assert!(registry.detach(invite).is_none());
        assert_eq!(registry.owner_count(), 1);

        registry.detach(sub);
        assert!(registry.is_empty());
        assert_eq!(registry.owner_count(), 0);
    }

    #[test]
    fn test_subscriptions_match_on_event() {
        let mut registry = UsageRegistry::new();
        let presence = registry.attach(UsageKind::ClientSubscription, Some("presence".into()));
        let refer = registry.attach(UsageKind::ClientSubscription, Some("refer".into()));

        assert_eq!(
            registry.find(UsageKind::ClientSubscription, Some("refer")),
            Some(refer)
        );
        assert_eq!(
            registry.find(UsageKind::ClientSubscription, Some("presence")),
            Some(presence)
        );
        assert_eq!(registry.find(UsageKind::ClientSubscription, Some("dialog")), None);
    }

    #[test]
    fn test_notify_routes_to_client_subscription() {
        assert_eq!(
            UsageKind::for_incoming_request(Method::Notify),
            UsageKind::ClientSubscription
        );
        assert_eq!(
            UsageKind::for_outgoing_request(Method::Subscribe),
            UsageKind::ClientSubscription
        );
        assert!(UsageKind::created_by(Method::Notify));
        assert!(!UsageKind::created_by(Method::Bye));
    }
}
