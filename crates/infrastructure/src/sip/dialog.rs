use super::errors::DialogError;
use super::usage::{UsageHandle, UsageKind, UsageRegistry};
use ferrous_sip_domain::{DialogId, DialogSetId, DialogType};
use rsip::param::Tag;
use rsip::prelude::{HeadersExt, ToTypedHeader, UntypedHeader};
use rsip::{Header, Method, Request, Response, SipMessage, StatusCode, StatusCodeKind, Uri};
use tracing::{debug, info, warn};

const TAG_LEN: usize = 10;

pub fn make_tag() -> String {
    (0..TAG_LEN).map(|_| fastrand::alphanumeric()).collect()
}

/// Whether `method` creates dialog state when it succeeds.
pub fn establishes_dialog(method: Method) -> bool {
    matches!(
        method,
        Method::Invite | Method::Subscribe | Method::Refer | Method::Notify
    )
}

fn is_target_refresh(method: Method) -> bool {
    matches!(
        method,
        Method::Invite | Method::Update | Method::Subscribe | Method::Notify | Method::Refer
    )
}

fn dialog_type_for(method: Method) -> DialogType {
    match method {
        Method::Invite => DialogType::Invitation,
        Method::Subscribe | Method::Refer | Method::Notify => DialogType::Subscription,
        _ => DialogType::Fake,
    }
}

fn call_id_of(message: &impl HeadersExt) -> Result<String, DialogError> {
    Ok(message.call_id_header()?.value().to_string())
}

fn from_tag_of(message: &impl HeadersExt) -> Result<Option<String>, DialogError> {
    Ok(message.from_header()?.tag()?.map(|t| t.value().to_string()))
}

fn to_tag_of(message: &impl HeadersExt) -> Result<Option<String>, DialogError> {
    Ok(message.to_header()?.tag()?.map(|t| t.value().to_string()))
}

fn contact_uri_of(message: &impl HeadersExt) -> Option<Uri> {
    let contact = message.contact_header().ok()?;
    contact.typed().ok().map(|c| c.uri)
}

fn record_routes(headers: &rsip::Headers) -> Vec<String> {
    headers
        .iter()
        .filter_map(|h| match h {
            Header::RecordRoute(rr) => Some(rr.value().to_string()),
            _ => None,
        })
        .collect()
}

/// Event package of a subscription request, if the message carries one.
pub fn event_package(request: &Request) -> Option<String> {
    if request.method == Method::Refer {
        return Some("refer".to_string());
    }
    request.headers.iter().find_map(|h| match h {
        Header::Event(event) => event
            .value()
            .split(';')
            .next()
            .map(|pkg| pkg.trim().to_ascii_lowercase()),
        _ => None,
    })
}

/// Dialog set a request we send belongs to: its Call-ID and From tag.
pub fn dialog_set_id_of(request: &Request) -> Result<DialogSetId, DialogError> {
    let call_id = call_id_of(request)?;
    let local_tag = from_tag_of(request)?.ok_or(DialogError::MissingTag("From"))?;
    Ok(DialogSetId::new(call_id, local_tag))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogLiveness {
    Alive,
    /// Last usage detached; the owner should drop the dialog.
    Dead,
}

/// Where `dispatch` delivered a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub usage: UsageHandle,
    pub kind: UsageKind,
    pub created: bool,
}

/// State of one SIP dialog. Lives as long as at least one usage is attached.
#[derive(Debug)]
pub struct Dialog {
    id: DialogId,
    dialog_type: DialogType,
    local_uri: Uri,
    remote_uri: Uri,
    local_contact: Uri,
    remote_target: Uri,
    route_set: Vec<String>,
    local_cseq: u32,
    remote_cseq: Option<u32>,
    invite_cseq: Option<u32>,
    usages: UsageRegistry,
}

impl Dialog {
    /// UAS side: built from a dialog-creating request we received. The
    /// remote tag is the request's From tag, the local tag is newly
    /// allocated unless the To already carries one.
    pub fn from_request(request: &Request, local_contact: Uri) -> Result<Self, DialogError> {
        let call_id = call_id_of(request)?;
        let remote_tag = from_tag_of(request)?.ok_or(DialogError::MissingTag("From"))?;
        let local_tag = to_tag_of(request)?.unwrap_or_else(make_tag);

        let remote_target = match contact_uri_of(request) {
            Some(uri) => uri,
            None if establishes_dialog(request.method) => {
                return Err(DialogError::MissingHeader("Contact"))
            }
            None => request.from_header()?.typed()?.uri,
        };
        let cseq = request.cseq_header()?.seq()?;

        let dialog = Self {
            id: DialogId::new(call_id, local_tag, remote_tag),
            dialog_type: dialog_type_for(request.method),
            local_uri: request.to_header()?.typed()?.uri,
            remote_uri: request.from_header()?.typed()?.uri,
            local_contact,
            remote_target,
            // UAS keeps Record-Route order as received
            route_set: record_routes(&request.headers),
            local_cseq: 0,
            remote_cseq: Some(cseq),
            invite_cseq: None,
            usages: UsageRegistry::new(),
        };

        info!(dialog_id = %dialog.id, dialog_type = %dialog.dialog_type, "UAS dialog created");
        Ok(dialog)
    }

    /// UAC side: built from a 1xx (with To tag) or 2xx answering a request
    /// we sent.
    pub fn from_response(request: &Request, response: &Response) -> Result<Self, DialogError> {
        let code = response.status_code.code();
        if !(101..300).contains(&code) {
            return Err(DialogError::NotDialogEstablishing(format!(
                "status {}",
                code
            )));
        }

        let call_id = call_id_of(response)?;
        let local_tag = from_tag_of(response)?.ok_or(DialogError::MissingTag("From"))?;
        let remote_tag = to_tag_of(response)?.ok_or(DialogError::MissingTag("To"))?;
        let remote_target = contact_uri_of(response).ok_or(DialogError::MissingHeader("Contact"))?;

        // UAC reverses Record-Route
        let mut route_set = record_routes(&response.headers);
        route_set.reverse();

        let local_cseq = request.cseq_header()?.seq()?;
        let local_uri = request.from_header()?.typed()?.uri;
        let local_contact = contact_uri_of(request).unwrap_or_else(|| local_uri.clone());

        let dialog = Self {
            id: DialogId::new(call_id, local_tag, remote_tag),
            dialog_type: dialog_type_for(request.method),
            local_uri,
            remote_uri: request.to_header()?.typed()?.uri,
            local_contact,
            remote_target,
            route_set,
            local_cseq,
            remote_cseq: None,
            invite_cseq: (request.method == Method::Invite).then_some(local_cseq),
            usages: UsageRegistry::new(),
        };

        info!(dialog_id = %dialog.id, dialog_type = %dialog.dialog_type, "UAC dialog created");
        Ok(dialog)
    }

    pub fn id(&self) -> &DialogId {
        &self.id
    }

    pub fn dialog_set_id(&self) -> DialogSetId {
        self.id.dialog_set_id()
    }

    pub fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    pub fn route_set(&self) -> &[String] {
        &self.route_set
    }

    pub fn remote_target(&self) -> &Uri {
        &self.remote_target
    }

    pub fn local_contact(&self) -> &Uri {
        &self.local_contact
    }

    pub fn local_cseq(&self) -> u32 {
        self.local_cseq
    }

    pub fn remote_cseq(&self) -> Option<u32> {
        self.remote_cseq
    }

    pub fn usages(&self) -> &UsageRegistry {
        &self.usages
    }

    /// Builds an in-dialog request. ACK and CANCEL reuse the CSeq of the
    /// INVITE they belong to; anything else takes the next local CSeq.
    pub fn make_request(&mut self, method: Method) -> Request {
        let seq = match method {
            Method::Ack | Method::Cancel => self.invite_cseq.unwrap_or(self.local_cseq),
            _ => {
                self.local_cseq += 1;
                if method == Method::Invite {
                    self.invite_cseq = Some(self.local_cseq);
                }
                self.local_cseq
            }
        };

        let from = rsip::typed::From {
            display_name: None,
            uri: self.local_uri.clone(),
            params: vec![],
        }
        .with_tag(Tag::new(self.id.local_tag.clone()));
        let to = rsip::typed::To {
            display_name: None,
            uri: self.remote_uri.clone(),
            params: vec![],
        }
        .with_tag(Tag::new(self.id.remote_tag.clone()));
        let contact = rsip::typed::Contact {
            display_name: None,
            uri: self.local_contact.clone(),
            params: vec![],
        };

        let mut headers: Vec<Header> = self
            .route_set
            .iter()
            .map(|route| Header::Route(rsip::headers::Route::new(route.clone())))
            .collect();
        headers.push(Header::MaxForwards(70.into()));
        headers.push(Header::From(from.into()));
        headers.push(Header::To(to.into()));
        headers.push(Header::CallId(self.id.call_id.clone().into()));
        headers.push(Header::CSeq(rsip::typed::CSeq { seq, method }.into()));
        headers.push(Header::Contact(contact.into()));

        debug!(dialog_id = %self.id, method = %method, cseq = seq, "Built in-dialog request");
        Request {
            method,
            uri: self.remote_target.clone(),
            headers: headers.into(),
            body: vec![],
            version: rsip::Version::V2,
        }
    }

    /// Builds a response to a request inside this dialog. Any non-100
    /// response carries our tag on the To header; a dialog-establishing
    /// 1xx/2xx also carries our Contact.
    pub fn make_response(
        &self,
        request: &Request,
        status: StatusCode,
    ) -> Result<Response, DialogError> {
        let code = status.code();
        let headers: Vec<Header> = request
            .headers
            .iter()
            .filter(|h| {
                matches!(
                    h,
                    Header::Via(_)
                        | Header::From(_)
                        | Header::To(_)
                        | Header::CallId(_)
                        | Header::CSeq(_)
                        | Header::RecordRoute(_)
                )
            })
            .cloned()
            .collect();

        let mut response = Response {
            status_code: status,
            headers: headers.into(),
            body: vec![],
            version: rsip::Version::V2,
        };

        if code > 100 && to_tag_of(&response)?.is_none() {
            response
                .to_header_mut()?
                .mut_tag(Tag::new(self.id.local_tag.clone()))?;
        }

        if (101..300).contains(&code) && establishes_dialog(request.method) {
            let contact = rsip::typed::Contact {
                display_name: None,
                uri: self.local_contact.clone(),
                params: vec![],
            };
            response.headers.push(Header::Contact(contact.into()));
        }

        Ok(response)
    }

    /// Target refresh: a Contact in a target-refresh request, or in a 2xx
    /// to one, replaces the remote target. The route set never changes.
    pub fn update(&mut self, message: &SipMessage) -> Result<bool, DialogError> {
        let (method, contact) = match message {
            SipMessage::Request(request) => (request.method, contact_uri_of(request)),
            SipMessage::Response(response) => {
                if response.status_code.kind() != StatusCodeKind::Successful {
                    return Ok(false);
                }
                (response.cseq_header()?.method()?, contact_uri_of(response))
            }
        };

        match contact {
            Some(uri) if is_target_refresh(method) => {
                if uri != self.remote_target {
                    debug!(dialog_id = %self.id, target = %uri, "Remote target refreshed");
                    self.remote_target = uri;
                    return Ok(true);
                }
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Checks that an incoming request belongs here and that its CSeq does
    /// not go backwards, then records it and refreshes the target.
    pub fn handle_request(&mut self, request: &Request) -> Result<(), DialogError> {
        let actual = DialogId::new(
            call_id_of(request)?,
            to_tag_of(request)?.unwrap_or_default(),
            from_tag_of(request)?.unwrap_or_default(),
        );
        if actual != self.id {
            return Err(DialogError::DialogMismatch {
                expected: self.id.to_string(),
                actual: actual.to_string(),
            });
        }

        if !matches!(request.method, Method::Ack | Method::Cancel) {
            let received = request.cseq_header()?.seq()?;
            if let Some(last) = self.remote_cseq {
                if received < last {
                    warn!(
                        dialog_id = %self.id,
                        last = last,
                        received = received,
                        "Remote CSeq went backwards"
                    );
                    return Err(DialogError::CSeqOutOfOrder { last, received });
                }
            }
            self.remote_cseq = Some(received);
        }

        self.update(&SipMessage::Request(request.clone()))?;
        Ok(())
    }

    /// Routes an incoming request to its usage, creating one when the
    /// method can start a usage of its own.
    pub fn dispatch_request(&mut self, request: &Request) -> Result<Dispatched, DialogError> {
        self.handle_request(request)?;

        let kind = UsageKind::for_incoming_request(request.method);
        let event = event_package(request);

        if let Some(usage) = self.usages.find(kind, event.as_deref()) {
            return Ok(Dispatched {
                usage,
                kind,
                created: false,
            });
        }

        if UsageKind::created_by(request.method) {
            let usage = self.attach(kind, event);
            return Ok(Dispatched {
                usage,
                kind,
                created: true,
            });
        }

        Err(DialogError::NoMatchingUsage(request.method.to_string()))
    }

    /// Routes a response to the usage that sent the request.
    pub fn dispatch_response(&mut self, response: &Response) -> Result<Dispatched, DialogError> {
        let method = response.cseq_header()?.method()?;
        let kind = UsageKind::for_outgoing_request(method);
        let usage = self
            .usages
            .find(kind, None)
            .ok_or_else(|| DialogError::NoMatchingUsage(format!("{} response", method)))?;

        self.update(&SipMessage::Response(response.clone()))?;
        Ok(Dispatched {
            usage,
            kind,
            created: false,
        })
    }

    pub fn attach(&mut self, kind: UsageKind, event: Option<String>) -> UsageHandle {
        let handle = self.usages.attach(kind, event);
        debug!(dialog_id = %self.id, usage = %handle, kind = %kind, "Usage attached");
        handle
    }

    pub fn detach(&mut self, handle: UsageHandle) -> Result<DialogLiveness, DialogError> {
        let usage = self
            .usages
            .detach(handle)
            .ok_or(DialogError::UnknownUsage(handle))?;
        debug!(dialog_id = %self.id, usage = %handle, kind = %usage.kind, "Usage detached");
        Ok(self.possibly_die())
    }

    /// Dead once nothing is attached.
    pub fn possibly_die(&self) -> DialogLiveness {
        if self.usages.is_empty() {
            info!(dialog_id = %self.id, "Last usage gone, dialog ends");
            DialogLiveness::Dead
        } else {
            DialogLiveness::Alive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsip::headers::{CSeq, CallId, Contact, From, MaxForwards, RecordRoute, To, Via};

    fn invite() -> Request {
        Request {
            method: Method::Invite,
            uri: Uri::try_from("sip:bob@example.com").unwrap(),
            headers: vec![
                Via::new("SIP/2.0/UDP alice.example.com:5060;branch=z9hG4bKtest1").into(),
                CSeq::new("7 INVITE").into(),
                From::new("Alice <sip:alice@example.com>;tag=alice-tag").into(),
                To::new("Bob <sip:bob@example.com>").into(),
                CallId::new("call-1").into(),
                Contact::new("<sip:alice@192.0.2.10:5060>").into(),
                MaxForwards::new("70").into(),
            ]
            .into(),
            version: rsip::Version::V2,
            body: vec![],
        }
    }

    fn ok_for(request: &Request) -> Response {
        let mut headers = request.headers.clone();
        headers.retain(|h| !matches!(h, Header::To(_) | Header::Contact(_)));
        headers.push(To::new("Bob <sip:bob@example.com>;tag=bob-tag").into());
        headers.push(Contact::new("<sip:bob@192.0.2.20:5060>").into());
        headers.push(RecordRoute::new("<sip:p1.example.com;lr>").into());
        headers.push(RecordRoute::new("<sip:p2.example.com;lr>").into());
        Response {
            status_code: StatusCode::OK,
            headers,
            body: vec![],
            version: rsip::Version::V2,
        }
    }

    #[test]
    fn test_uac_dialog_from_response() {
        let request = invite();
        let dialog = Dialog::from_response(&request, &ok_for(&request)).unwrap();

        assert_eq!(dialog.id(), &DialogId::new("call-1", "alice-tag", "bob-tag"));
        assert_eq!(dialog.dialog_type(), DialogType::Invitation);
        assert_eq!(dialog.local_cseq(), 7);
        assert_eq!(
            dialog.route_set(),
            &["<sip:p2.example.com;lr>".to_string(), "<sip:p1.example.com;lr>".to_string()]
        );
        assert_eq!(
            dialog.remote_target(),
            &Uri::try_from("sip:bob@192.0.2.20:5060").unwrap()
        );
    }

    #[test]
    fn test_from_response_rejects_final_failure() {
        let request = invite();
        let mut response = ok_for(&request);
        response.status_code = StatusCode::from(486);
        assert!(matches!(
            Dialog::from_response(&request, &response),
            Err(DialogError::NotDialogEstablishing(_))
        ));
    }

    #[test]
    fn test_uas_dialog_allocates_local_tag() {
        let dialog = Dialog::from_request(
            &invite(),
            Uri::try_from("sip:bob@192.0.2.20").unwrap(),
        )
        .unwrap();
        assert_eq!(dialog.id().remote_tag, "alice-tag");
        assert_eq!(dialog.id().local_tag.len(), TAG_LEN);
        assert_eq!(dialog.remote_cseq(), Some(7));
    }

    #[test]
    fn test_uas_dialog_requires_contact_for_invite() {
        let mut request = invite();
        request.headers.retain(|h| !matches!(h, Header::Contact(_)));
        assert_eq!(
            Dialog::from_request(&request, Uri::try_from("sip:bob@192.0.2.20").unwrap())
                .unwrap_err(),
            DialogError::MissingHeader("Contact")
        );
    }

    #[test]
    fn test_make_request_uses_route_set_and_target() {
        let request = invite();
        let mut dialog = Dialog::from_response(&request, &ok_for(&request)).unwrap();
        let bye = dialog.make_request(Method::Bye);

        assert_eq!(bye.uri, Uri::try_from("sip:bob@192.0.2.20:5060").unwrap());
        assert_eq!(bye.cseq_header().unwrap().seq().unwrap(), 8);
        let routes: Vec<String> = bye
            .headers
            .iter()
            .filter_map(|h| match h {
                Header::Route(r) => Some(r.value().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0], "<sip:p2.example.com;lr>");
    }

    #[test]
    fn test_make_response_stamps_to_tag() {
        let request = invite();
        let dialog =
            Dialog::from_request(&request, Uri::try_from("sip:bob@192.0.2.20").unwrap()).unwrap();

        let trying = dialog.make_response(&request, StatusCode::Trying).unwrap();
        assert!(to_tag_of(&trying).unwrap().is_none());

        let ok = dialog.make_response(&request, StatusCode::OK).unwrap();
        assert_eq!(to_tag_of(&ok).unwrap().as_deref(), Some(dialog.id().local_tag.as_str()));
        assert!(ok.contact_header().is_ok());
    }

    #[test]
    fn test_detach_last_usage_kills_dialog() {
        let request = invite();
        let mut dialog = Dialog::from_response(&request, &ok_for(&request)).unwrap();
        let session = dialog.attach(UsageKind::InviteSession, None);
        let sub = dialog.attach(UsageKind::ClientSubscription, Some("refer".into()));

        assert_eq!(dialog.detach(session).unwrap(), DialogLiveness::Alive);
        assert_eq!(dialog.detach(sub).unwrap(), DialogLiveness::Dead);
        assert_eq!(
            dialog.detach(sub).unwrap_err(),
            DialogError::UnknownUsage(sub)
        );
    }
}
