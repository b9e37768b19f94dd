use super::auth::ClientAuthManager;
use super::dialog::{dialog_set_id_of, event_package, Dialog, DialogLiveness};
use super::errors::{AuthError, DialogError};
use super::usage::{UsageHandle, UsageKind};
use ferrous_sip_application::ports::CredentialProvider;
use ferrous_sip_domain::{DialogId, DialogSetId};
use rsip::prelude::HeadersExt;
use rsip::{Request, Response, Uri};
use tracing::{debug, info};

/// Every dialog forked from one original request, plus that request so it
/// can be resent after a digest challenge.
#[derive(Debug)]
pub struct DialogSet {
    id: DialogSetId,
    request: Option<Request>,
    dialogs: Vec<Dialog>,
}

impl DialogSet {
    /// UAC side, keyed by the request's Call-ID and From tag.
    pub fn for_request(request: Request) -> Result<Self, DialogError> {
        Ok(Self {
            id: dialog_set_id_of(&request)?,
            request: Some(request),
            dialogs: Vec::new(),
        })
    }

    /// UAS side; dialogs are added with [`DialogSet::add_uas_dialog`].
    pub fn incoming(id: DialogSetId) -> Self {
        Self {
            id,
            request: None,
            dialogs: Vec::new(),
        }
    }

    pub fn id(&self) -> &DialogSetId {
        &self.id
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn dialogs(&self) -> &[Dialog] {
        &self.dialogs
    }

    pub fn find(&self, id: &DialogId) -> Option<&Dialog> {
        self.dialogs.iter().find(|d| d.id() == id)
    }

    pub fn find_mut(&mut self, id: &DialogId) -> Option<&mut Dialog> {
        self.dialogs.iter_mut().find(|d| d.id() == id)
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// A 1xx carrying a To tag or a 2xx either refreshes the fork it
    /// belongs to or creates a dialog for a new fork.
    pub fn handle_response(
        &mut self,
        response: &Response,
    ) -> Result<Option<&mut Dialog>, DialogError> {
        let Some(request) = self.request.as_ref() else {
            return Ok(None);
        };
        let code = response.status_code.code();
        if !(101..300).contains(&code) {
            return Ok(None);
        }
        let Some(remote_tag) = response.to_header()?.tag()?.map(|t| t.value().to_string()) else {
            return Ok(None);
        };

        if let Some(idx) = self
            .dialogs
            .iter()
            .position(|d| d.id().remote_tag == remote_tag)
        {
            let dialog = &mut self.dialogs[idx];
            dialog.update(&rsip::SipMessage::Response(response.clone()))?;
            return Ok(Some(dialog));
        }

        let mut dialog = Dialog::from_response(request, response)?;
        dialog.attach(
            UsageKind::for_outgoing_request(request.method),
            event_package(request),
        );
        info!(dialog_set = %self.id, dialog_id = %dialog.id(), "New fork");
        self.dialogs.push(dialog);
        Ok(self.dialogs.last_mut())
    }

    pub fn add_uas_dialog(
        &mut self,
        request: &Request,
        local_contact: Uri,
    ) -> Result<&mut Dialog, DialogError> {
        let mut dialog = Dialog::from_request(request, local_contact)?;
        if dialog.dialog_set_id() != self.id {
            return Err(DialogError::DialogMismatch {
                expected: self.id.to_string(),
                actual: dialog.dialog_set_id().to_string(),
            });
        }
        dialog.attach(
            UsageKind::for_incoming_request(request.method),
            event_package(request),
        );
        self.dialogs.push(dialog);
        let idx = self.dialogs.len() - 1;
        Ok(&mut self.dialogs[idx])
    }

    /// Answers a 401/407 to the original request. Returns the request to
    /// resend, with a fresh CSeq and credentials, or None when
    /// authentication cannot proceed.
    pub fn handle_challenge(
        &mut self,
        auth: &mut ClientAuthManager,
        credentials: &dyn CredentialProvider,
        response: &Response,
    ) -> Result<Option<Request>, AuthError> {
        let Some(original) = self.request.as_mut() else {
            return Ok(None);
        };

        let mut retry = original.clone();
        let seq = retry.cseq_header()?.seq()?;
        let next = seq.checked_add(1).ok_or(AuthError::CSeqExhausted(seq))?;
        retry.cseq_header_mut()?.mut_seq(next)?;

        if !auth.handle(credentials, &mut retry, response)? {
            return Ok(None);
        }
        *original = retry.clone();
        Ok(Some(retry))
    }

    /// Detaches a usage from one of the dialogs, dropping the dialog when
    /// that was its last usage. Returns true when the set has become empty;
    /// its auth state is released at that point.
    pub fn detach_usage(
        &mut self,
        dialog_id: &DialogId,
        usage: UsageHandle,
        auth: &mut ClientAuthManager,
    ) -> Result<bool, DialogError> {
        let idx = self
            .dialogs
            .iter()
            .position(|d| d.id() == dialog_id)
            .ok_or_else(|| DialogError::UnknownDialog(dialog_id.to_string()))?;

        if self.dialogs[idx].detach(usage)? == DialogLiveness::Dead {
            let dialog = self.dialogs.remove(idx);
            debug!(dialog_set = %self.id, dialog_id = %dialog.id(), "Dialog removed");
        }

        if self.dialogs.is_empty() {
            auth.dialog_set_destroyed(&self.id);
            info!(dialog_set = %self.id, "Dialog set ended");
            return Ok(true);
        }
        Ok(false)
    }

    /// Tears the set down regardless of attached usages.
    pub fn end(self, auth: &mut ClientAuthManager) {
        auth.dialog_set_destroyed(&self.id);
        info!(dialog_set = %self.id, dialogs = self.dialogs.len(), "Dialog set ended");
    }
}
