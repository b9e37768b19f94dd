use super::key::CacheKey;
use ferrous_sip_domain::{DnsRecord, DnsStatus, TransportProtocol};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProtocolState {
    protocol: TransportProtocol,
    blacklisted: bool,
    retry_after: bool,
}

#[derive(Debug, Clone)]
struct RrEntry {
    record: DnsRecord,
    // allocated on the first blacklist/retry-after against this record
    states: Option<SmallVec<[ProtocolState; 2]>>,
}

impl RrEntry {
    fn new(record: DnsRecord) -> Self {
        Self {
            record,
            states: None,
        }
    }

    fn state(&self, protocol: TransportProtocol) -> Option<&ProtocolState> {
        self.states
            .as_ref()?
            .iter()
            .find(|s| s.protocol == protocol)
    }

    fn state_mut(&mut self, protocol: TransportProtocol) -> &mut ProtocolState {
        let states = self.states.get_or_insert_with(SmallVec::new);
        let idx = match states.iter().position(|s| s.protocol == protocol) {
            Some(idx) => idx,
            None => {
                states.push(ProtocolState {
                    protocol,
                    blacklisted: false,
                    retry_after: false,
                });
                states.len() - 1
            }
        };
        &mut states[idx]
    }
}

/// What a cached record set yields for one transport protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordsOutcome {
    pub records: Vec<DnsRecord>,
    /// Seconds left on the retry-after window when every usable record is waiting on it.
    pub retry_after: u32,
    /// Every record is blacklisted for the protocol; the owner should drop this set.
    pub all_blacklisted: bool,
}

/// Records cached for one (domain, type) together with their expiry and the
/// per-protocol blacklist and retry-after bookkeeping.
#[derive(Debug, Clone)]
pub struct RrList {
    key: CacheKey,
    entries: Vec<RrEntry>,
    expires_at: u64,
    status: DnsStatus,
    retry_until: u64,
}

impl RrList {
    pub fn new(key: CacheKey, records: Vec<DnsRecord>, ttl_ceiling: u32, now: u64) -> Self {
        let mut list = Self {
            key,
            entries: Vec::new(),
            expires_at: now,
            status: DnsStatus::Success,
            retry_until: 0,
        };
        list.update(records, ttl_ceiling, now);
        list
    }

    /// A negative entry: no records, just the failure status for `ttl` seconds.
    pub fn negative(key: CacheKey, status: DnsStatus, ttl: u32, now: u64) -> Self {
        Self {
            key,
            entries: Vec::new(),
            expires_at: now + u64::from(ttl),
            status,
            retry_until: 0,
        }
    }

    /// Replaces the contents. Blacklist and retry-after state does not survive.
    pub fn update(&mut self, records: Vec<DnsRecord>, ttl_ceiling: u32, now: u64) {
        let min_ttl = records
            .iter()
            .map(DnsRecord::ttl)
            .min()
            .unwrap_or(0)
            .min(ttl_ceiling);

        self.entries = records.into_iter().map(RrEntry::new).collect();
        self.expires_at = now + u64::from(min_ttl);
        self.status = DnsStatus::Success;
        self.retry_until = 0;
    }

    pub fn records(&mut self, protocol: TransportProtocol, now: u64) -> RecordsOutcome {
        let mut outcome = RecordsOutcome::default();
        let mut waiting = false;
        let retry_open = now >= self.retry_until;

        for entry in &mut self.entries {
            let usable = match entry.state(protocol).copied() {
                None => true,
                Some(state) if state.blacklisted => false,
                Some(state) if state.retry_after => {
                    if retry_open {
                        entry.state_mut(protocol).retry_after = false;
                        true
                    } else {
                        waiting = true;
                        false
                    }
                }
                Some(_) => true,
            };
            if usable {
                outcome.records.push(entry.record.clone());
            }
        }

        if outcome.records.is_empty() && !self.entries.is_empty() {
            if waiting {
                outcome.retry_after = self.retry_until.saturating_sub(now) as u32;
            } else {
                outcome.all_blacklisted = true;
            }
        }
        outcome
    }

    /// Marks every record whose value matches one of `targets` as unusable over `protocol`.
    pub fn blacklist(&mut self, protocol: TransportProtocol, targets: &[String]) -> usize {
        let mut marked = 0;
        for entry in &mut self.entries {
            if targets.iter().any(|t| entry.record.is_same_value(t)) {
                entry.state_mut(protocol).blacklisted = true;
                marked += 1;
            }
        }
        marked
    }

    /// Holds matching records back for `seconds`. The deadline is shared by the whole list.
    pub fn retry_after(
        &mut self,
        protocol: TransportProtocol,
        seconds: u32,
        targets: &[String],
        now: u64,
    ) -> usize {
        let mut marked = 0;
        for entry in &mut self.entries {
            if targets.iter().any(|t| entry.record.is_same_value(t)) {
                entry.state_mut(protocol).retry_after = true;
                marked += 1;
            }
        }
        if marked > 0 {
            self.retry_until = now + u64::from(seconds);
        }
        marked
    }

    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_ttl(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn status(&self) -> DnsStatus {
        self.status
    }

    pub fn is_negative(&self) -> bool {
        !self.status.is_success()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record at `idx` regardless of blacklist state.
    pub fn record(&self, idx: usize) -> Option<&DnsRecord> {
        self.entries.get(idx).map(|e| &e.record)
    }

    pub fn describe(&self, now: u64) -> String {
        let mut line = format!("{} ttl={}", self.key, self.remaining_ttl(now));
        if self.is_negative() {
            line.push_str(&format!(" status={}", self.status));
        }
        for entry in &self.entries {
            line.push_str(" [");
            line.push_str(&entry.record.value());
            if let Some(states) = &entry.states {
                for state in states.iter().filter(|s| s.blacklisted) {
                    line.push_str(&format!(" blacklisted:{}", state.protocol));
                }
            }
            line.push(']');
        }
        line
    }
}
