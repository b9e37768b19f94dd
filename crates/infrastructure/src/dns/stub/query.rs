use super::result_converter;
use crate::dns::cache::key::normalize_domain;
use crate::dns::cache::{CachedAnswer, RrCache};
use crate::dns::forwarding::{ParsedAnswer, ResponseParser};
use ferrous_sip_application::ports::DnsResultSink;
use ferrous_sip_domain::{
    DnsRecord, DnsResult, DnsStatus, DomainError, RecordType, TransportProtocol,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on CNAME hops for one resolution, counting hops followed
/// inside an answer, from the cache and by re-querying.
pub const MAX_REQUERIES: u32 = 5;

pub type QueryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Created,
    Sent,
    Answered,
    TimedOut,
    CnameRedirect,
    Failed,
}

impl QueryState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            QueryState::Answered | QueryState::TimedOut | QueryState::Failed
        )
    }
}

/// What the owning stub does next with a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStep {
    /// Send a raw query for this name.
    Issue(String),
    /// The result has been delivered; forget the query.
    Done,
}

/// Result of walking cached CNAMEs from a name.
#[derive(Debug)]
pub enum CacheResolution {
    Hit { name: String, answer: CachedAnswer, hops: u32 },
    Miss { name: String, hops: u32 },
    TooManyHops,
}

/// Follows cached CNAME entries from `name` (for types that chase CNAMEs)
/// and looks the final name up.
pub fn resolve_from_cache(
    cache: &mut RrCache,
    name: &str,
    record_type: RecordType,
    protocol: TransportProtocol,
    mut hops: u32,
) -> CacheResolution {
    let mut name = normalize_domain(name).into_string();
    if record_type.follows_cname() {
        while let Some(next) = cache.cname_target(&name) {
            hops += 1;
            if hops > MAX_REQUERIES {
                return CacheResolution::TooManyHops;
            }
            debug!(from = %name, to = %next, "Following cached CNAME");
            name = next;
        }
    }
    match cache.lookup(&name, record_type, protocol) {
        Some(answer) => CacheResolution::Hit { name, answer, hops },
        None => CacheResolution::Miss { name, hops },
    }
}

pub fn cached_result(domain: &str, answer: CachedAnswer) -> DnsResult<DnsRecord> {
    if answer.status.is_success() {
        DnsResult::success(domain, answer.records, answer.retry_after)
    } else {
        DnsResult::failure(domain, answer.status, answer.status.message())
    }
}

/// One outstanding resolution of (target, type) for a transport protocol.
pub struct Query {
    id: QueryId,
    target: String,
    current: String,
    record_type: RecordType,
    protocol: TransportProtocol,
    follow_cname: bool,
    requery_count: u32,
    state: QueryState,
    sink: Arc<dyn DnsResultSink>,
}

impl Query {
    pub fn new(
        id: QueryId,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) -> Self {
        Self {
            id,
            target: target.to_string(),
            current: normalize_domain(target).into_string(),
            record_type,
            protocol,
            follow_cname: record_type.follows_cname(),
            requery_count: 0,
            state: QueryState::Created,
            sink,
        }
    }

    /// Starts at `name` with `hops` CNAME redirections already spent,
    /// used when the chain was partly walked in the cache.
    pub fn starting_at(mut self, name: &str, hops: u32) -> Self {
        self.current = normalize_domain(name).into_string();
        self.requery_count = hops;
        self
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    pub fn requery_count(&self) -> u32 {
        self.requery_count
    }

    /// Transition to `Sent`; returns the name the raw query goes out for.
    pub fn send(&mut self) -> QueryStep {
        self.state = QueryState::Sent;
        QueryStep::Issue(self.current.clone())
    }

    /// Consumes the raw answer for the name last sent.
    pub fn process(
        &mut self,
        cache: &mut RrCache,
        answer: Result<Vec<u8>, DomainError>,
    ) -> QueryStep {
        let bytes = match answer {
            Ok(bytes) => bytes,
            Err(e) => {
                let status = ResponseParser::transport_error_status(&e);
                warn!(
                    domain = %self.current,
                    record_type = %self.record_type,
                    error = %e,
                    "DNS query failed"
                );
                self.state = if status == DnsStatus::Timeout {
                    QueryState::TimedOut
                } else {
                    QueryState::Failed
                };
                return self.finish_failed(status, e.to_string());
            }
        };

        let parsed = match ResponseParser::parse(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.state = QueryState::Failed;
                return self.finish_failed(DnsStatus::BadResponse, e.to_string());
            }
        };

        if !parsed.status.is_success() {
            if parsed.status.is_cacheable_failure() {
                cache.cache_ttl(
                    &self.current,
                    self.record_type,
                    parsed.status,
                    parsed.negative_ttl,
                );
            }
            self.state = QueryState::Failed;
            return self.finish_failed(parsed.status, parsed.status.message().to_string());
        }

        self.cache_answer(cache, &parsed);

        let mut name = self.current.clone();
        if self.follow_cname {
            while parsed.records_for(&name, self.record_type).next().is_none() {
                let next = match parsed.records_for(&name, RecordType::CNAME).next() {
                    Some(DnsRecord::Cname(cname)) => cname.target.clone(),
                    _ => break,
                };
                self.requery_count += 1;
                if self.requery_count > MAX_REQUERIES {
                    return self.finish_loop();
                }
                debug!(from = %name, to = %next, "Following CNAME in answer");
                name = next;
            }
        }

        if parsed.records_for(&name, self.record_type).next().is_some() {
            self.state = QueryState::Answered;
            return self.finish_from_cache(cache, &name, &parsed);
        }

        if name != self.current {
            return self.redirect(cache, &name);
        }

        cache.cache_ttl(
            &self.current,
            self.record_type,
            DnsStatus::NoData,
            parsed.negative_ttl,
        );
        self.state = QueryState::Answered;
        self.finish_failed(DnsStatus::NoData, DnsStatus::NoData.message().to_string())
    }

    /// Answer ended on a CNAME without the target's records.
    fn redirect(&mut self, cache: &mut RrCache, name: &str) -> QueryStep {
        self.state = QueryState::CnameRedirect;
        match resolve_from_cache(cache, name, self.record_type, self.protocol, self.requery_count)
        {
            CacheResolution::Hit { answer, .. } => {
                self.state = QueryState::Answered;
                self.deliver(cached_result(&self.target, answer));
                QueryStep::Done
            }
            CacheResolution::Miss { name, hops } => {
                self.requery_count = hops;
                debug!(
                    domain = %self.target,
                    next = %name,
                    requeries = hops,
                    "Re-querying CNAME target"
                );
                self.current = name;
                self.send()
            }
            CacheResolution::TooManyHops => self.finish_loop(),
        }
    }

    fn cache_answer(&self, cache: &mut RrCache, parsed: &ParsedAnswer) {
        let mut groups: Vec<(String, RecordType, Vec<DnsRecord>)> = Vec::new();
        for record in &parsed.answers {
            let rt = record.record_type();
            if rt != self.record_type && rt != RecordType::CNAME {
                continue;
            }
            match groups
                .iter_mut()
                .find(|(name, t, _)| *t == rt && name == record.name())
            {
                Some((_, _, records)) => records.push(record.clone()),
                None => groups.push((record.name().to_string(), rt, vec![record.clone()])),
            }
        }
        for (name, rt, records) in groups {
            cache.update_cache(&name, rt, records);
        }
    }

    /// Delivers through the cache so blacklist state applies; falls back to
    /// the answer itself when the entry could not be kept (zero TTL).
    fn finish_from_cache(&mut self, cache: &mut RrCache, name: &str, parsed: &ParsedAnswer) -> QueryStep {
        let result = match cache.lookup_fresh(name, self.record_type, self.protocol) {
            Some(answer) => cached_result(&self.target, answer),
            None => DnsResult::success(
                &self.target,
                parsed.records_for(name, self.record_type).cloned().collect(),
                0,
            ),
        };
        self.deliver(result);
        QueryStep::Done
    }

    fn finish_loop(&mut self) -> QueryStep {
        warn!(
            domain = %self.target,
            record_type = %self.record_type,
            "CNAME chain exceeds {} redirections",
            MAX_REQUERIES
        );
        self.state = QueryState::Failed;
        self.finish_failed(
            DnsStatus::CnameLimitExceeded,
            DnsStatus::CnameLimitExceeded.message().to_string(),
        )
    }

    fn finish_failed(&mut self, status: DnsStatus, message: String) -> QueryStep {
        self.deliver(DnsResult::failure(&self.target, status, message));
        QueryStep::Done
    }

    fn deliver(&self, result: DnsResult<DnsRecord>) {
        debug!(
            query_id = self.id,
            domain = %result.domain,
            record_type = %self.record_type,
            status = %result.status,
            records = result.records.len(),
            "Delivering DNS result"
        );
        result_converter::deliver(self.sink.as_ref(), self.record_type, result);
    }
}
