pub mod command;
pub mod handle;
pub mod query;
pub mod result_converter;

pub use command::DnsCommand;
pub use handle::DnsStubHandle;
pub use query::{
    cached_result, resolve_from_cache, CacheResolution, Query, QueryId, QueryState, QueryStep,
    MAX_REQUERIES,
};

use super::cache::RrCache;
use ferrous_sip_application::ports::{DnsResultSink, RawQueryPort};
use ferrous_sip_domain::{
    DnsConfig, DnsResult, DnsStatus, DomainError, RecordType, TransportProtocol,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct RawAnswer {
    query_id: QueryId,
    result: Result<Vec<u8>, DomainError>,
}

/// Owns the record cache and every in-flight query. All cache mutation
/// happens on whichever task drives `run`, `run_until_idle` or
/// `process_pending`; other tasks talk to it through [`DnsStubHandle`].
pub struct DnsStub {
    cache: RrCache,
    queries: FxHashMap<QueryId, Query>,
    next_id: QueryId,
    transport: Arc<dyn RawQueryPort>,
    commands: mpsc::Receiver<DnsCommand>,
    answers_tx: mpsc::UnboundedSender<RawAnswer>,
    answers_rx: mpsc::UnboundedReceiver<RawAnswer>,
}

impl DnsStub {
    pub fn new(
        transport: Arc<dyn RawQueryPort>,
        cache: RrCache,
        queue_capacity: usize,
    ) -> (Self, DnsStubHandle) {
        let (tx, commands) = mpsc::channel(queue_capacity.max(1));
        let (answers_tx, answers_rx) = mpsc::unbounded_channel();
        let stub = Self {
            cache,
            queries: FxHashMap::default(),
            next_id: 1,
            transport,
            commands,
            answers_tx,
            answers_rx,
        };
        (stub, DnsStubHandle::new(tx))
    }

    pub fn from_config(
        config: &DnsConfig,
        transport: Arc<dyn RawQueryPort>,
    ) -> (Self, DnsStubHandle) {
        let cache = RrCache::new(config.max_cache_entries, config.ttl_ceiling_minutes);
        Self::new(transport, cache, config.command_queue_capacity)
    }

    /// Event loop. Returns once every handle is dropped and the queries
    /// still in flight have delivered.
    pub async fn run(&mut self) {
        info!("DNS stub started");
        let mut commands_open = true;

        loop {
            if !commands_open && self.queries.is_empty() {
                break;
            }

            tokio::select! {
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!(in_flight = self.queries.len(), "Command queue closed, draining");
                        commands_open = false;
                    }
                },
                Some(answer) = self.answers_rx.recv() => {
                    self.on_raw_answer(answer.query_id, answer.result);
                }
            }
        }

        info!("DNS stub stopped");
    }

    /// Processes queued commands and waits for answers until nothing is
    /// queued and nothing is in flight.
    pub async fn run_until_idle(&mut self) {
        loop {
            while let Ok(command) = self.commands.try_recv() {
                self.handle_command(command);
            }
            if self.queries.is_empty() {
                break;
            }
            match self.answers_rx.recv().await {
                Some(answer) => self.on_raw_answer(answer.query_id, answer.result),
                None => break,
            }
        }
    }

    /// Non-blocking drain for hosts that drive their own poll loop. Returns
    /// how many commands and answers were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
            handled += 1;
        }
        while let Ok(answer) = self.answers_rx.try_recv() {
            self.on_raw_answer(answer.query_id, answer.result);
            handled += 1;
        }
        handled
    }

    pub fn handle_command(&mut self, command: DnsCommand) {
        debug!(command = command.name(), "Executing DNS command");
        match command {
            DnsCommand::Lookup {
                target,
                record_type,
                protocol,
                sink,
            } => self.lookup(&target, record_type, protocol, sink),
            DnsCommand::Blacklist {
                target,
                record_type,
                protocol,
                targets,
            } => {
                let marked = self.cache.blacklist(&target, record_type, protocol, &targets);
                debug!(
                    domain = %target,
                    record_type = %record_type,
                    protocol = %protocol,
                    marked = marked,
                    "Blacklisted cached targets"
                );
            }
            DnsCommand::RetryAfter {
                target,
                record_type,
                protocol,
                seconds,
                targets,
            } => {
                let marked =
                    self.cache
                        .retry_after(&target, record_type, protocol, seconds, &targets);
                debug!(
                    domain = %target,
                    record_type = %record_type,
                    protocol = %protocol,
                    seconds = seconds,
                    marked = marked,
                    "Deferred cached targets"
                );
            }
            DnsCommand::ClearCache => {
                let dropped = self.cache.len();
                self.cache.clear();
                info!(entries = dropped, "DNS cache cleared");
            }
            DnsCommand::DumpCache { reply } => {
                let _ = reply.send(self.cache.dump());
            }
            DnsCommand::Metrics { reply } => {
                let _ = reply.send(self.cache.metrics_snapshot());
            }
            DnsCommand::SetTtlCeiling { minutes } => {
                self.cache.set_ttl_ceiling(minutes);
                info!(minutes = minutes, "DNS TTL ceiling updated");
            }
            DnsCommand::SetMaxEntries { max_entries } => {
                self.cache.set_max_entries(max_entries);
                info!(max_entries = max_entries, "DNS cache bound updated");
            }
        }
    }

    fn lookup(
        &mut self,
        target: &str,
        record_type: RecordType,
        protocol: TransportProtocol,
        sink: Arc<dyn DnsResultSink>,
    ) {
        if !record_type.is_queryable() {
            warn!(domain = %target, record_type = %record_type, "Ignoring lookup for unsupported type");
            return;
        }

        let id = self.next_id;
        self.next_id += 1;

        match resolve_from_cache(&mut self.cache, target, record_type, protocol, 0) {
            CacheResolution::Hit { answer, .. } => {
                debug!(domain = %target, record_type = %record_type, "DNS cache hit");
                result_converter::deliver(
                    sink.as_ref(),
                    record_type,
                    cached_result(target, answer),
                );
            }
            CacheResolution::TooManyHops => {
                warn!(domain = %target, "Cached CNAME chain too long");
                result_converter::deliver(
                    sink.as_ref(),
                    record_type,
                    DnsResult::failure(
                        target,
                        DnsStatus::CnameLimitExceeded,
                        DnsStatus::CnameLimitExceeded.message(),
                    ),
                );
            }
            CacheResolution::Miss { name, hops } => {
                let mut query =
                    Query::new(id, target, record_type, protocol, sink).starting_at(&name, hops);
                if let QueryStep::Issue(name) = query.send() {
                    self.issue(id, name, record_type);
                }
                self.queries.insert(id, query);
            }
        }
    }

    fn issue(&self, query_id: QueryId, name: String, record_type: RecordType) {
        debug!(query_id = query_id, domain = %name, record_type = %record_type, "Issuing DNS query");
        let transport = Arc::clone(&self.transport);
        let answers = self.answers_tx.clone();
        tokio::spawn(async move {
            let result = transport.issue_query(&name, record_type).await;
            // receiver only goes away with the stub itself
            let _ = answers.send(RawAnswer { query_id, result });
        });
    }

    /// Feeds the raw answer for `query_id` into its query.
    pub fn on_raw_answer(&mut self, query_id: QueryId, result: Result<Vec<u8>, DomainError>) {
        let Some(query) = self.queries.get_mut(&query_id) else {
            warn!(query_id = query_id, "Raw answer for unknown query");
            return;
        };

        match query.process(&mut self.cache, result) {
            QueryStep::Issue(name) => {
                let record_type = query.record_type();
                self.issue(query_id, name, record_type);
            }
            QueryStep::Done => {
                self.queries.remove(&query_id);
            }
        }
    }

    pub fn cache(&self) -> &RrCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut RrCache {
        &mut self.cache
    }

    pub fn in_flight(&self) -> usize {
        self.queries.len()
    }
}
