use clap::{Parser, Subcommand};
use ferrous_sip_domain::{CliOverrides, RecordType, TransportProtocol};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod auth;
mod bootstrap;
mod di;
mod sink;

#[derive(Parser)]
#[command(name = "ferrous-sip")]
#[command(version)]
#[command(about = "Ferrous SIP - SIP target resolution and digest authentication tooling")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Upstream resolver (udp://IP:PORT, tcp://IP:PORT or IP:PORT); repeatable
    #[arg(short = 'u', long = "upstream", global = true)]
    upstreams: Vec<String>,

    /// Per-query timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a SIP routing target through the caching stub
    Resolve {
        /// Domain to resolve
        name: String,

        /// Record types to look up, in order (A, AAAA, SRV, NAPTR, CNAME)
        #[arg(default_values = ["NAPTR", "SRV", "A"])]
        types: Vec<RecordType>,

        /// Transport the targets will be contacted over
        #[arg(short = 'p', long, default_value = "UDP")]
        protocol: TransportProtocol,

        /// Print the cache contents afterwards
        #[arg(long)]
        dump: bool,
    },

    /// Answer a WWW-Authenticate or Proxy-Authenticate challenge
    Authorize {
        /// Challenge header value, e.g. 'Digest realm="example.com", nonce="..."'
        challenge: String,

        /// Request-URI the credentials are for
        #[arg(long, default_value = "sip:example.com")]
        uri: String,

        /// Request method
        #[arg(short = 'm', long, default_value = "REGISTER")]
        method: String,

        /// Treat the challenge as Proxy-Authenticate
        #[arg(long)]
        proxy: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        upstream_servers: (!cli.upstreams.is_empty()).then(|| cli.upstreams.clone()),
        query_timeout_ms: cli.timeout_ms,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!(
        user_agent = %config.sip.user_agent,
        "Starting Ferrous SIP v{}",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Command::Resolve {
            name,
            types,
            protocol,
            dump,
        } => resolve(&config, &name, &types, protocol, dump).await,
        Command::Authorize {
            challenge,
            uri,
            method,
            proxy,
        } => {
            let method = parse_method(&method)?;
            for line in auth::authorize(&config, &challenge, method, &uri, proxy)? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn resolve(
    config: &ferrous_sip_domain::Config,
    name: &str,
    types: &[RecordType],
    protocol: TransportProtocol,
    dump: bool,
) -> anyhow::Result<()> {
    let services = di::DnsServices::new(config)?;
    let (sink, mut results) = sink::ChannelSink::new();
    let sink = Arc::new(sink);

    // generous bound: a lookup may chase several CNAMEs, each with its own timeout
    let deadline = Duration::from_millis(config.dns.query_timeout_ms)
        * (ferrous_sip_infrastructure::dns::MAX_REQUERIES + 2);

    for record_type in types {
        println!(";; {} {} over {}", name, record_type, protocol);
        services
            .handle
            .lookup(name, *record_type, protocol, sink.clone())
            .await?;

        match tokio::time::timeout(deadline, results.recv()).await {
            Ok(Some(lines)) => {
                for line in lines {
                    println!("{}", line);
                }
            }
            Ok(None) => anyhow::bail!("DNS stub stopped unexpectedly"),
            Err(_) => warn!(domain = %name, record_type = %record_type, "No result before deadline"),
        }
    }

    if dump {
        println!(";; cache");
        for line in services.handle.dump_cache().await? {
            println!("{}", line);
        }
        let metrics = services.handle.metrics().await?;
        println!(
            ";; {} entries, {} hits, {} misses, hit rate {:.1}%",
            metrics.total_entries,
            metrics.hits,
            metrics.misses,
            metrics.hit_rate * 100.0
        );
    }

    drop(services.handle);
    services.runner.await?;
    Ok(())
}

fn parse_method(method: &str) -> anyhow::Result<rsip::Method> {
    use rsip::Method;

    let parsed = match method.to_ascii_uppercase().as_str() {
        "INVITE" => Method::Invite,
        "REGISTER" => Method::Register,
        "SUBSCRIBE" => Method::Subscribe,
        "NOTIFY" => Method::Notify,
        "PUBLISH" => Method::Publish,
        "MESSAGE" => Method::Message,
        "OPTIONS" => Method::Options,
        "REFER" => Method::Refer,
        "INFO" => Method::Info,
        "UPDATE" => Method::Update,
        "BYE" => Method::Bye,
        other => anyhow::bail!("unsupported method: {}", other),
    };
    Ok(parsed)
}
