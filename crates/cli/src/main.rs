use clap::Parser;
use dnsfront_domain::CliOverrides;
use mimalloc::MiMalloc;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "dnsfront")]
#[command(version)]
#[command(about = "dnsfront - DNS front end forwarding UDP and TCP queries to upstream resolvers")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Upstream server, e.g. 9.9.9.9 or 9.9.9.9:53 (repeatable, replaces the configured list)
    #[arg(short = 'u', long = "upstream", value_name = "ADDR")]
    upstreams: Vec<String>,

    /// How long shutdown waits for in-flight queries, in milliseconds
    #[arg(long, value_name = "MS")]
    drain_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind.clone(),
        log_level: cli.log_level.clone(),
        upstream_servers: cli.upstreams.clone(),
        drain_timeout_ms: cli.drain_timeout_ms,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting dnsfront v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config)?;

    server::run_dns_server(&config, dns_services.handler).await?;

    info!("Server shutdown complete");
    Ok(())
}
