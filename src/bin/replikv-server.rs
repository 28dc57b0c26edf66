use clap::Parser;
use replikv::{NodeAddress, ServerConfig};
use slog::Drain;

/// One node of the replicated key-value store. The node that binds the
/// leader address is the leader; every other node follows it.
#[derive(Parser)]
#[command(name = "replikv-server")]
struct Args {
    /// IP to bind.
    #[arg(long, default_value = "127.0.0.1")]
    ip: String,

    /// Port to bind.
    #[arg(long, default_value_t = 1099)]
    port: u16,

    /// Leader IP.
    #[arg(long, default_value = "127.0.0.1")]
    leader_ip: String,

    /// Leader port.
    #[arg(long, default_value_t = 1099)]
    leader_port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = ServerConfig {
        bind_address: NodeAddress::new(args.ip, args.port),
        leader_address: NodeAddress::new(args.leader_ip, args.leader_port),
    };

    let role = if config.is_leader() { "leader" } else { "follower" };
    let logger = root_logger(config.bind_address.to_string(), role);

    let node = match replikv::start_node(logger.clone(), config).await {
        Ok(node) => node,
        Err(e) => {
            slog::crit!(logger, "Node failed to start: {}", e);
            drop(logger);
            std::process::exit(1);
        }
    };

    // Serve until the operator kills the process; nothing is fatal by
    // design once the accept loop is running.
    let _node = node;
    std::future::pending::<()>().await
}

fn root_logger(addr: String, role: &'static str) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("addr" => addr, "role" => role))
}
