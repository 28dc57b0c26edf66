use replikv::{GetResponse, KvClient, NodeAddress, PutResponse};
use slog::Drain;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Available commands:
  INIT ip:port[,ip:port...]  Configure the server addresses.
  PUT key value              Send the <key,value> pair to a server.
  GET key                    Ask a server for the value of `key`.
  HELP                       Show this text.
  EXIT                       Quit.";

#[tokio::main]
async fn main() {
    // User-facing output goes to stdout; the client's own logging to stderr
    // so the prompt stays readable.
    let logger = root_logger();
    let mut client = KvClient::new(logger);

    println!("replikv client -- type HELP if you need it.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n>>> ");
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            // EOF or broken stdin: same as EXIT.
            _ => break,
        };

        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(word) => word.to_uppercase(),
            None => continue,
        };
        let args: Vec<&str> = words.collect();

        match command.as_str() {
            "INIT" => run_init(&mut client, &args),
            "PUT" => run_put(&mut client, &args).await,
            "GET" => run_get(&mut client, &args).await,
            "HELP" => println!("{}", HELP),
            "EXIT" => break,
            // Unrecognized input is ignored without error.
            _ => {}
        }
    }

    println!("Bye.");
}

fn run_init(client: &mut KvClient, args: &[&str]) {
    if args.is_empty() {
        println!("INIT expects at least one `ip:port` address.");
        return;
    }

    // Addresses may be comma- or space-separated. All of them must validate
    // before any is registered.
    let mut addresses = Vec::new();
    for word in args {
        for candidate in word.split(',').filter(|c| !c.is_empty()) {
            match candidate.parse::<NodeAddress>() {
                Ok(address) => addresses.push(address),
                Err(e) => {
                    println!("{}", e);
                    return;
                }
            }
        }
    }

    client.register_servers(addresses);
}

async fn run_put(client: &mut KvClient, args: &[&str]) {
    let (key, value) = match args {
        [key, value] => (*key, *value),
        _ => {
            println!("PUT expects exactly `key` and `value`.");
            return;
        }
    };

    match client.put(key, value).await {
        Ok(PutResponse::Committed {
            key,
            value,
            server_version,
            server,
        }) => {
            println!(
                "PUT_OK key: {} value: {} version: {} from server {}",
                key, value, server_version, server
            );
        }
        Ok(PutResponse::RetryLater { key }) => {
            println!(
                "Write for '{}' was accepted by the leader but replication did not complete; try again.",
                key
            );
        }
        Err(e) => println!("Error: {}", e),
    }
}

async fn run_get(client: &mut KvClient, args: &[&str]) {
    let key = match args {
        [key] => *key,
        _ => {
            println!("GET expects exactly `key`.");
            return;
        }
    };

    match client.get(key).await {
        Ok(GetResponse::Found {
            key,
            value,
            server_version,
            server,
        }) => match value {
            Some(value) => println!(
                "GET_OK key: {} value: {} version: {} from server {}",
                key, value, server_version, server
            ),
            None => println!("Key '{}' has never been written (version 0).", key),
        },
        Ok(GetResponse::TryOtherServer { key }) => {
            println!(
                "Server is behind on '{}'; try another server or try again later.",
                key
            );
        }
        Err(e) => println!("Error: {}", e),
    }
}

fn root_logger() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
