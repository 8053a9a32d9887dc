//! Binary entrypoint for the meshgopher CLI.
//!
//! Commands:
//! - `start` - run the DM browser with an interactive console transport
//! - `init` - create a starter `config.toml`
//! - `fetch <url> [--json]` - one-shot Gopher probe printing the parsed listing
//!
//! See the library crate docs for module-level details: `meshgopher::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::sync::Arc;

use meshgopher::bot::GopherBot;
use meshgopher::config::Config;
use meshgopher::gopher::{GopherClient, GopherUrl, Listing};
use meshgopher::transport::{spawn_console_reader, ConsoleTransport};

#[derive(Parser)]
#[command(name = "meshgopher")]
#[command(about = "A Gopher browser for Meshtastic mesh networks, driven over direct messages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot with an interactive console transport
    ///
    /// Stdin lines are treated as direct messages from a local user and
    /// replies are printed to stdout. Wire a real Meshtastic link by
    /// embedding the library's GopherBot behind your own transport.
    Start,
    /// Initialize a new configuration file
    Init,
    /// Fetch a gopher URL once and print the parsed listing
    Fetch {
        /// Absolute gopher:// URL
        url: String,
        /// Print the parsed listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(c) => c,
                None => {
                    info!("no config file at {}; using defaults", cli.config);
                    Config::default()
                }
            };
            info!("Starting meshgopher v{}", env!("CARGO_PKG_VERSION"));

            let events = spawn_console_reader("console");
            let mut bot = GopherBot::new(config, Arc::new(ConsoleTransport));
            println!("meshgopher console. Type DM commands (u <url>, n, p, b, 0-9, s <terms>); Ctrl-D exits.");
            bot.run(events).await?;
        }
        Commands::Init => {
            info!("Initializing new meshgopher configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Fetch { url, json } => {
            let config = pre_config.unwrap_or_default();
            let client = GopherClient::new(&config.gopher);
            let parsed = GopherUrl::parse(&url, client.default_port())?;
            let listing = client.fetch(&parsed).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_listing(&listing);
            }
        }
    }

    Ok(())
}

fn print_listing(listing: &Listing) {
    match listing {
        Listing::Menu(items) => {
            for item in items {
                println!(
                    "[{}] {}\t{}\t{}:{}",
                    item.item_type.as_char(),
                    item.display,
                    item.selector,
                    item.host,
                    item.port
                );
            }
        }
        Listing::Text(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

            // If stdout is a terminal, mirror log lines to the console too;
            // when redirected (service mode) the file is the only sink.
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        } else {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
