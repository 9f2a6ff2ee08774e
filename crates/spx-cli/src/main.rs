use anyhow::Result;
use clap::{Parser, Subcommand};
use spx_config::ValueType;

mod commands;

#[derive(Parser)]
#[command(name = "spx")]
#[command(about = "Realm-scoped bean lookup tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overlays)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the realm names visible from a realm
    Visible {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Realm id (defaults to context_realm from config)
        #[arg(long)]
        realm: Option<String>,
    },

    /// List the beans visible from a realm, in declaration order
    Beans {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        /// Realm id (defaults to context_realm from config; none => no filtering)
        #[arg(long)]
        realm: Option<String>,
    },

    /// Convert a string with a basic converter
    Convert {
        /// Target type: byte | short | int
        #[arg(long = "type")]
        value_type: ValueType,

        /// Value in decimal, hex (0x / #) or octal (leading 0)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

fn main() -> Result<()> {
    // Load .env.local if present (dev convenience, e.g. RUST_LOG).
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = spx_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Visible {
            config_paths,
            realm,
        } => commands::lookup::visible(&config_paths, realm)?,

        Commands::Beans {
            config_paths,
            realm,
        } => commands::lookup::beans(&config_paths, realm)?,

        Commands::Convert { value_type, value } => commands::convert::convert(value_type, &value)?,
    }

    Ok(())
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
