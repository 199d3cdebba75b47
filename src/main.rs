use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ovpn-fulltunnel")]
#[command(about = "Force all traffic through an OpenVPN tunnel without dropping SSH")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file overriding the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the network, ingest a VPN config, and install policy routing
    Setup {
        /// Filename for the VPN config (.ovpn or .conf); prompted for if omitted
        #[arg(short, long)]
        name: Option<String>,

        /// Read the VPN config body from a file instead of standard input
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show what the last setup run configured
    Status,
    /// Generate default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging goes to stderr so a piped VPN config on stdin stays clean
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ovpn_fulltunnel::Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Setup { name, input } => {
            let opts = ovpn_fulltunnel::setup::SetupOptions { name, input };
            match ovpn_fulltunnel::setup::run(&config, &opts) {
                Ok(state) => {
                    info!("Setup completed successfully");
                    println!("VPN config: {}", state.config_path.display());
                    println!("Hook scripts: {}", state.up_script.display());
                    println!("              {}", state.down_script.display());
                    println!(
                        "Start the tunnel with: systemctl start openvpn-client@{}",
                        state.service
                    );
                }
                Err(e) => {
                    error!("Setup failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Status => {
            match ovpn_fulltunnel::SetupState::load(&config.paths.state_file) {
                Ok(Some(state)) => {
                    println!("Last setup: {}", state.service);
                    println!("  Config: {}", state.config_path.display());
                    println!("  Gateway: {}", state.gateway);
                    println!("  Interface: {}", state.interface);
                    println!("  Up hook: {}", state.up_script.display());
                    println!("  Down hook: {}", state.down_script.display());
                }
                Ok(None) => println!("No setup recorded"),
                Err(e) => println!("Error reading state: {}", e),
            }
        }
        Commands::Init => {
            info!("Generating default config...");
            let defaults = ovpn_fulltunnel::Config::default();
            let path = PathBuf::from("ovpn-fulltunnel.toml");
            defaults.save(&path)?;
            println!("Created default config: ovpn-fulltunnel.toml");
        }
    }

    Ok(())
}
