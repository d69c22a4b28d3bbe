//! nwcctl - operator CLI for the NWC connection and budget engine.
//!
//! Opens the on-disk store named by the configuration, then runs one
//! administrative operation against it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nwc_authz::RegistrationRequest;
use nwc_crypto::RequestOrigin;

mod app;
mod commands;
mod config_bridge;
mod theme;

use commands::{authorize, config, connections, identity};
use theme::Theme;

/// nwcctl - manage wallet-connect connections and budgets
#[derive(Parser)]
#[command(name = "nwcctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to an explicit configuration file
    #[arg(short, long, global = true, env = "NWC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the permission catalog
    Permissions,

    /// List connections
    List {
        /// Include expired connections
        #[arg(long)]
        include_expired: bool,
        /// Apply due budget resets to the listing
        #[arg(long)]
        calculate_spent: bool,
    },

    /// Show one connection with its budgets
    Show {
        /// Client public key (64 hex characters)
        pubkey: String,
    },

    /// Register a connection for an existing client key
    Create {
        /// Client public key (64 hex characters)
        pubkey: String,
        #[command(flatten)]
        grant: GrantArgs,
    },

    /// Generate a client key, register it and print the pairing URL
    Pair {
        #[command(flatten)]
        grant: GrantArgs,
        #[command(flatten)]
        origin: OriginArgs,
    },

    /// Delete a connection
    Delete {
        /// Client public key (64 hex characters)
        pubkey: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Change the refresh window of a budget
    BudgetWindow {
        /// Client public key (64 hex characters)
        pubkey: String,
        /// Budget position, from zero
        index: usize,
        /// Seconds, or lifetime/daily/weekly/monthly/yearly
        window: String,
    },

    /// Authorize a capability, charging an amount against the budgets
    Authorize {
        /// Client public key (64 hex characters)
        pubkey: String,
        /// Capability key or method name (e.g. pay_invoice)
        capability: String,
        /// Amount in msats; 0 for commands that do not spend
        #[arg(default_value_t = 0)]
        amount: u64,
    },

    /// Generate a client identity and print its keys
    Identity,

    /// Show the provider identity and relay settings
    Provider,

    /// Print the pairing template
    Pairing {
        /// Substitute this client secret locally
        #[arg(long)]
        secret: Option<String>,
        #[command(flatten)]
        origin: OriginArgs,
    },

    /// Show configuration and stored provider settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration file values and their sources
    Show,
    /// Print one stored setting, or all
    Get {
        /// Setting key
        key: Option<String>,
    },
    /// Write key=value pairs
    Set {
        /// Pairs such as relay=wss://relay.example
        #[arg(required = true)]
        pairs: Vec<String>,
    },
}

#[derive(clap::Args)]
struct GrantArgs {
    /// Free-text label
    #[arg(short, long, default_value = "")]
    description: String,
    /// Permission key to grant; repeatable. Defaults to the catalog defaults.
    #[arg(short, long = "permission")]
    permissions: Vec<String>,
    /// Expiry as a unix timestamp; 0 never expires
    #[arg(short, long, default_value_t = 0)]
    expires_at: i64,
    /// Budget as MSATS:WINDOW; repeatable
    #[arg(short, long = "budget", value_parser = connections::parse_budget)]
    budgets: Vec<nwc_registry::BudgetSpec>,
}

#[derive(clap::Args)]
struct OriginArgs {
    /// Host the service is reached at, used to expand the local relay
    #[arg(long)]
    host: Option<String>,
    /// Scheme the service is reached with
    #[arg(long, default_value = "https")]
    scheme: String,
}

impl OriginArgs {
    fn origin(&self) -> Option<RequestOrigin> {
        self.host
            .as_ref()
            .map(|host| RequestOrigin::new(self.scheme.clone(), host.clone()))
    }
}

impl GrantArgs {
    fn into_request(self, api: &nwc_authz::NwcApi) -> RegistrationRequest {
        let permissions = if self.permissions.is_empty() {
            api.permissions()
                .into_iter()
                .filter(|p| p.default)
                .map(|p| p.key)
                .collect()
        } else {
            self.permissions
        };
        RegistrationRequest {
            permissions,
            description: self.description,
            expires_at: self.expires_at,
            budgets: self.budgets,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", Theme::error(&format!("{e:#}")));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let resolved = nwc_config::ServiceConfig::load(cli.config.as_deref())?;

    let mut log_config = config_bridge::to_log_config(&resolved.config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = nwc_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Commands::Config {
        command: ConfigCommands::Show,
    } = cli.command
    {
        return config::show_config(&resolved, cli.json);
    }
    if let Commands::Identity = cli.command {
        return identity::generate_client_identity(cli.json).await;
    }

    let api = app::open(&resolved).await?;
    let json = cli.json;

    match cli.command {
        Commands::Permissions => connections::list_permissions(&api, json),
        Commands::List {
            include_expired,
            calculate_spent,
        } => connections::list_connections(&api, include_expired, calculate_spent, json).await,
        Commands::Show { pubkey } => connections::show_connection(&api, &pubkey, json).await,
        Commands::Create { pubkey, grant } => {
            let request = grant.into_request(&api);
            connections::create_connection(&api, &pubkey, request, json).await
        },
        Commands::Pair { grant, origin } => {
            let request = grant.into_request(&api);
            identity::pair_new_client(&api, request, origin.origin().as_ref(), json).await
        },
        Commands::Delete { pubkey, yes } => connections::delete_connection(&api, &pubkey, yes).await,
        Commands::BudgetWindow {
            pubkey,
            index,
            window,
        } => connections::set_budget_window(&api, &pubkey, index, &window).await,
        Commands::Authorize {
            pubkey,
            capability,
            amount,
        } => authorize::authorize(&api, &pubkey, &capability, amount, json).await,
        Commands::Provider => identity::show_provider(&api).await,
        Commands::Pairing { secret, origin } => {
            identity::show_pairing(&api, origin.origin().as_ref(), secret.as_deref()).await
        },
        Commands::Config { command } => match command {
            ConfigCommands::Get { key } => config::get_settings(&api, key.as_deref(), json).await,
            ConfigCommands::Set { pairs } => config::set_settings(&api, &pairs).await,
            ConfigCommands::Show => Ok(()),
        },
        Commands::Identity => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_parses_repeated_budgets() {
        let cli = Cli::try_parse_from([
            "nwcctl",
            "create",
            &"ab".repeat(32),
            "-p",
            "pay",
            "-b",
            "100000:daily",
            "-b",
            "1000000",
        ])
        .unwrap();
        let Commands::Create { grant, .. } = cli.command else {
            panic!("expected create");
        };
        assert_eq!(grant.permissions, vec!["pay"]);
        assert_eq!(grant.budgets.len(), 2);
        assert_eq!(grant.budgets[0].refresh_window, 86_400);
        assert_eq!(grant.budgets[1].refresh_window, 0);
    }

    #[test]
    fn test_authorize_amount_defaults_to_zero() {
        let cli = Cli::try_parse_from(["nwcctl", "authorize", &"ab".repeat(32), "get_balance"])
            .unwrap();
        assert!(matches!(cli.command, Commands::Authorize { amount: 0, .. }));

        let cli = Cli::try_parse_from([
            "nwcctl",
            "authorize",
            &"ab".repeat(32),
            "pay_invoice",
            "40000",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Authorize { amount: 40_000, .. }));
    }

    #[test]
    fn test_config_set_requires_pairs() {
        assert!(Cli::try_parse_from(["nwcctl", "config", "set"]).is_err());
        assert!(Cli::try_parse_from(["nwcctl", "config", "set", "relay=wss://r.example"]).is_ok());
    }
}
