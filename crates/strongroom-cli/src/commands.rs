//! CLI command implementations

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use strongroom_core::{
    compile, compute_safe_transaction_hash, diff_policies, diff_whitelist, parse_hex, Address,
    CompileRequest, Operation, Policy, RecoveryDeployment, Uint256, WhitelistEntry,
};
use tracing::info;

use crate::config::{CliConfig, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::Printer;

/// Strongroom - Safe multisig transaction compiler
#[derive(Parser)]
#[command(name = "strongroom")]
#[command(about = "Compile vault changes into Safe transactions and signable hashes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to $STRONGROOM_CONFIG or the XDG config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Tracing filter, overrides the config file
    #[arg(long, global = true)]
    pub log_filter: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a backend request into a signable Safe transaction
    Compile {
        /// JSON request file
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Owner-manager calls turning one policy into another
    DiffPolicy {
        /// Current policy JSON file
        #[arg(long)]
        current: PathBuf,

        /// Target policy JSON file
        #[arg(long)]
        target: PathBuf,
    },

    /// Whitelist instructions reconciling the guard's list with a target
    DiffWhitelist {
        /// JSON array of currently whitelisted addresses, in list order
        #[arg(long)]
        current: PathBuf,

        /// JSON array of `{address, name}` destinations
        #[arg(long)]
        target: PathBuf,
    },

    /// EIP-712 hash of a Safe transaction
    Hash {
        #[arg(long)]
        chain_id: u64,

        /// Safe (verifying contract) address
        #[arg(long)]
        safe: Address,

        #[arg(long)]
        to: Address,

        /// Wei, decimal or 0x hex
        #[arg(long, default_value = "0")]
        value: Uint256,

        /// Call data (hex)
        #[arg(long, default_value = "0x")]
        data: String,

        #[arg(long, value_enum, default_value_t = OperationArg::Call)]
        operation: OperationArg,

        #[arg(long)]
        nonce: u64,
    },

    /// Predicted address of an organisation's recovery contract
    RecoveryAddress {
        /// Recovery deployment JSON file
        #[arg(long)]
        deployment: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Call,
    Delegatecall,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Call => Operation::Call,
            OperationArg::Delegatecall => Operation::DelegateCall,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Run a command, writing results to `out`
pub fn run<W: Write>(command: Commands, config: &CliConfig, out: W) -> Result<()> {
    let mut printer = Printer::new(out, config.output, config.hex_prefix);

    match command {
        Commands::Compile { request } => {
            let request: CompileRequest = read_json(&request)?;
            let compiled = compile(&request)?;
            info!(
                kind = request.kind(),
                safe = %compiled.safe,
                nonce = compiled.nonce,
                "compiled request"
            );
            printer.compiled(&compiled)?;
        }

        Commands::DiffPolicy { current, target } => {
            let current: Policy = read_json(&current)?;
            let target: Policy = read_json(&target)?;
            let diff = diff_policies(&current, &target)?;
            printer.policy_diff(&diff)?;
        }

        Commands::DiffWhitelist { current, target } => {
            let current: Vec<Address> = read_json(&current)?;
            let target: Vec<WhitelistEntry> = read_json(&target)?;
            let update = diff_whitelist(&current, &target)?;
            let resulting = update.apply(&current)?;
            printer.whitelist_update(&update, &resulting)?;
        }

        Commands::Hash {
            chain_id,
            safe,
            to,
            value,
            data,
            operation,
            nonce,
        } => {
            let data = parse_hex(&data)?;
            let hash = compute_safe_transaction_hash(
                chain_id,
                &safe,
                &to,
                value,
                &data,
                operation.into(),
                nonce,
            );
            printer.signable_hash(&hash)?;
        }

        Commands::RecoveryAddress { deployment } => {
            let deployment: RecoveryDeployment = read_json(&deployment)?;
            let address = deployment.address()?;
            info!(org = %deployment.org_name, %address, "derived recovery address");
            printer.address(&address)?;
        }
    }

    Ok(())
}

/// Merge command-line flags over the loaded configuration
pub fn effective_config(cli: &Cli) -> Result<CliConfig> {
    let path = cli.config.clone().or_else(CliConfig::default_path);
    let mut config = CliConfig::load_or_default(path.as_deref())?;
    if cli.json {
        config.output = OutputFormat::Json;
    }
    if let Some(filter) = &cli.log_filter {
        config.log_filter = filter.clone();
    }
    Ok(config)
}
