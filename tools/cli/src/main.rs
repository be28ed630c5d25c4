//! ChainVault CLI - Command line interface for ledger-backed secrets.
//!
//! This tool stores, reads, rotates and deletes encrypted secrets kept on
//! a token ledger. Secrets are encrypted locally; the ledger only sees
//! ciphertext and an access tag.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

use chainvault_common::{SensitiveBytes, SiteAddress};
use chainvault_crypto::KdfParams;
use chainvault_ledger::{Address, MemoryLedger, TxReceipt};
use chainvault_vault::{VaultClient, VaultConfig, WalletAccount};

#[derive(Parser)]
#[command(name = "chainvault")]
#[command(about = "ChainVault - Encrypted secrets on a token ledger")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Signing account, overriding the configuration.
    #[arg(short, long, global = true)]
    account: Option<String>,

    /// KDF strength: "interactive", "moderate", or "sensitive".
    #[arg(short, long, global = true)]
    strength: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where a record lives.
#[derive(Args)]
struct RecordArgs {
    /// Token the record is stored under.
    #[arg(short, long)]
    token: u64,

    /// Site url.
    #[arg(short, long)]
    url: String,

    /// Username at the site.
    #[arg(short = 'l', long)]
    user: String,
}

impl RecordArgs {
    fn address(&self) -> SiteAddress {
        SiteAddress::new(self.token, self.url.as_str(), self.user.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new secret.
    Store {
        #[command(flatten)]
        record: RecordArgs,

        /// Read the secret from the first line of stdin.
        #[arg(long)]
        stdin: bool,
    },

    /// Print a stored secret.
    Get {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Replace a stored secret.
    Update {
        #[command(flatten)]
        record: RecordArgs,

        /// Read the secret from the first line of stdin.
        #[arg(long)]
        stdin: bool,
    },

    /// Delete a stored secret.
    Delete {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Show token collection information.
    Info,

    /// Run a store/read/update/delete cycle against an in-memory ledger.
    Demo,

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.command {
        Commands::Store { record, stdin } => {
            let client = connect(&cli)?;
            cmd_store(&client, record, *stdin).await
        }
        Commands::Get { record } => {
            let client = connect(&cli)?;
            cmd_get(&client, record).await
        }
        Commands::Update { record, stdin } => {
            let client = connect(&cli)?;
            cmd_update(&client, record, *stdin).await
        }
        Commands::Delete { record } => {
            let client = connect(&cli)?;
            cmd_delete(&client, record).await
        }
        Commands::Info => {
            let client = connect(&cli)?;
            cmd_info(&client).await
        }
        Commands::Demo => cmd_demo(&cli).await,
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "chainvault",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Build the effective configuration: defaults, file, environment, flags.
fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => match VaultConfig::default_path() {
            Some(path) if path.exists() => read_config(&path)?,
            _ => VaultConfig::default(),
        },
    };

    config
        .apply_env()
        .context("Invalid environment configuration")?;

    if let Some(account) = &cli.account {
        config.account = Some(account.clone());
    }
    if let Some(strength) = &cli.strength {
        config.kdf_params = KdfParams::from_preset(strength)
            .context("Invalid strength. Use: interactive, moderate, or sensitive")?;
    }

    Ok(config)
}

fn read_config(path: &Path) -> Result<VaultConfig> {
    VaultConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn connect(cli: &Cli) -> Result<VaultClient> {
    let config = load_config(cli)?;
    VaultClient::from_config(&config).context("Failed to set up vault client")
}

/// Prompt for the vault passphrase.
fn prompt_passphrase() -> Result<SensitiveBytes> {
    let passphrase = SensitiveBytes::from(
        rpassword::prompt_password("Vault passphrase: ").context("Failed to read passphrase")?,
    );
    if passphrase.is_empty() {
        anyhow::bail!("Passphrase cannot be empty");
    }
    Ok(passphrase)
}

/// Read the secret to store, from stdin or an interactive prompt.
fn read_secret(from_stdin: bool) -> Result<Zeroizing<String>> {
    if from_stdin {
        let mut line = Zeroizing::new(String::new());
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read secret from stdin")?;
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        return Ok(line);
    }

    let secret = Zeroizing::new(
        rpassword::prompt_password("Secret: ").context("Failed to read secret")?,
    );
    let confirm = Zeroizing::new(
        rpassword::prompt_password("Confirm secret: ").context("Failed to read secret")?,
    );
    if *secret != *confirm {
        anyhow::bail!("Secrets do not match");
    }
    Ok(secret)
}

fn print_receipt(action: &str, address: &SiteAddress, receipt: &TxReceipt) {
    println!("{} {}", action, address);
    println!("  Transaction: {}", receipt.hash);
    if let Some(block) = receipt.block_number {
        println!("  Block: {}", block);
    }
}

/// Store a new secret.
async fn cmd_store(client: &VaultClient, record: &RecordArgs, stdin: bool) -> Result<()> {
    let address = record.address();
    info!("Storing secret for {}", address);

    let passphrase = prompt_passphrase()?;
    let secret = read_secret(stdin)?;

    let receipt = client
        .create(&address, passphrase.as_bytes(), &secret)
        .await
        .context("Failed to store secret")?;

    print_receipt("Stored", &address, &receipt);
    Ok(())
}

/// Print a stored secret.
async fn cmd_get(client: &VaultClient, record: &RecordArgs) -> Result<()> {
    let address = record.address();
    let passphrase = prompt_passphrase()?;

    let secret = client
        .read(&address, passphrase.as_bytes())
        .await
        .context("Failed to read secret")?;

    println!("{}", secret.as_str());
    Ok(())
}

/// Replace a stored secret.
async fn cmd_update(client: &VaultClient, record: &RecordArgs, stdin: bool) -> Result<()> {
    let address = record.address();
    info!("Updating secret for {}", address);

    let passphrase = prompt_passphrase()?;
    let secret = read_secret(stdin)?;

    let receipt = client
        .update(&address, passphrase.as_bytes(), &secret)
        .await
        .context("Failed to update secret")?;

    print_receipt("Updated", &address, &receipt);
    Ok(())
}

/// Delete a stored secret.
async fn cmd_delete(client: &VaultClient, record: &RecordArgs) -> Result<()> {
    let address = record.address();
    info!("Deleting secret for {}", address);

    let passphrase = prompt_passphrase()?;

    let receipt = client
        .delete(&address, passphrase.as_bytes())
        .await
        .context("Failed to delete secret")?;

    print_receipt("Deleted", &address, &receipt);
    Ok(())
}

/// Show collection information.
async fn cmd_info(client: &VaultClient) -> Result<()> {
    let info = client
        .collection_info()
        .await
        .context("Failed to read collection information")?;

    println!("Collection Information:");
    println!("  Name: {}", info.name);
    println!("  Symbol: {}", info.symbol);
    println!("  Gateway: {}", client.gateway().name());
    match client.account() {
        Some(account) => println!("  Account: {}", account),
        None => println!("  Account: (none, read-only)"),
    }

    Ok(())
}

/// Exercise the full record lifecycle without a node.
async fn cmd_demo(cli: &Cli) -> Result<()> {
    let mut config = load_config(cli)?;
    config.gateway = "memory".to_string();
    if config.account.is_none() {
        config.account = Some(Address::repeat_byte(0x11).to_string());
    }

    let owner = WalletAccount::from_str(config.account.as_deref().unwrap_or_default())
        .context("Invalid account")?;
    let ledger = Arc::new(MemoryLedger::new());
    let token = ledger.mint(owner.address()).context("Failed to mint token")?;
    let client = VaultClient::new(&config, ledger.clone()).context("Failed to set up vault client")?;

    let address = SiteAddress::new(token, "example.com", "alice");
    let passphrase = b"corp-key";

    let receipt = client.create(&address, passphrase, "S3cr3t!").await?;
    print_receipt("Stored", &address, &receipt);
    println!("  Read back: {}", client.read(&address, passphrase).await?.as_str());

    let receipt = client.update(&address, passphrase, "N3wP@ss").await?;
    print_receipt("Updated", &address, &receipt);
    println!("  Read back: {}", client.read(&address, passphrase).await?.as_str());

    match client.read(&address, b"wrong-key").await {
        Err(e) => println!("Wrong passphrase: {}", e),
        Ok(_) => anyhow::bail!("Wrong passphrase was accepted"),
    }

    let receipt = client.delete(&address, passphrase).await?;
    print_receipt("Deleted", &address, &receipt);
    println!("Records left: {}", ledger.record_count()?);

    Ok(())
}
