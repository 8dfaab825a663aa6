//! prof-cycle - Rotate profile icons and headers from local image pools

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libprofcycle::accounts::AccountStore;
use libprofcycle::logging::{LogFormat, LoggingConfig};
use libprofcycle::platforms::twitter::{Authorizer, TwitterSession};
use libprofcycle::{Config, ImageRole, ProfcycleError, ProfileUpdater};
use std::io::{BufRead, Write};

#[derive(Parser, Debug)]
#[command(name = "prof-cycle")]
#[command(about = "Rotate profile icons and headers from local image pools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (text, json, pretty)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Authorize an account with the PIN flow and write its profile
    Init {
        /// Account name
        account: String,
    },

    /// Print the account's home timeline
    Test {
        /// Account name
        account: String,

        /// Number of entries to fetch
        #[arg(short, long, default_value_t = 10)]
        count: u32,
    },

    /// Upload the next icon and/or header (both when no flag is given)
    Update {
        /// Account name
        account: String,

        /// Update the profile icon
        #[arg(long)]
        icon: bool,

        /// Update the profile header
        #[arg(long)]
        header: bool,
    },

    /// Print the path of the next image without uploading it
    Pick {
        /// Account name
        account: String,

        /// Which image to pick
        #[arg(value_enum)]
        role: RoleArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
    Icon,
    Header,
}

impl From<RoleArg> for ImageRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Icon => ImageRole::Icon,
            RoleArg::Header => ImageRole::Header,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env(cli.verbose);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    logging.init();

    match run(cli.command).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<ProfcycleError>()
        .map(ProfcycleError::exit_code)
        .unwrap_or(1)
}

async fn run(command: Commands) -> Result<i32> {
    let config = Config::load()?;
    let store = AccountStore::new(config.accounts_dir());

    match command {
        Commands::Init { account } => init(&config, &store, &account).await,
        Commands::Test { account, count } => test(&config, &store, &account, count).await,
        Commands::Update {
            account,
            icon,
            header,
        } => {
            let roles = match (icon, header) {
                (true, false) => vec![ImageRole::Icon],
                (false, true) => vec![ImageRole::Header],
                _ => vec![ImageRole::Icon, ImageRole::Header],
            };
            update(&config, &store, &account, &roles).await
        }
        Commands::Pick { account, role } => pick(&config, &store, &account, role.into()),
    }
}

async fn init(config: &Config, store: &AccountStore, name: &str) -> Result<i32> {
    store.ensure_not_initialized(name)?;

    let authorizer = Authorizer::new(&config.api)?;
    let pending = authorizer.request_authorization().await?;

    println!("Open the following URL and authorize the application:");
    println!("  {}", pending.authorize_url);
    print!("PIN: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut pin = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut pin)
        .context("Failed to read PIN from stdin")?;

    let access = authorizer.complete_authorization(&pending, &pin).await?;
    let account = store.initialize(name, &access)?;

    println!(
        "Account '{}' initialized: {}",
        name,
        account.profile_path().display()
    );
    Ok(0)
}

fn session_for(
    config: &Config,
    store: &AccountStore,
    name: &str,
) -> Result<ProfileUpdater<TwitterSession>> {
    let account = store.open(name)?;
    let access = account.require_profile()?.access_token();
    let session = TwitterSession::authorized(&config.api, access)?;
    Ok(ProfileUpdater::new(account, session))
}

async fn test(config: &Config, store: &AccountStore, name: &str, count: u32) -> Result<i32> {
    let updater = session_for(config, store, name)?;
    for entry in updater.get_timeline(count).await? {
        println!("{}", entry);
    }
    Ok(0)
}

async fn update(
    config: &Config,
    store: &AccountStore,
    name: &str,
    roles: &[ImageRole],
) -> Result<i32> {
    let mut updater = session_for(config, store, name)?;
    let report = updater.update(roles).await;

    for (role, outcome) in &report.outcomes {
        match outcome {
            Ok(receipt) => println!("{}: {}", role, receipt.image.display()),
            Err(e) => eprintln!("Error: {}: {}", role, e),
        }
    }

    Ok(report.exit_code())
}

fn pick(config: &Config, store: &AccountStore, name: &str, role: ImageRole) -> Result<i32> {
    let mut updater = session_for(config, store, name)?;
    let image = updater.pick(role)?;
    println!("{}", image.display());
    Ok(0)
}
