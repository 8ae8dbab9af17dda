//! ShowFolio CLI
//!
//! Command-line interface for ShowFolio - link-in-bio profiles, their
//! links and analytics.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use showfolio_core::{
    AuthError, Config, LinkDraft, LinkPatch, LocalAuth, Platform, ProfilePatch, Session, Store,
    Theme,
};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "showfolio")]
#[command(about = "ShowFolio - link-in-bio profiles from the command line")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage your profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage the links on a profile
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
    /// Open a public profile as a visitor (counts a view)
    View {
        /// Profile username
        username: String,
    },
    /// Follow a link on a public profile (counts a click)
    Click {
        /// Profile username
        username: String,
        /// Link ID (full UUID or prefix)
        link: String,
    },
    /// Show analytics for one of your profiles
    Analytics {
        /// Profile ID, ID prefix or username
        profile: String,
    },
    /// Show status (account, storage, counts)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Create an account
    Signup {
        email: String,
        #[arg(long, env = "SHOWFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign in
    Login {
        email: String,
        #[arg(long, env = "SHOWFOLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Request a reset token, or finish a reset with --token
    ResetPassword {
        /// Account email (to request a token)
        email: Option<String>,
        /// Token from an earlier request
        #[arg(long)]
        token: Option<String>,
        /// New password (with --token)
        #[arg(long, requires = "token")]
        new_password: Option<String>,
    },
    /// Show who is signed in
    Whoami,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create a new profile
    #[command(alias = "add")]
    Create {
        /// Profile title
        title: String,
        /// Public username (3-30 letters, numbers, _ or -)
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// light or dark
        #[arg(long)]
        theme: Option<Theme>,
        /// Profile image reference
        #[arg(long)]
        image: Option<String>,
    },
    /// List your profiles
    #[command(alias = "ls")]
    List,
    /// Show profile details
    Show {
        /// Profile ID, ID prefix or username
        profile: String,
    },
    /// Update profile fields
    Update {
        /// Profile ID, ID prefix or username
        profile: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_username")]
        username: Option<String>,
        /// Remove the public username
        #[arg(long)]
        clear_username: bool,
        /// light or dark
        #[arg(long)]
        theme: Option<Theme>,
        /// Show (true) or hide (false) the profile
        #[arg(long)]
        active: Option<bool>,
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,
        /// Remove the profile image
        #[arg(long)]
        clear_image: bool,
    },
    /// Delete a profile with its links and analytics
    #[command(alias = "rm")]
    Delete {
        /// Profile ID, ID prefix or username
        profile: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check whether a username is available
    CheckUsername { username: String },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Add a link at the end of a profile
    Add {
        /// Profile ID, ID prefix or username
        profile: String,
        title: String,
        url: String,
        /// github, linkedin, twitter, facebook, youtube, instagram, tiktok, medium,
        /// dev.to or custom
        #[arg(short, long, default_value = "custom")]
        platform: Platform,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Update a link
    Update {
        /// Profile ID, ID prefix or username
        profile: String,
        /// Link ID (full UUID or prefix)
        link: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(short, long)]
        platform: Option<Platform>,
        #[arg(long, conflicts_with = "clear_icon")]
        icon: Option<String>,
        /// Remove the icon
        #[arg(long)]
        clear_icon: bool,
    },
    /// Remove a link
    #[command(alias = "remove")]
    Rm {
        /// Profile ID, ID prefix or username
        profile: String,
        /// Link ID (full UUID or prefix)
        link: String,
    },
    /// Set the display order (list every link once)
    Reorder {
        /// Profile ID, ID prefix or username
        profile: String,
        /// Link IDs in the new order
        #[arg(required = true)]
        links: Vec<String>,
    },
    /// Show or hide a link
    Toggle {
        /// Profile ID, ID prefix or username
        profile: String,
        /// Link ID (full UUID or prefix)
        link: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, traffic_window_days, max_failed_logins)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            output.error(&user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_deref();

    // Config commands don't need the store
    let command = match cli.command {
        Commands::Config { command } => return handle_config_command(command, config_path, output),
        command => command,
    };

    let config = Config::load(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut auth = LocalAuth::open(&config).context("Failed to open account store")?;
    let session = Session::new(&auth);
    let mut store = Store::open_with_config(config).context("Failed to open profile store")?;

    match command {
        Commands::Auth { command } => handle_auth_command(command, &mut auth, &session, output),
        Commands::Profile { command } => {
            handle_profile_command(command, &mut store, &session, output)
        }
        Commands::Link { command } => handle_link_command(command, &mut store, &session, output),
        Commands::View { username } => commands::visit::view(&mut store, username, output),
        Commands::Click { username, link } => {
            commands::visit::click(&mut store, username, link, output)
        }
        Commands::Analytics { profile } => {
            let owner = session.require()?;
            commands::analytics::show(&store, &owner, profile, output)
        }
        Commands::Status => commands::status::show(&store, &session, output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_auth_command(
    command: AuthCommands,
    auth: &mut LocalAuth,
    session: &Session,
    output: &Output,
) -> Result<()> {
    match command {
        AuthCommands::Signup {
            email,
            password,
            name,
        } => commands::auth::signup(auth, email, password, name, output),
        AuthCommands::Login { email, password } => {
            commands::auth::login(auth, email, password, output)
        }
        AuthCommands::Logout => commands::auth::logout(auth, output),
        AuthCommands::ResetPassword {
            email,
            token,
            new_password,
        } => commands::auth::reset_password(auth, email, token, new_password, output),
        AuthCommands::Whoami => commands::auth::whoami(session, output),
    }
}

fn handle_profile_command(
    command: ProfileCommands,
    store: &mut Store,
    session: &Session,
    output: &Output,
) -> Result<()> {
    // Username checks are open to anyone
    if let ProfileCommands::CheckUsername { username } = command {
        return commands::profile::check_username(store, username, output);
    }

    let owner = session.require()?;
    match command {
        ProfileCommands::Create {
            title,
            username,
            description,
            theme,
            image,
        } => commands::profile::create(
            store,
            &owner,
            commands::profile::CreateArgs {
                title,
                username,
                description,
                theme,
                image,
            },
            output,
        ),
        ProfileCommands::List => commands::profile::list(store, &owner, output),
        ProfileCommands::Show { profile } => {
            commands::profile::show(store, &owner, profile, output)
        }
        ProfileCommands::Update {
            profile,
            title,
            description,
            username,
            clear_username,
            theme,
            active,
            image,
            clear_image,
        } => {
            let patch = ProfilePatch {
                title,
                description,
                username: clearable(username, clear_username),
                theme,
                is_active: active,
                profile_image: clearable(image, clear_image),
            };
            commands::profile::update(store, &owner, profile, patch, output)
        }
        ProfileCommands::Delete { profile, yes } => {
            commands::profile::delete(store, &owner, profile, yes, output)
        }
        ProfileCommands::CheckUsername { .. } => unreachable!(), // Handled above
    }
}

fn handle_link_command(
    command: LinkCommands,
    store: &mut Store,
    session: &Session,
    output: &Output,
) -> Result<()> {
    let owner = session.require()?;
    match command {
        LinkCommands::Add {
            profile,
            title,
            url,
            platform,
            icon,
        } => {
            let mut draft = LinkDraft::new(title, url, platform);
            draft.icon = icon;
            commands::link::add(store, &owner, profile, draft, output)
        }
        LinkCommands::Update {
            profile,
            link,
            title,
            url,
            platform,
            icon,
            clear_icon,
        } => {
            let patch = LinkPatch {
                title,
                url,
                platform,
                icon: clearable(icon, clear_icon),
                is_active: None,
            };
            commands::link::update(store, &owner, profile, link, patch, output)
        }
        LinkCommands::Rm { profile, link } => {
            commands::link::remove(store, &owner, profile, link, output)
        }
        LinkCommands::Reorder { profile, links } => {
            commands::link::reorder(store, &owner, profile, links, output)
        }
        LinkCommands::Toggle { profile, link } => {
            commands::link::toggle(store, &owner, profile, link, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Map a value/clear flag pair onto a patch field
fn clearable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

/// The one-line notification shown for a failed command
///
/// Core and provider errors carry their own user-facing text; anything
/// else shows its outermost context.
fn user_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<showfolio_core::Error>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<AuthError>() {
        return e.to_string();
    }
    err.to_string()
}

/// Send logs to a file when SHOWFOLIO_LOG is set
fn init_logging(config: &Config) {
    // Only log if SHOWFOLIO_LOG is set
    let Ok(log_level) = std::env::var("SHOWFOLIO_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "showfolio_core={},showfolio={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("logging initialized to {:?}", log_path);
}
