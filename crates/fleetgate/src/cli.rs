//! Clap derive structures for the `fleetgate` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fleetgate -- command-line client for the fleet management API
#[derive(Debug, Parser)]
#[command(
    name = "fleetgate",
    version,
    about = "Manage a fleet rental backend from the command line",
    long_about = "Browse and edit users, customers, cars, drivers, rents, damages,\n\
        notifications and payments through an authenticated, cached API gateway.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config profile to use
    #[arg(long, short = 'p', env = "FLEETGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "FLEETGATE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Username or email (overrides profile)
    #[arg(long, env = "FLEETGATE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password (prefer the keyring or FLEETGATE_PASSWORD)
    #[arg(long, env = "FLEETGATE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLEETGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FLEETGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check credentials against the API
    Login,

    /// Manage back-office users
    Users(ResourceArgs),

    /// Manage customers
    #[command(alias = "cu")]
    Customers(ResourceArgs),

    /// Manage the car fleet
    Cars(ResourceArgs),

    /// Manage drivers
    Drivers(ResourceArgs),

    /// Manage rents
    Rents(RentsArgs),

    /// Manage damage reports
    Damages(ResourceArgs),

    /// View and acknowledge notifications
    #[command(alias = "notif")]
    Notifications(NotificationsArgs),

    /// Manage payments
    Payments(ResourceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESOURCES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

/// Operations every resource supports.
#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List all records, newest first
    #[command(alias = "ls")]
    List,

    /// Show one record
    Get {
        /// Record id
        id: String,
    },

    /// Create a record from a JSON body
    Create(BodyArgs),

    /// Patch a record with a JSON body
    Update {
        /// Record id
        id: String,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// Delete one or more records
    #[command(alias = "rm")]
    Delete {
        /// Record ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct BodyArgs {
    /// Inline JSON body
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RentsArgs {
    #[command(subcommand)]
    pub command: RentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RentsCommand {
    #[command(flatten)]
    Common(ResourceCommand),

    /// Close a running rent
    Close {
        /// Rent id
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    #[command(flatten)]
    Common(ResourceCommand),

    /// Mark notifications as read (all of them when no id is given)
    MarkRead {
        /// Notification ids
        ids: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (e.g., "base_url", "username", "timeout")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
