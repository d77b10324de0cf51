//! Clap derive structures for the `netdash` CLI.
//!
//! Defines the command tree, global flags, and shared value types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netdash -- live operations dashboard for DHCP-managed network devices
#[derive(Debug, Parser)]
#[command(
    name = "netdash",
    version,
    about = "Watch device and task status and submit DHCP configurations",
    long_about = "Terminal client for the network operations server.\n\n\
        `watch` follows the server's real-time channel and keeps the device\n\
        table, task list and connection state current; `submit` queues a DHCP\n\
        pool configuration for a set of devices.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "NETDASH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "NETDASH_SERVER", global = true)]
    pub server: Option<String>,

    /// When to use color output [default: config `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NETDASH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NETDASH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Follow live device, task and connection status
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Submit a DHCP pool configuration
    Submit(SubmitArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Do not open the real-time channel
    #[arg(long)]
    pub no_realtime: bool,

    /// Do not request a device snapshot after connecting
    #[arg(long)]
    pub no_snapshot: bool,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Comma-separated device ids
    #[arg(long)]
    pub device_ids: String,

    /// DHCP pool name
    #[arg(long)]
    pub pool_name: String,

    /// Network address (e.g. 10.1.2.0)
    #[arg(long)]
    pub network: String,

    /// Subnet mask (e.g. 255.255.255.0)
    #[arg(long)]
    pub mask: String,

    /// Default gateway
    #[arg(long, default_value = "")]
    pub gateway: String,

    /// DNS server
    #[arg(long, default_value = "")]
    pub dns: String,

    /// Domain name
    #[arg(long, default_value = "")]
    pub domain: String,

    /// Lease time in days
    #[arg(long, default_value = "")]
    pub lease_days: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
