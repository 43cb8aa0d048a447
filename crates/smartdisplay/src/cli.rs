//! Clap derive structures for the `smartdisplay` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

use smartdisplay_core::{ArmMode, Role};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// smartdisplay -- drive a smart display kiosk backend from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "smartdisplay",
    version,
    about = "Talk to a smart display kiosk backend from the command line",
    long_about = "Query and control a smart display backend: alarm panel, guest access,\n\
        home overview and role-filtered menus.\n\n\
        `watch` runs the same polling loop the kiosk UI uses and prints every\n\
        state change.",
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
    /// Backend profile to use
    #[arg(long, short = 'p', env = "SMARTDISPLAY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "SMARTDISPLAY_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SMARTDISPLAY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SMARTDISPLAY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in milliseconds (overrides profile)
    #[arg(long, env = "SMARTDISPLAY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Format Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Key/value table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one `key=value` per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with a 4-digit PIN
    Login(LoginArgs),

    /// Alarm panel state and actions
    Alarm(AlarmArgs),

    /// Guest access state and actions
    Guest(GuestArgs),

    /// Home overview state
    Home,

    /// Role-filtered menu
    Menu(MenuArgs),

    /// Poll every slice and print each state change
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Args)]
pub struct LoginArgs {
    /// PIN (exactly 4 digits)
    #[arg(long, env = "SMARTDISPLAY_PIN", hide_env_values = true)]
    pub pin: String,
}

impl std::fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginArgs").field("pin", &"[REDACTED]").finish()
    }
}

// ── Alarm ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlarmArgs {
    #[command(subcommand)]
    pub command: AlarmCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmCommand {
    /// Show the current alarm state
    State,

    /// Arm the alarm
    Arm {
        /// Arming mode
        mode: ArmModeArg,
    },

    /// Disarm the alarm
    Disarm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ArmModeArg {
    Home,
    Away,
    Night,
}

impl From<ArmModeArg> for ArmMode {
    fn from(arg: ArmModeArg) -> Self {
        match arg {
            ArmModeArg::Home => ArmMode::Home,
            ArmModeArg::Away => ArmMode::Away,
            ArmModeArg::Night => ArmMode::Night,
        }
    }
}

// ── Guest ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GuestArgs {
    #[command(subcommand)]
    pub command: GuestCommand,
}

#[derive(Debug, Subcommand)]
pub enum GuestCommand {
    /// Show the current guest state
    State,

    /// Request entry
    Request,

    /// Record that the guest left
    Exit,
}

// ── Menu ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MenuArgs {
    /// Role sent in `X-User-Role`
    #[arg(long, default_value = "guest")]
    pub role: RoleArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    User,
    Guest,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
            RoleArg::Guest => Role::Guest,
        }
    }
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period in milliseconds (overrides profile)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Exit after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration
    Show,

    /// Write a starter config with one `kiosk` profile
    Init {
        /// Backend URL for the profile
        #[arg(long, default_value = "http://127.0.0.1:8090")]
        url: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
