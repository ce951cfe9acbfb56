//! Clap derive structures for the `vexim` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vexim -- move Cisco SD-WAN configuration between vManage controllers
#[derive(Debug, Parser)]
#[command(
    name = "vexim",
    version,
    about = "Export and import Cisco SD-WAN vManage configuration",
    long_about = "Exports policies and templates from one vManage controller into an\n\
        archive, and imports them into another. Every cross-object reference is\n\
        re-pointed at the ids the target controller assigns.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "VEXIM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "VEXIM_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "VEXIM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Tenant to switch into on multi-tenant controllers
    #[arg(long, short = 't', env = "VEXIM_TENANT", global = true)]
    pub tenant: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VEXIM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VEXIM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VEXIM_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

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
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export policies and templates into an archive
    #[command(alias = "ex")]
    Export(ExportArgs),

    /// Import an archive, remapping every reference to the new ids
    #[command(alias = "im")]
    Import(ImportArgs),

    /// Delete configuration from the controller
    Clean(CleanArgs),

    /// Set vEdge certificate validity
    #[command(alias = "certs")]
    Certificates(CertificatesArgs),

    /// Send the vEdge certificate list to the controllers
    Push,

    /// Device template operations
    Templates(TemplatesArgs),

    /// vSmart policy operations
    Policies(PoliciesArgs),

    /// Manage vManage users
    Users(UsersArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EXPORT / IMPORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Archive to write (default: config_archive.tar.gz)
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Archive to read (default: config_archive.tar.gz)
    pub archive: Option<PathBuf>,

    /// Which part of the archive to import
    #[arg(long, short = 's', default_value = "all")]
    pub scope: ImportScopeArg,

    /// Record objects with unresolvable references as failed and continue
    #[arg(long)]
    pub skip_unresolved: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ImportScopeArg {
    /// Lists, definitions, policies and templates
    All,
    /// Lists, definitions and vEdge/vSmart policies
    Policies,
    /// Feature and device templates
    Templates,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLEAN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// What to delete
    #[arg(long, short = 's', default_value = "all")]
    pub scope: CleanScopeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CleanScopeArg {
    /// Templates and policies
    All,
    /// vEdge/vSmart policies, definitions and lists
    Policies,
    /// Device and feature templates
    Templates,
    /// Deactivate, detach, invalidate certificates, push, delete devices
    Devices,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LIFECYCLE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CertificatesArgs {
    #[command(subcommand)]
    pub command: CertificatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CertificatesCommand {
    /// Mark every vEdge certificate valid
    Validate,
    /// Mark every vEdge certificate invalid
    Invalidate,
}

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// Move every attached device back to CLI mode
    Detach,
}

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoliciesCommand {
    /// Deactivate every activated vSmart policy
    Deactivate,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// Change a user's password (prompts for the new one)
    Password {
        /// User to update
        username: String,
    },

    /// Create a user (prompts for the password)
    Add {
        /// Login name
        username: String,

        /// User group, e.g. netadmin
        #[arg(long, short = 'g')]
        group: String,

        /// Full name or description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
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

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "controller", "tenant", "cooldown")
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
