//! Clap derive structures for the `digiprobe` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// digiprobe -- network quality probe for field technicians
#[derive(Debug, Parser)]
#[command(
    name = "digiprobe",
    version,
    about = "Measure and classify network quality from the command line",
    long_about = "Runs ping, download, upload, browsing and video MOS probes,\n\
        classifies each run into a quality category, and records the results\n\
        to a session store.\n\n\
        Static mode takes five runs at one location; drive mode keeps\n\
        measuring until interrupted with Ctrl-C.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "DIGIPROBE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Result store URL (overrides profile)
    #[arg(long, env = "DIGIPROBE_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Result store API key
    #[arg(long, env = "DIGIPROBE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Base URL of an httpbin-style probe target (overrides profile endpoints)
    #[arg(long, env = "DIGIPROBE_PROBE_BASE", global = true)]
    pub probe_base: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DIGIPROBE_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "DIGIPROBE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DIGIPROBE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// Run a measurement sequence and record it as a session
    #[command(alias = "r")]
    Run(RunArgs),

    /// Show the public IP and ISP of the current connection
    #[command(alias = "id")]
    Identity,

    /// Classify a set of metrics into a quality category
    Classify(ClassifyArgs),

    /// Show the map marker glyph for an operator label
    Glyph {
        /// Operator label, e.g. "PT Telkomsel"
        label: String,
    },

    /// List results recorded in a session
    Results(ResultsArgs),

    /// List recent sessions
    Sessions {
        /// Maximum number of sessions
        #[arg(long, short = 'l', default_value = "20")]
        limit: usize,
    },

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Five runs at one point of interest
    Static,
    /// Continuous runs while moving, until Ctrl-C
    Drive,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Operator label, e.g. "Telkomsel" or "Starlink"
    #[arg(long)]
    pub operator: String,

    /// Test mode
    #[arg(long, short = 'm', default_value = "static")]
    pub mode: ModeArg,

    /// Point of interest name (required for static mode)
    #[arg(long)]
    pub poi: Option<String>,

    /// Activity tag, e.g. "streaming"
    #[arg(long, default_value = "")]
    pub activity: String,

    /// Free-form remark
    #[arg(long, default_value = "")]
    pub remark: String,

    /// Fixed position attached to samples, as "LAT,LNG"
    #[arg(long, value_name = "LAT,LNG")]
    pub position: Option<String>,

    /// Skip the public IP / ISP lookup
    #[arg(long)]
    pub offline: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLASSIFY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Ping in milliseconds
    #[arg(long)]
    pub ping: f64,

    /// Download throughput in Mbps
    #[arg(long)]
    pub download: f64,

    /// Video MOS (1.0 to 5.0)
    #[arg(long)]
    pub mos: f64,

    /// Upload throughput in Mbps
    #[arg(long, default_value = "0")]
    pub upload: f64,

    /// Browsing time in milliseconds
    #[arg(long, default_value = "0")]
    pub browsing: f64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESULTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ResultsView {
    /// One row per result
    #[default]
    List,
    /// Map markers (results with a position)
    Markers,
    /// Trend series for charting
    Trend,
}

#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Session ID
    pub session: String,

    /// How to present the results
    #[arg(long, default_value = "list")]
    pub view: ResultsView,

    /// Operator label used for marker glyphs
    #[arg(long, default_value = "")]
    pub operator: String,
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

    /// Set a value on the active profile
    Set {
        /// Profile key, e.g. "store_url" or "download_url"
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

    /// Store the result store API key in the system keyring
    SetKey {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
