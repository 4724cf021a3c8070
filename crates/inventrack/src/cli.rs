//! Clap derive structures for the `inventrack` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// inventrack -- manage products, suppliers and your profile from a terminal
#[derive(Debug, Parser)]
#[command(
    name = "inventrack",
    version,
    about = "Manage InvenTrack inventory from the command line",
    long_about = "A command-line client for the InvenTrack inventory service.\n\n\
        Every fetch is cached locally per profile, so `list --cached`\n\
        works without a network connection.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "INVENTRACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "INVENTRACK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory for cached snapshots (overrides profile)
    #[arg(long, env = "INVENTRACK_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "INVENTRACK_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "INVENTRACK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "INVENTRACK_TIMEOUT", global = true)]
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
    /// Manage products
    #[command(alias = "prod")]
    Products(ProductsArgs),

    /// Manage suppliers
    #[command(alias = "sup")]
    Suppliers(SuppliersArgs),

    /// View and edit your profile
    Profile(ProfileArgs),

    /// Sign in, sign out, and inspect the session
    Session(SessionArgs),

    /// Fetch products, suppliers and profile into the local cache
    Sync,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Shared arguments for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Render the locally cached snapshot without contacting the server
    #[arg(long)]
    pub cached: bool,

    /// Only show records whose name contains this text (case-insensitive)
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

/// Field overrides for edit commands.
#[derive(Debug, Args)]
pub struct EditArgs {
    /// Field assignment; the value is parsed as JSON, falling back to a string
    #[arg(long = "set", short = 's', value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// Read field values from a JSON object file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PRODUCTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProductsCommand {
    /// List products
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only show products at or below their reorder level
        #[arg(long)]
        low_stock: bool,
    },

    /// Show product details
    Get {
        /// Product ID
        id: String,
    },

    /// Create a product
    Add(ProductAddArgs),

    /// Edit a product; only changed fields are sent
    Edit {
        /// Product ID
        id: String,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ProductAddArgs {
    /// Product name
    #[arg(long, required_unless_present = "from_file")]
    pub name: Option<String>,

    /// Category
    #[arg(long)]
    pub category: Option<String>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Supplier ID
    #[arg(long)]
    pub supplier: Option<String>,

    /// Cost per unit
    #[arg(long, default_value = "0")]
    pub unit_cost: f64,

    /// Sale price per unit
    #[arg(long, default_value = "0")]
    pub unit_price: f64,

    /// Units on the shop floor
    #[arg(long, default_value = "0")]
    pub store_qty: u32,

    /// Units in the warehouse
    #[arg(long, default_value = "0")]
    pub warehouse_qty: u32,

    /// Reorder when total stock falls to this level
    #[arg(long, default_value = "0")]
    pub reorder_level: u32,

    /// Read the product from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with = "name")]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUPPLIERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SuppliersArgs {
    #[command(subcommand)]
    pub command: SuppliersCommand,
}

#[derive(Debug, Subcommand)]
pub enum SuppliersCommand {
    /// List suppliers
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show supplier details
    Get {
        /// Supplier ID
        id: String,
    },

    /// Create a supplier
    Add(SupplierAddArgs),

    /// Edit a supplier; only changed fields are sent
    Edit {
        /// Supplier ID
        id: String,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Delete a supplier
    #[command(alias = "rm")]
    Delete {
        /// Supplier ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct SupplierAddArgs {
    /// Supplier name
    #[arg(long, required_unless_present = "from_file")]
    pub name: Option<String>,

    /// Contact person
    #[arg(long)]
    pub contact_name: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,

    /// Postal address
    #[arg(long)]
    pub address: Option<String>,

    /// Read the supplier from a JSON file instead of flags
    #[arg(long, short = 'F', conflicts_with = "name")]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROFILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the signed-in user's profile
    Show {
        /// Render the locally cached profile without contacting the server
        #[arg(long)]
        cached: bool,
    },

    /// Edit profile fields; only changed fields are sent
    Edit(EditArgs),

    /// Upload a new avatar image
    UploadImage {
        /// Image file to upload
        path: PathBuf,

        /// MIME type (guessed from the file extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Verify credentials and optionally remember them
    Login {
        /// Account email (defaults to the profile's email)
        #[arg(long)]
        email: Option<String>,

        /// Store the password in the system keyring after a successful login
        #[arg(long)]
        save: bool,
    },

    /// Sign out and clear cached data for the profile
    Logout,

    /// Show the account the profile signs in as
    Whoami,
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

    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, email, password_env, ca_cert, insecure,
        /// timeout, storage_dir, loader_policy)
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
        /// Profile name (defaults to the active profile)
        name: Option<String>,
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
