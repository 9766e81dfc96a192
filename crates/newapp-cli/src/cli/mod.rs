//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use clap::{Args, Parser, Subcommand, ValueEnum};

use newapp_core::domain::BuildStrategy;

pub mod global;
pub use global::{GlobalArgs, LogFormat, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "newapp",
    bin_name = "newapp",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Build and deploy artifacts from images, templates and source code",
    long_about = "newapp resolves images, templates and source repositories into a \
                  wired set of image trackers, builds, deployments and services.",
    after_help = "EXAMPLES:\n\
        \x20 newapp generate mysql MYSQL_USER=user MYSQL_PASSWORD=pass\n\
        \x20 newapp generate ruby~https://github.com/openshift/ruby-hello-world.git\n\
        \x20 newapp generate . --strategy docker --to myapp\n\
        \x20 newapp build --dockerfile 'FROM centos:7' --to custom\n\
        \x20 newapp search ruby",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve components and emit build, deploy and service artifacts.
    #[command(
        visible_alias = "new-app",
        about = "Generate artifacts for an application",
        after_help = "EXAMPLES:\n\
            \x20 newapp generate mysql                          # deploy an image\n\
            \x20 newapp generate ruby~./src                     # build ./src on ruby\n\
            \x20 newapp generate mysql+redis --name store       # one deployment, two containers\n\
            \x20 newapp generate mysql-ephemeral -p MYSQL_USER=u # instantiate a template\n\
            \x20 newapp generate . --to-docker --to registry.example.com/me/app"
    )]
    Generate(GenerateArgs),

    /// Like `generate`, but only emits build artifacts.
    #[command(
        visible_alias = "new-build",
        about = "Generate build artifacts only",
        after_help = "EXAMPLES:\n\
            \x20 newapp build ./src --strategy docker --to myimage\n\
            \x20 newapp build --dockerfile 'FROM centos:7\\nRUN yum install -y httpd' --to httpd\n\
            \x20 newapp build ruby~./src --no-output"
    )]
    Build(GenerateArgs),

    /// Search the catalog without generating anything.
    #[command(
        about = "Search images and templates",
        after_help = "EXAMPLES:\n\
            \x20 newapp search ruby\n\
            \x20 newapp search mysql postgresql --output-format json"
    )]
    Search(SearchArgs),

    /// Initialise a newapp configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 newapp init           # default location\n\
            \x20 newapp init --local   # .newapp.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 newapp completions bash > ~/.local/share/bash-completion/completions/newapp\n\
            \x20 newapp completions zsh  > ~/.zfunc/_newapp\n\
            \x20 newapp completions fish > ~/.config/fish/completions/newapp.fish"
    )]
    Completions(CompletionsArgs),

    /// Manage the newapp configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 newapp config get defaults.strategy\n\
            \x20 newapp config set defaults.insecure_registry true\n\
            \x20 newapp config list"
    )]
    Config(ConfigCommands),
}

// ── generate / build ──────────────────────────────────────────────────────────

/// Arguments shared by `newapp generate` and `newapp build`.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Images, templates, source locations or KEY=VALUE pairs.
    #[arg(value_name = "ARG", help = "Components, source code or environment")]
    pub arguments: Vec<String>,

    #[arg(
        long = "image",
        visible_alias = "docker-image",
        value_name = "IMAGE",
        value_delimiter = ',',
        help = "Image to use (resolved against images only)"
    )]
    pub images: Vec<String>,

    #[arg(
        long = "template",
        value_name = "TEMPLATE",
        value_delimiter = ',',
        help = "Template to instantiate"
    )]
    pub templates: Vec<String>,

    #[arg(
        long = "code",
        value_name = "LOCATION",
        value_delimiter = ',',
        help = "Source code location (local directory or repository URL)"
    )]
    pub code: Vec<String>,

    #[arg(
        long = "group",
        value_name = "A+B",
        help = "Components to deploy together, joined with '+'"
    )]
    pub groups: Vec<String>,

    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", help = "Environment variable")]
    pub env: Vec<String>,

    #[arg(long = "build-env", value_name = "KEY=VALUE", help = "Environment variable for builds")]
    pub build_env: Vec<String>,

    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", help = "Template parameter")]
    pub params: Vec<String>,

    #[arg(
        short = 'l',
        long = "labels",
        value_name = "KEY=VALUE",
        value_delimiter = ',',
        help = "Labels applied to every artifact"
    )]
    pub labels: Vec<String>,

    #[arg(long = "name", value_name = "NAME", help = "Name for the generated artifacts")]
    pub name: Option<String>,

    #[arg(long = "strategy", value_enum, value_name = "STRATEGY", help = "Build strategy")]
    pub strategy: Option<StrategyArg>,

    /// Literal Dockerfile content, or `-` to read it from stdin.
    #[arg(short = 'D', long = "dockerfile", value_name = "CONTENT", help = "Dockerfile content ('-' for stdin)")]
    pub dockerfile: Option<String>,

    #[arg(long = "context-dir", value_name = "DIR", help = "Directory within the source to build")]
    pub context_dir: Option<String>,

    #[arg(long = "to", value_name = "REF", help = "Output image reference")]
    pub to: Option<String>,

    #[arg(long = "to-docker", help = "Push the output to a registry instead of a tracker")]
    pub to_docker: bool,

    #[arg(long = "no-output", help = "Build without pushing the result")]
    pub no_output: bool,

    #[arg(long = "build-secret", value_name = "NAME[:DEST]", help = "Secret mounted into builds")]
    pub build_secrets: Vec<String>,

    #[arg(long = "source-image", value_name = "IMAGE", help = "Image to copy build sources from")]
    pub source_image: Option<String>,

    #[arg(
        long = "source-image-path",
        value_name = "SRC:DEST",
        help = "Path to copy out of the source image"
    )]
    pub source_image_paths: Vec<String>,

    #[arg(long = "insecure-registry", help = "Allow images from insecure registries")]
    pub insecure_registry: bool,

    #[arg(long = "allow-missing-images", help = "Use images that cannot be found as given")]
    pub allow_missing_images: bool,
}

/// Build strategies selectable with `--strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Inject source into a builder image.
    #[value(aliases = ["sti", "s2i"])]
    Source,
    /// Run a Dockerfile.
    Docker,
}

impl From<StrategyArg> for BuildStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Source => BuildStrategy::Source,
            StrategyArg::Docker => BuildStrategy::Docker,
        }
    }
}

// ── search ────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(value_name = "TERM", required = true, help = "Terms to search for")]
    pub terms: Vec<String>,

    #[arg(long = "limit", value_name = "N", help = "Show at most N matches")]
    pub limit: Option<usize>,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `newapp init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.newapp.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,

    /// Ask for the defaults instead of writing the built-in ones.
    #[arg(short = 'i', long = "interactive", help = "Choose defaults interactively")]
    pub interactive: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `newapp completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `newapp config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.strategy`.
        key: String,
    },
    /// Set a configuration key to a value.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
