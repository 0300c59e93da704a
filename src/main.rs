use anyhow::Result;
use clap::Parser;
use pacrs::commands::{self, Config, ConfigOverrides, UpgradeOptions};
use pacrs::runtime::RealRuntime;
use std::path::PathBuf;

/// pacrs - a pacman front end with AUR support
///
/// Official packages are handled by pacman; anything else is looked up in
/// the AUR, built with makepkg and installed along with its AUR
/// dependencies. Arguments after `--` are passed through to pacman.
///
/// Examples:
///   pacrs S yay           # Install yay and its dependencies
///   pacrs Su --upvcs      # Upgrade everything, rebuilding VCS packages
///   pacrs Ss -q helper    # Search names only
#[derive(Parser, Debug)]
#[command(author, version = env!("PACRS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Staging directory for AUR builds (defaults to <tmp>/pacrs-<uid>)
    #[arg(long = "tmp-dir", env = "PACRS_TMPDIR", value_name = "PATH", global = true)]
    pub tmp_dir: Option<PathBuf>,

    /// AUR base URL (defaults to https://aur.archlinux.org)
    #[arg(long = "aur-url", env = "PACRS_AUR_URL", value_name = "URL", global = true)]
    pub aur_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install packages from the repositories or the AUR
    #[command(alias = "S")]
    Install(InstallArgs),

    /// Show details about packages, including AUR packages
    #[command(alias = "Si")]
    Info(InfoArgs),

    /// Search the repositories and the AUR
    #[command(alias = "Ss")]
    Search(SearchArgs),

    /// Upgrade the system, then AUR packages
    #[command(alias = "Su")]
    Upgrade(UpgradeArgs),

    /// Clean pacman's cache and the staging directory
    #[command(alias = "Scc")]
    Clean,

    /// Download and extract AUR source snapshots into the current directory
    #[command(alias = "G")]
    Get(GetArgs),

    /// Run makepkg on ./PKGBUILD, installing AUR dependencies with -s
    #[command(alias = "M")]
    Make(MakeArgs),

    /// Show details about local PKGBUILDs
    #[command(name = "make-info", alias = "Mi")]
    MakeInfo(MakeInfoArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Options for pacman
    #[arg(last = true, value_name = "PACMAN_OPTS")]
    pub args: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Options for pacman
    #[arg(last = true, value_name = "PACMAN_OPTS")]
    pub args: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Print package names only
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(required = true, value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Options for pacman
    #[arg(last = true, value_name = "PACMAN_OPTS")]
    pub args: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpgradeArgs {
    /// Refresh the sync databases first (-Syu)
    #[arg(short = 'y', long)]
    pub refresh: bool,

    /// Rebuild VCS packages even if their AUR version is unchanged
    #[arg(long)]
    pub upvcs: bool,

    /// Options for pacman
    #[arg(last = true, value_name = "PACMAN_OPTS")]
    pub args: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct MakeArgs {
    /// Options for makepkg
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "MAKEPKG_OPTS")]
    pub args: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct MakeInfoArgs {
    /// Recipes to describe (defaults to ./PKGBUILD)
    #[arg(value_name = "PKGBUILD")]
    pub files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // Prompts block their worker, so the handler runs as its own task and
    // exits the process directly.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nerror: Caught interrupt: Exiting.");
            std::process::exit(1);
        }
    });

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = RealRuntime;
    let config = Config::load(
        &runtime,
        ConfigOverrides {
            tmp_dir: cli.tmp_dir,
            aur_url: cli.aur_url,
        },
    );

    match cli.command {
        Commands::Install(args) => {
            commands::install(&runtime, &config, &args.packages, &args.args).await
        }
        Commands::Info(args) => commands::info(&config, &args.packages, &args.args).await,
        Commands::Search(args) => {
            let mut pacman_args = args.args;
            pacman_args.extend(args.keywords);
            commands::search(&config, &pacman_args, args.quiet).await
        }
        Commands::Upgrade(args) => {
            let options = UpgradeOptions {
                refresh: args.refresh,
                upvcs: args.upvcs,
            };
            commands::upgrade(&runtime, &config, options, &args.args).await
        }
        Commands::Clean => commands::clean(&runtime, &config).await,
        Commands::Get(args) => commands::get(&runtime, &config, &args.packages).await,
        Commands::Make(args) => commands::make(&runtime, &config, &args.args).await,
        Commands::MakeInfo(args) => commands::make_info(&runtime, &config, &args.files).await,
    }
}
