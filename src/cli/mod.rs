pub mod args;
pub mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::error::TourError;

/// Korean tourism information CLI
#[derive(Parser, Debug)]
#[command(
    name = "tourlens",
    about = "Korean tourism information CLI - browse, inspect and export tourism data from public APIs",
    version,
    author,
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Markdown format
    Markdown,
    /// CSV format
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search listings around a point (주변 관광지)
    #[command(alias = "n")]
    Nearby(args::NearbyArgs),

    /// Search listings by region, sub-region and category (지역 검색)
    #[command(alias = "a")]
    Area(args::AreaArgs),

    /// List the sub-regions (시군구) of a region
    SubRegions {
        /// Region name
        region: String,
    },

    /// Show aggregated details for a listing
    #[command(alias = "d")]
    Detail(args::DetailArgs),

    /// Page through listings interactively
    #[command(alias = "b")]
    Browse(args::BrowseArgs),

    /// Seoul open-data attractions (서울 관광명소)
    Seoul(args::SeoulArgs),

    /// Web search by region and category
    #[command(alias = "w")]
    Web(args::WebArgs),

    /// Show the web search result for one title
    WebDetail(args::WebDetailArgs),

    /// Discover festivals and show their introductions
    Festivals(args::FestivalArgs),

    /// Export every matching listing with details to CSV
    #[command(alias = "e")]
    Export(args::ExportArgs),

    /// Analyze search trends around festival dates
    #[command(alias = "t")]
    Trend(args::TrendArgs),

    /// Manage configuration
    #[command(alias = "c")]
    Config(args::ConfigArgs),

    /// Show version information
    Version,

    /// Generate shell completion scripts
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Generate shell completion scripts
    fn generate_completions(shell: Shell) {
        use clap::CommandFactory;
        use clap_complete::generate;
        use std::io;

        let mut cmd = Self::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
    }

    /// Run the CLI application
    pub async fn run() -> crate::error::Result<()> {
        let cli = Self::parse();

        // Set up logging
        let default_filter = if cli.verbose { "debug" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

        let verbose = cli.verbose;
        let result = match cli.command {
            Commands::Config(args) => commands::config::execute(args).await,
            Commands::Version => {
                commands::version::execute();
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::generate_completions(shell);
                Ok(())
            }
            command => match commands::Context::new(cli.format, cli.quiet, cli.verbose) {
                Ok(ctx) => Self::dispatch(&ctx, command).await,
                Err(e) => Err(e),
            },
        };

        if let Err(e) = &result {
            report_error(e, verbose);
        }
        result
    }

    async fn dispatch(ctx: &commands::Context, command: Commands) -> crate::error::Result<()> {
        match command {
            Commands::Nearby(args) => commands::nearby::execute(ctx, args).await,
            Commands::Area(args) => commands::area::execute(ctx, args).await,
            Commands::SubRegions { region } => commands::sub_regions::execute(ctx, &region).await,
            Commands::Detail(args) => commands::detail::execute(ctx, args).await,
            Commands::Browse(args) => commands::browse::execute(ctx, args).await,
            Commands::Seoul(args) => commands::seoul::execute(ctx, args).await,
            Commands::Web(args) => commands::web::execute(ctx, args).await,
            Commands::WebDetail(args) => commands::web::execute_detail(ctx, args).await,
            Commands::Festivals(args) => commands::festivals::execute(ctx, args).await,
            Commands::Export(args) => commands::export::execute(ctx, args).await,
            Commands::Trend(args) => commands::trend::execute(ctx, args).await,
            Commands::Config(_) | Commands::Version | Commands::Completions { .. } => Ok(()),
        }
    }
}

/// Print an error with its hint the way users expect from the CLI
fn report_error(e: &TourError, verbose: bool) {
    match e {
        TourError::NoApiKey(api) => {
            eprintln!("Error: No API key configured for {}.", api.display_name());
            eprintln!("\nTo use this service, you need an API key from {}", api.signup_url());
            eprintln!("Once you have a key, configure it with:");
            eprintln!("  tourlens config set {} YOUR_API_KEY", api.config_key());
        }
        TourError::ApiError { code, message, .. } => {
            eprintln!("{}: {}", e.kind().label(), message);
            if verbose {
                eprintln!("Code: {}", code);
            }
        }
        TourError::Network(err) => {
            eprintln!("Network error: {}", err);
        }
        TourError::Parse(msg) => {
            eprintln!("Error parsing response: {}", msg);
            if !verbose {
                eprintln!("\nRun with --verbose for more details.");
            }
        }
        _ => {
            eprintln!("{}", headline(e));
        }
    }

    if !matches!(e, TourError::NoApiKey(_)) {
        if let Some(hint) = e.hint() {
            eprintln!("\nHint: {}", hint);
        }
    }
}

/// First line of an error report, prefixed by the error's category
fn headline(e: &TourError) -> String {
    format!("{}: {}", e.kind().label(), e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_uses_error_kind() {
        assert_eq!(
            headline(&TourError::NotFound("강남구".into())),
            "Lookup failed: Not found: 강남구"
        );
        assert!(headline(&TourError::RateLimit).starts_with("Network error: "));
        assert!(headline(&TourError::EmptyResponse).starts_with("Unexpected response: "));
    }
}
