use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::serp::DEFAULT_FESTIVAL_QUERY;
use crate::api::types::Coordinates;
use crate::filters::FilterSelection;

/// Region, sub-region and category filters shared by catalog commands
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Region name (e.g. 서울, 부산, 제주도)
    pub region: String,

    /// Sub-region (시군구) name; 전체 or omitted searches the whole region
    #[arg(short = 's', long)]
    pub sub_region: Option<String>,

    /// Category (관광지, 문화시설, 행사/공연/축제, 숙박, 음식점, ...)
    #[arg(short = 'c', long)]
    pub category: Option<String>,
}

impl FilterArgs {
    pub fn selection(&self) -> FilterSelection {
        FilterSelection::new(self.region.clone())
            .with_sub_region(self.sub_region.clone())
            .with_category(self.category.clone())
    }
}

/// Latitude/longitude pair
#[derive(Args, Debug, Clone, Copy)]
pub struct LocationArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

impl LocationArgs {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NearbySourceArg {
    /// Tourism catalog location search
    Tour,
    /// Web search around the point
    Serp,
}

/// Nearby search arguments
#[derive(Args, Debug)]
pub struct NearbyArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Where to search
    #[arg(long, value_enum, default_value = "tour")]
    pub source: NearbySourceArg,

    /// Show details for this title from the results
    #[arg(long)]
    pub select: Option<String>,
}

/// Area (filter) search arguments
#[derive(Args, Debug)]
pub struct AreaArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Page number; anything that is not a positive number means page 1
    #[arg(short, long, default_value = "1")]
    pub page: String,
}

/// Detail lookup arguments
#[derive(Args, Debug)]
pub struct DetailArgs {
    /// Title as shown in the listing
    pub title: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Page of the listing the title appears on
    #[arg(short, long, default_value = "1")]
    pub page: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrowseSourceArg {
    /// Tourism catalog area search
    Tour,
    /// Web search by region and category
    Web,
}

/// Interactive browsing arguments
#[derive(Args, Debug)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Which listing to browse
    #[arg(long, value_enum, default_value = "tour")]
    pub source: BrowseSourceArg,
}

/// Seoul open-data listing arguments
#[derive(Args, Debug)]
pub struct SeoulArgs {
    /// Page number
    #[arg(short, long, default_value = "1")]
    pub page: String,

    /// Fetch the whole dataset instead of one page
    #[arg(long)]
    pub all: bool,
}

/// Web search arguments
#[derive(Args, Debug)]
pub struct WebArgs {
    /// Region name
    pub region: String,

    /// Category; mapped onto a search keyword
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    /// Page number
    #[arg(short, long, default_value = "1")]
    pub page: String,
}

/// Web search detail arguments
#[derive(Args, Debug)]
pub struct WebDetailArgs {
    /// Title as shown in the web listing
    pub title: String,

    #[command(flatten)]
    pub search: WebArgs,
}

/// Festival discovery arguments
#[derive(Args, Debug)]
pub struct FestivalArgs {
    /// Search query for festivals
    #[arg(long, default_value = DEFAULT_FESTIVAL_QUERY)]
    pub query: String,

    /// Show overview and introduction for this festival
    #[arg(long)]
    pub select: Option<String>,
}

/// Export arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Directory for the CSV file (overrides output.export_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Trend analysis arguments
#[derive(Args, Debug)]
pub struct TrendArgs {
    /// Region to search for festivals (ignored with --lat/--lon)
    #[arg(required_unless_present = "lat")]
    pub region: Option<String>,

    /// Sub-region name
    #[arg(short = 's', long)]
    pub sub_region: Option<String>,

    /// Category; defaults to 행사/공연/축제
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    /// Analyze festivals near this latitude instead of a region
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude paired with --lat
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Directory for the trend CSV files (overrides output.trend_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Configuration command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. tour.key, naver.blog.client_id)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,

    /// Initialize configuration
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_area_args_build_selection() {
        let cli = Cli::try_parse_from(["tourlens", "area", "서울", "-s", "강남구", "-c", "관광지", "-p", "3"]).unwrap();
        let Commands::Area(args) = cli.command else {
            panic!("expected area command");
        };
        assert_eq!(args.page, "3");
        let selection = args.filters.selection();
        assert_eq!(selection.region.as_deref(), Some("서울"));
        assert_eq!(selection.sub_region.as_deref(), Some("강남구"));
        assert_eq!(selection.category.as_deref(), Some("관광지"));
    }

    #[test]
    fn test_nearby_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["tourlens", "nearby", "--lat", "-33.86", "--lon", "151.2", "--source", "serp"]).unwrap();
        let Commands::Nearby(args) = cli.command else {
            panic!("expected nearby command");
        };
        assert_eq!(args.location.coordinates().latitude, -33.86);
        assert_eq!(args.source, NearbySourceArg::Serp);
    }

    #[test]
    fn test_trend_needs_region_or_location() {
        assert!(Cli::try_parse_from(["tourlens", "trend"]).is_err());
        assert!(Cli::try_parse_from(["tourlens", "trend", "--lat", "37.5"]).is_err());
        assert!(Cli::try_parse_from(["tourlens", "trend", "--lat", "37.5", "--lon", "127.0"]).is_ok());
        assert!(Cli::try_parse_from(["tourlens", "trend", "부산"]).is_ok());
    }
}
