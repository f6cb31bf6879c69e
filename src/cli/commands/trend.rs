use crate::api::types::Coordinates;
use crate::api::{search_by_location, ApiType};
use crate::cli::args::TrendArgs;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::filters::{CatalogFilterResolver, FilterSelection, FESTIVAL_CATEGORY};
use crate::output::Formatter;
use crate::trend::{festival_rows_from_filters, festival_rows_from_table, TrendAnalyzer};

/// Execute trend command
pub async fn execute(ctx: &Context, args: TrendArgs) -> Result<()> {
    ctx.require(ApiType::Tour)?;
    ctx.require(ApiType::NaverTrend)?;
    let tour = ctx.tour();
    let naver = ctx.naver();
    let bars = ctx.bars();

    let rows = match (args.lat, args.lon, args.region) {
        (Some(latitude), Some(longitude), _) => {
            let table = search_by_location(&tour, Coordinates { latitude, longitude }).await;
            festival_rows_from_table(&tour, &table, &bars).await
        }
        (_, _, Some(region)) => {
            let resolver = CatalogFilterResolver::new(&tour);
            let selection = FilterSelection::new(region)
                .with_sub_region(args.sub_region)
                .with_category(args.category.or_else(|| Some(FESTIVAL_CATEGORY.to_string())));
            festival_rows_from_filters(&tour, &tour, &resolver, &selection, &bars).await?
        }
        _ => Vec::new(),
    };

    let out_dir = args.output_dir.unwrap_or_else(|| ctx.config.trend_dir());
    let report = TrendAnalyzer::new(&naver, out_dir)
        .with_progress(&bars)
        .analyze(&rows)
        .await?;

    println!("{}", Formatter::new(ctx.format).format_trend(&report)?);
    Ok(())
}
