use crate::api::search_by_location;
use crate::api::ApiType;
use crate::cli::args::{NearbyArgs, NearbySourceArg};
use crate::cli::commands::Context;
use crate::detail::{web_details, DetailAggregator};
use crate::error::Result;
use crate::output;
use crate::progress::{messages, ApiProgress};

/// Execute nearby command
pub async fn execute(ctx: &Context, args: NearbyArgs) -> Result<()> {
    let at = args.location.coordinates();

    match args.source {
        NearbySourceArg::Tour => {
            ctx.require(ApiType::Tour)?;
            let tour = ctx.tour();

            let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Tour.display_name());
            progress.set_message(&messages::searching_api(ApiType::Tour.display_name()));
            let table = search_by_location(&tour, at).await;
            progress.finish_with_message(&messages::search_complete(ApiType::Tour.display_name(), table.len()));

            if table.is_empty() {
                println!("주변에서 찾은 관광지가 없습니다.");
                return Ok(());
            }
            println!("{}", output::format_listings("주변 관광지", &table, ctx.format)?);

            if let Some(title) = args.select {
                let naver = ctx.naver();
                let bars = ctx.bars();
                let report = DetailAggregator::new(&tour)
                    .with_reviews(&naver)
                    .with_progress(&bars)
                    .get_details(&title, &table)
                    .await;
                println!("{}", output::format_detail(&report, ctx.format)?);
            }
        }
        NearbySourceArg::Serp => {
            ctx.require(ApiType::Serp)?;
            let serp = ctx.serp();

            let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Serp.display_name());
            progress.set_message(&messages::searching_api(ApiType::Serp.display_name()));
            let table = search_by_location(&serp, at).await;
            progress.finish_with_message(&messages::search_complete(ApiType::Serp.display_name(), table.len()));

            if table.is_empty() {
                println!("주변에서 찾은 장소가 없습니다.");
                return Ok(());
            }
            println!("{}", output::format_listings("주변 장소 (웹 검색)", &table, ctx.format)?);

            if let Some(title) = args.select {
                let report = web_details(&serp, &title, &table).await;
                println!("{}", output::format_detail(&report, ctx.format)?);
            }
        }
    }

    Ok(())
}
