use crate::api::ApiType;
use crate::cli::args::SeoulArgs;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::filters::{FilterSelection, NoFilters};
use crate::normalize::LookupTable;
use crate::output;
use crate::pagination::{coerce_page, Paginator};
use crate::progress::ApiProgress;

/// Execute seoul command
pub async fn execute(ctx: &Context, args: SeoulArgs) -> Result<()> {
    ctx.require(ApiType::Seoul)?;
    let seoul = ctx.seoul();

    if args.all {
        let bars = ctx.bars();
        let attractions = seoul.fetch_all(&bars).await?;
        if attractions.is_empty() {
            println!("서울 관광명소 데이터가 없습니다.");
            return Ok(());
        }
        let table = LookupTable::from_records(attractions.into_iter().map(|a| a.record));
        println!("{}", output::format_listings("서울 관광명소", &table, ctx.format)?);
        return Ok(());
    }

    let page = coerce_page(&args.page);
    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Seoul.display_name());
    progress.set_message(&format!("서울 관광명소 {}페이지 조회 중...", page));

    let view = Paginator::new(&seoul, &NoFilters)
        .compute_page(&FilterSelection::default(), page)
        .await;

    progress.finish_and_clear();
    println!("{}", output::format_page(&view, ctx.format)?);
    Ok(())
}
