use crate::api::ApiType;
use crate::cli::args::DetailArgs;
use crate::cli::commands::Context;
use crate::detail::DetailAggregator;
use crate::error::Result;
use crate::filters::CatalogFilterResolver;
use crate::output;
use crate::pagination::{coerce_page, Paginator};
use crate::progress::ApiProgress;

/// Execute detail command.
///
/// The listing page is loaded first so the title resolves against the
/// same lookup table a user browsing that page would see.
pub async fn execute(ctx: &Context, args: DetailArgs) -> Result<()> {
    ctx.require(ApiType::Tour)?;
    let tour = ctx.tour();
    let naver = ctx.naver();
    let resolver = CatalogFilterResolver::new(&tour);
    let selection = args.filters.selection();

    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Tour.display_name());
    progress.set_message(&format!("'{}' 목록 조회 중...", selection.describe()));
    let view = Paginator::new(&tour, &resolver)
        .compute_page(&selection, coerce_page(&args.page))
        .await;
    progress.finish_and_clear();

    if let Some(error) = &view.error {
        println!("목록을 불러오지 못했습니다: {}", error);
        return Ok(());
    }

    let bars = ctx.bars();
    let report = DetailAggregator::new(&tour)
        .with_reviews(&naver)
        .with_progress(&bars)
        .get_details(&args.title, &view.lookup)
        .await;

    if report.is_empty() {
        println!("표시할 목록이 없습니다.");
        return Ok(());
    }
    println!("{}", output::format_detail(&report, ctx.format)?);
    Ok(())
}
