use crate::api::ApiType;
use crate::cli::args::AreaArgs;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::filters::CatalogFilterResolver;
use crate::output;
use crate::pagination::{coerce_page, Paginator};
use crate::progress::ApiProgress;

/// Execute area command
pub async fn execute(ctx: &Context, args: AreaArgs) -> Result<()> {
    ctx.require(ApiType::Tour)?;
    let tour = ctx.tour();
    let resolver = CatalogFilterResolver::new(&tour);
    let selection = args.filters.selection();
    let page = coerce_page(&args.page);

    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Tour.display_name());
    progress.set_message(&format!("'{}' {}페이지 검색 중...", selection.describe(), page));

    let view = Paginator::new(&tour, &resolver).compute_page(&selection, page).await;

    progress.finish_and_clear();
    println!("{}", output::format_page(&view, ctx.format)?);
    Ok(())
}
