use crate::api::serp::SerpClient;
use crate::api::ApiType;
use crate::cli::args::{WebArgs, WebDetailArgs};
use crate::cli::commands::Context;
use crate::detail::web_details;
use crate::error::Result;
use crate::filters::{FilterSelection, WebSearchResolver};
use crate::output;
use crate::pagination::{coerce_page, PageView, Paginator};
use crate::progress::ApiProgress;

async fn load_page(ctx: &Context, serp: &SerpClient, args: &WebArgs) -> PageView {
    let selection = FilterSelection::new(args.region.clone()).with_category(args.category.clone());
    let page = coerce_page(&args.page);

    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Serp.display_name());
    progress.set_message(&format!("'{}' 웹 검색 중...", selection.describe()));
    let view = Paginator::new(serp, &WebSearchResolver).compute_page(&selection, page).await;
    progress.finish_and_clear();
    view
}

/// Execute web command
pub async fn execute(ctx: &Context, args: WebArgs) -> Result<()> {
    ctx.require(ApiType::Serp)?;
    let serp = ctx.serp();

    let view = load_page(ctx, &serp, &args).await;
    println!("{}", output::format_page(&view, ctx.format)?);
    Ok(())
}

/// Execute web-detail command
pub async fn execute_detail(ctx: &Context, args: WebDetailArgs) -> Result<()> {
    ctx.require(ApiType::Serp)?;
    let serp = ctx.serp();

    let view = load_page(ctx, &serp, &args.search).await;
    if let Some(error) = &view.error {
        println!("목록을 불러오지 못했습니다: {}", error);
        return Ok(());
    }

    let report = web_details(&serp, &args.title, &view.lookup).await;
    if report.is_empty() {
        println!("표시할 목록이 없습니다.");
        return Ok(());
    }
    println!("{}", output::format_detail(&report, ctx.format)?);
    Ok(())
}
