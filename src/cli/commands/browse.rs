use colored::*;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::api::client::ListingSource;
use crate::api::types::SourceKind;
use crate::api::{ApiClientFactory, ApiType};
use crate::cli::args::{BrowseArgs, BrowseSourceArg};
use crate::cli::commands::Context;
use crate::detail::{web_details, DetailAggregator};
use crate::error::Result;
use crate::filters::{CatalogFilterResolver, QueryResolver, WebSearchResolver};
use crate::normalize::LookupTable;
use crate::output;
use crate::pagination::{Navigation, PageState, Paginator};

const HELP: &str = "n: 다음  p: 이전  f: 처음  l: 마지막  <번호>: 페이지 이동  s <이름>: 상세 보기  q: 종료";

/// One line of user input in a browse session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    Navigate(Navigation),
    Select(String),
    Help,
    Quit,
    Unknown(String),
}

impl BrowseInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "n" => return Self::Navigate(Navigation::Next),
            "p" => return Self::Navigate(Navigation::Prev),
            "f" => return Self::Navigate(Navigation::First),
            "l" => return Self::Navigate(Navigation::Last),
            "q" | "quit" | "exit" => return Self::Quit,
            "" | "h" | "?" => return Self::Help,
            _ => {}
        }

        if let Some(title) = line.strip_prefix("s ") {
            let title = title.trim();
            if !title.is_empty() {
                return Self::Select(title.to_string());
            }
        }

        match line.parse::<u32>() {
            Ok(page) if page >= 1 => Self::Navigate(Navigation::Jump(page)),
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Execute browse command: an interactive paging session over one source
pub async fn execute(ctx: &Context, args: BrowseArgs) -> Result<()> {
    let selection = args.filters.selection();

    match args.source {
        BrowseSourceArg::Tour => {
            ctx.require(ApiType::Tour)?;
            let tour = ctx.tour();
            let naver = ctx.naver();
            let listing = ApiClientFactory::create(SourceKind::Tour, ctx.config.client_config(ApiType::Tour), ctx.http());
            let resolver = CatalogFilterResolver::new(&tour);
            let aggregator = DetailAggregator::new(&tour).with_reviews(&naver);

            session(ctx, listing.as_ref(), &resolver, PageState::new(selection), |title, table| {
                let aggregator = &aggregator;
                async move { aggregator.get_details(&title, &table).await }
            })
            .await
        }
        BrowseSourceArg::Web => {
            ctx.require(ApiType::Serp)?;
            let serp = ctx.serp();
            let listing = ApiClientFactory::create(SourceKind::Serp, ctx.config.client_config(ApiType::Serp), ctx.http());

            session(ctx, listing.as_ref(), &WebSearchResolver, PageState::new(selection), |title, table| {
                let serp = &serp;
                async move { web_details(serp, &title, &table).await }
            })
            .await
        }
    }
}

async fn session<F, Fut>(
    ctx: &Context,
    listing: &dyn ListingSource,
    resolver: &dyn QueryResolver,
    mut state: PageState,
    details: F,
) -> Result<()>
where
    F: Fn(String, LookupTable) -> Fut,
    Fut: std::future::Future<Output = crate::detail::DetailReport>,
{
    let paginator = Paginator::new(listing, resolver);
    let mut view = paginator.navigate(&mut state, Navigation::First).await;
    println!("{}", output::format_page(&view, ctx.format)?);
    println!("{}", HELP.dimmed());

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match BrowseInput::parse(&line) {
            BrowseInput::Navigate(nav) => {
                if !state.nav().allows(nav) {
                    println!("{}", "더 이동할 페이지가 없습니다.".yellow());
                    continue;
                }
                view = paginator.navigate(&mut state, nav).await;
                println!("{}", output::format_page(&view, ctx.format)?);
            }
            BrowseInput::Select(title) => {
                let report = details(title, view.lookup.clone()).await;
                if report.is_empty() {
                    println!("{}", "표시할 목록이 없습니다.".yellow());
                } else {
                    println!("{}", output::format_detail(&report, ctx.format)?);
                }
            }
            BrowseInput::Help => println!("{}", HELP),
            BrowseInput::Quit => break,
            BrowseInput::Unknown(input) => {
                println!("{} '{}'", "알 수 없는 명령:".red(), input);
                println!("{}", HELP.dimmed());
            }
        }
    }

    Ok(())
}
