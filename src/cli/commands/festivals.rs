use log::warn;

use crate::api::ApiType;
use crate::cli::args::FestivalArgs;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::output::Formatter;
use crate::progress::{messages, ApiProgress};

/// Execute festivals command
pub async fn execute(ctx: &Context, args: FestivalArgs) -> Result<()> {
    ctx.require(ApiType::Serp)?;
    let serp = ctx.serp();
    let formatter = Formatter::new(ctx.format);

    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Serp.display_name());
    progress.set_message(&format!("'{}' 행사 검색 중...", args.query));
    let names = serp.festivals(&args.query).await?;
    progress.finish_with_message(&messages::search_complete(ApiType::Serp.display_name(), names.len()));

    let Some(name) = args.select else {
        if names.is_empty() {
            println!("'{}'에 해당하는 행사를 찾지 못했습니다.", args.query);
        } else {
            println!("{}", formatter.format_names("행사", &names)?);
        }
        return Ok(());
    };

    if !names.contains(&name) {
        warn!("'{}' is not among the discovered festivals; searching anyway", name);
    }

    let progress = ApiProgress::new(ctx.progress.clone(), ApiType::Serp.display_name());
    progress.set_message(&format!("'{}' 정보 조회 중...", name));
    let info = serp.festival_info(&name).await?;
    progress.finish_and_clear();

    println!("{}", formatter.format_festival(&info)?);
    Ok(())
}
