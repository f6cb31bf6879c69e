use colored::*;

use crate::api::ApiType;
use crate::cli::args::ExportArgs;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::export::{ExportOutcome, Exporter};
use crate::filters::CatalogFilterResolver;

/// Execute export command
pub async fn execute(ctx: &Context, args: ExportArgs) -> Result<()> {
    ctx.require(ApiType::Tour)?;
    let tour = ctx.tour();
    let resolver = CatalogFilterResolver::new(&tour);
    let selection = args.filters.selection();
    let out_dir = args.output_dir.unwrap_or_else(|| ctx.config.export_dir());
    let bars = ctx.bars();

    let outcome = Exporter::new(&tour, &tour, &resolver, out_dir)
        .with_progress(&bars)
        .export_all(&selection)
        .await?;

    match outcome {
        ExportOutcome::Written { path, rows } => {
            println!("{} {}개 행을 내보냈습니다: {}", "✅".green(), rows, path.display());
        }
        ExportOutcome::NoData => {
            println!("{} '{}' 조건에 해당하는 데이터가 없습니다.", "⚠️".yellow(), selection.describe());
        }
        ExportOutcome::NoDetails => {
            println!("{} 상세 정보를 가져온 항목이 없어 파일을 만들지 않았습니다.", "⚠️".yellow());
        }
    }
    Ok(())
}
