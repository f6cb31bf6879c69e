use crate::api::ApiType;
use crate::cli::commands::Context;
use crate::error::Result;
use crate::filters::CatalogFilterResolver;
use crate::output::Formatter;

/// Execute sub-regions command
pub async fn execute(ctx: &Context, region: &str) -> Result<()> {
    ctx.require(ApiType::Tour)?;
    let tour = ctx.tour();

    let names = CatalogFilterResolver::new(&tour).list_sub_regions(region).await?;
    println!("{}", Formatter::new(ctx.format).format_names(&format!("{} 시군구", region), &names)?);
    Ok(())
}
