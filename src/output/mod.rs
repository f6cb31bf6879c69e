pub mod formatter;

pub use formatter::Formatter;

use crate::cli::OutputFormat;
use crate::detail::DetailReport;
use crate::error::Result;
use crate::normalize::LookupTable;
use crate::pagination::PageView;

/// Format one page of listings based on the specified format
pub fn format_page(view: &PageView, format: OutputFormat) -> Result<String> {
    Formatter::new(format).format_page(view)
}

/// Format a flat listing table based on the specified format
pub fn format_listings(heading: &str, table: &LookupTable, format: OutputFormat) -> Result<String> {
    Formatter::new(format).format_listings(heading, table)
}

/// Format a detail report based on the specified format
pub fn format_detail(report: &DetailReport, format: OutputFormat) -> Result<String> {
    Formatter::new(format).format_detail(report)
}
