use rmcp::schemars;
use serde::Deserialize;

use crate::page_range::{
    parse_specifier_text, resolve, DocumentContext, PageRangeError, PageSpecifier, ParseMode,
    Parity, ResolvedPageSet,
};

/// Page selection as it arrives from a client (CLI flags or an MCP request).
///
/// This is the one place where wire-level selector names map onto
/// [`PageSpecifier`] variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PageSelection {
    /// Every page
    #[default]
    All,
    /// Page text such as "1, 2-3, 5" or "4-end"
    Custom {
        #[schemars(description = "Pages and ranges, e.g. '1, 2-3, 5' or '4-end'")]
        pages: String,
    },
    /// Literal page numbers
    Pages {
        #[schemars(description = "1-based page numbers")]
        pages: Vec<u32>,
    },
    /// A list of ranges such as ["1-3", "7-9"]
    Ranges {
        #[schemars(description = "Ranges like '1-3'; a single number is a one-page range")]
        ranges: Vec<String>,
    },
    /// Every Nth page
    EveryNth {
        #[schemars(description = "Interval between selected pages")]
        n: u32,
        #[schemars(description = "First selected page (default: n)")]
        #[serde(default)]
        start_from: Option<u32>,
    },
    Even,
    Odd,
    /// The page the user is currently looking at
    Current {
        #[schemars(description = "1-based page number")]
        page: u32,
    },
    First,
    Last,
}

impl PageSelection {
    pub fn to_specifier(&self, ctx: DocumentContext) -> Result<PageSpecifier, PageRangeError> {
        let specifier = match self {
            PageSelection::All => PageSpecifier::All,
            PageSelection::Custom { pages } => parse_specifier_text(pages, ParseMode::Mixed)?,
            PageSelection::Pages { pages } => PageSpecifier::Explicit(pages.clone()),
            PageSelection::Ranges { ranges } => {
                let mut spans = Vec::new();
                for range in ranges {
                    if let PageSpecifier::RangeList(parsed) =
                        parse_specifier_text(range, ParseMode::Ranges)?
                    {
                        spans.extend(parsed);
                    }
                }
                PageSpecifier::RangeList(spans)
            }
            PageSelection::EveryNth { n, start_from } => PageSpecifier::Stride {
                step: *n,
                start_from: start_from.unwrap_or(*n),
            },
            PageSelection::Even => PageSpecifier::Parity(Parity::Even),
            PageSelection::Odd => PageSpecifier::Parity(Parity::Odd),
            PageSelection::Current { page } => PageSpecifier::Current(*page),
            PageSelection::First => PageSpecifier::Current(1),
            PageSelection::Last => PageSpecifier::Current(ctx.total_pages()),
        };
        Ok(specifier)
    }

    pub fn resolve(&self, ctx: DocumentContext) -> Result<ResolvedPageSet, PageRangeError> {
        let specifier = self.to_specifier(ctx)?;
        tracing::debug!(selection = ?self, ?specifier, "resolving page selection");
        resolve(&specifier, ctx)
    }
}
