use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

/// Upper bound written as `end` in page text, e.g. "5-end". Clamps to the last page.
pub const OPEN_END: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("malformed page selection {raw:?}: {reason}")]
    MalformedInput { raw: String, reason: String },

    #[error("invalid range {start}-{end}: start page is after end page")]
    InvalidRange { start: u32, end: u32 },

    #[error("page interval must be at least 1")]
    InvalidStride,

    #[error("page {page} is out of range (1-{total})")]
    PageOutOfBounds { page: u32, total: u32 },

    #[error("selection does not match any page in the document")]
    NoValidPages,

    #[error("document has no pages")]
    EmptyDocument,
}

impl PageRangeError {
    /// Stable machine-readable code for the error, used in transport payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PageRangeError::MalformedInput { .. } => "malformed_input",
            PageRangeError::InvalidRange { .. } => "invalid_range",
            PageRangeError::InvalidStride => "invalid_stride",
            PageRangeError::PageOutOfBounds { .. } => "page_out_of_bounds",
            PageRangeError::NoValidPages => "no_valid_pages",
            PageRangeError::EmptyDocument => "empty_document",
        }
    }
}

/// An inclusive, 1-based span of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    pub start: u32,
    pub end: u32,
}

impl PageSpan {
    pub fn new(start: u32, end: u32) -> Self {
        PageSpan { start, end }
    }

    /// Pages of this span that exist in a document of `total` pages.
    fn clamped(&self, total: u32) -> RangeInclusive<u32> {
        self.start.max(1)..=self.end.min(total)
    }
}

impl fmt::Display for PageSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end == OPEN_END {
            write!(f, "{}-end", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Range(PageSpan),
}

impl PageToken {
    fn span(&self) -> Option<&PageSpan> {
        match self {
            PageToken::Page(_) => None,
            PageToken::Range(span) => Some(span),
        }
    }

    #[allow(clippy::reversed_empty_ranges)]
    fn pages(&self, total: u32) -> RangeInclusive<u32> {
        match self {
            PageToken::Page(page) if in_bounds(*page, total) => *page..=*page,
            PageToken::Page(_) => 1..=0,
            PageToken::Range(span) => span.clamped(total),
        }
    }

    fn into_span(self) -> PageSpan {
        match self {
            PageToken::Page(page) => PageSpan::new(page, page),
            PageToken::Range(span) => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    fn matches(self, page: u32) -> bool {
        match self {
            Parity::Even => page.is_multiple_of(2),
            Parity::Odd => !page.is_multiple_of(2),
        }
    }
}

/// How the caller selected pages. Exactly one strategy per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSpecifier {
    All,
    Explicit(Vec<u32>),
    RangeList(Vec<PageSpan>),
    MixedList(Vec<PageToken>),
    Stride { step: u32, start_from: u32 },
    Parity(Parity),
    Current(u32),
}

/// Facts about the open document that resolution depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentContext {
    total_pages: u32,
}

impl DocumentContext {
    pub fn new(total_pages: u32) -> Result<Self, PageRangeError> {
        if total_pages == 0 {
            return Err(PageRangeError::EmptyDocument);
        }
        Ok(DocumentContext { total_pages })
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }
}

/// A non-empty, strictly ascending set of 1-based page numbers that all
/// exist in the document it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPageSet(Vec<u32>);

impl ResolvedPageSet {
    fn from_set(pages: BTreeSet<u32>) -> Result<Self, PageRangeError> {
        if pages.is_empty() {
            return Err(PageRangeError::NoValidPages);
        }
        Ok(ResolvedPageSet(pages.into_iter().collect()))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> u32 {
        self.0[0]
    }

    pub fn last(&self) -> u32 {
        self.0[self.0.len() - 1]
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.binary_search(&page).is_ok()
    }

    /// Pages of the document that are not in this set, ascending.
    pub fn complement(&self, ctx: DocumentContext) -> Vec<u32> {
        (1..=ctx.total_pages).filter(|&p| !self.contains(p)).collect()
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl fmt::Display for ResolvedPageSet {
    /// Compact range notation: `1-3,7,9-10`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for page in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == page => *end = page,
                _ => runs.push((page, page)),
            }
        }
        for (i, (start, end)) in runs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

fn in_bounds(page: u32, total: u32) -> bool {
    page >= 1 && page <= total
}

fn check_spans<'a>(spans: impl Iterator<Item = &'a PageSpan>) -> Result<(), PageRangeError> {
    for span in spans {
        if span.start > span.end {
            return Err(PageRangeError::InvalidRange {
                start: span.start,
                end: span.end,
            });
        }
    }
    Ok(())
}

/// Resolve a page specifier against a document into a concrete page set.
///
/// Explicit pages outside the document are dropped, range ends past the
/// last page are clamped, and a selection that ends up empty is an error.
pub fn resolve(
    specifier: &PageSpecifier,
    ctx: DocumentContext,
) -> Result<ResolvedPageSet, PageRangeError> {
    let total = ctx.total_pages;

    let pages: BTreeSet<u32> = match specifier {
        PageSpecifier::All => (1..=total).collect(),
        PageSpecifier::Explicit(pages) => pages
            .iter()
            .copied()
            .filter(|&page| in_bounds(page, total))
            .collect(),
        PageSpecifier::RangeList(spans) => {
            check_spans(spans.iter())?;
            spans.iter().flat_map(|span| span.clamped(total)).collect()
        }
        PageSpecifier::MixedList(tokens) => {
            check_spans(tokens.iter().filter_map(PageToken::span))?;
            tokens.iter().flat_map(|token| token.pages(total)).collect()
        }
        PageSpecifier::Stride { step, start_from } => {
            if *step == 0 {
                return Err(PageRangeError::InvalidStride);
            }
            if *start_from == 0 {
                return Err(PageRangeError::PageOutOfBounds { page: 0, total });
            }
            if *start_from > total {
                return Err(PageRangeError::NoValidPages);
            }
            (*start_from..=total).step_by(*step as usize).collect()
        }
        PageSpecifier::Parity(parity) => (1..=total).filter(|&p| parity.matches(p)).collect(),
        PageSpecifier::Current(page) => {
            if !in_bounds(*page, total) {
                return Err(PageRangeError::PageOutOfBounds { page: *page, total });
            }
            BTreeSet::from([*page])
        }
    };

    ResolvedPageSet::from_set(pages)
}

/// Shape the caller expects page text to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Pages and ranges in any order, plus the whole-input keywords `all`, `even`, `odd`.
    #[default]
    Mixed,
    /// Single pages only.
    Explicit,
    /// Every entry becomes a span; `5` reads as `5-5`.
    Ranges,
}

/// Parse page text like "1, 2-3, 5" or "4-end" into a specifier.
pub fn parse_specifier_text(raw: &str, mode: ParseMode) -> Result<PageSpecifier, PageRangeError> {
    let trimmed = raw.trim();

    if mode == ParseMode::Mixed {
        if let Some(specifier) = parse_keyword(trimmed) {
            return Ok(specifier);
        }
    }

    let tokens = trimmed
        .split(',')
        .map(|part| parse_token(raw, part))
        .collect::<Result<Vec<_>, _>>()?;

    match mode {
        ParseMode::Mixed => Ok(PageSpecifier::MixedList(tokens)),
        ParseMode::Explicit => tokens
            .into_iter()
            .map(|token| match token {
                PageToken::Page(page) => Ok(page),
                PageToken::Range(span) => Err(malformed(
                    raw,
                    format!("expected single pages, found range {}", span),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PageSpecifier::Explicit),
        ParseMode::Ranges => Ok(PageSpecifier::RangeList(
            tokens.into_iter().map(PageToken::into_span).collect(),
        )),
    }
}

fn parse_keyword(s: &str) -> Option<PageSpecifier> {
    if s.eq_ignore_ascii_case("all") {
        Some(PageSpecifier::All)
    } else if s.eq_ignore_ascii_case("even") {
        Some(PageSpecifier::Parity(Parity::Even))
    } else if s.eq_ignore_ascii_case("odd") {
        Some(PageSpecifier::Parity(Parity::Odd))
    } else {
        None
    }
}

fn parse_token(raw: &str, part: &str) -> Result<PageToken, PageRangeError> {
    let token = part.trim();
    if token.is_empty() {
        return Err(malformed(raw, "empty entry in page list".to_string()));
    }

    let Some((start, end)) = token.split_once('-') else {
        return parse_page_number(raw, token).map(PageToken::Page);
    };

    if start.trim().is_empty() {
        return Err(malformed(
            raw,
            format!("range {:?} has no start page", token),
        ));
    }
    if end.contains('-') {
        return Err(malformed(
            raw,
            format!("range {:?} has more than one '-'", token),
        ));
    }

    let start = parse_page_number(raw, start)?;
    let end = if end.trim().eq_ignore_ascii_case("end") {
        OPEN_END
    } else {
        parse_page_number(raw, end)?
    };

    Ok(PageToken::Range(PageSpan::new(start, end)))
}

fn parse_page_number(raw: &str, s: &str) -> Result<u32, PageRangeError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(raw, format!("{:?} is not a page number", s)));
    }
    match s.parse::<u32>() {
        Ok(0) => Err(malformed(raw, "page numbers start at 1".to_string())),
        Ok(page) => Ok(page),
        Err(_) => Err(malformed(raw, format!("page number {} is too large", s))),
    }
}

fn malformed(raw: &str, reason: String) -> PageRangeError {
    PageRangeError::MalformedInput {
        raw: raw.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn ctx(total: u32) -> DocumentContext {
        DocumentContext::new(total).unwrap()
    }

    fn pages(specifier: PageSpecifier, total: u32) -> Vec<u32> {
        resolve(&specifier, ctx(total)).unwrap().into_vec()
    }

    #[test]
    fn test_all_pages() {
        assert_eq!(pages(PageSpecifier::All, 4), vec![1, 2, 3, 4]);
        assert_eq!(pages(PageSpecifier::All, 1), vec![1]);
    }

    #[test]
    fn test_explicit_sorted_and_deduped() {
        assert_eq!(
            pages(PageSpecifier::Explicit(vec![3, 1, 2, 1]), 5),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_explicit_drops_out_of_bounds() {
        assert_eq!(pages(PageSpecifier::Explicit(vec![0, 2, 9]), 5), vec![2]);
        assert_eq!(
            resolve(&PageSpecifier::Explicit(vec![6, 7]), ctx(5)),
            Err(PageRangeError::NoValidPages)
        );
        assert_eq!(
            resolve(&PageSpecifier::Explicit(vec![]), ctx(5)),
            Err(PageRangeError::NoValidPages)
        );
    }

    #[test]
    fn test_range_end_is_clamped() {
        let input = PageSpecifier::RangeList(vec![PageSpan::new(2, 4)]);
        assert_eq!(pages(input, 3), vec![2, 3]);

        let input = PageSpecifier::RangeList(vec![PageSpan::new(3, OPEN_END)]);
        assert_eq!(pages(input, 5), vec![3, 4, 5]);
    }

    #[test]
    fn test_reversed_range_is_an_error() {
        let input = PageSpecifier::RangeList(vec![PageSpan::new(5, 2)]);
        assert_eq!(
            resolve(&input, ctx(10)),
            Err(PageRangeError::InvalidRange { start: 5, end: 2 })
        );
    }

    #[test]
    fn test_reversed_range_fails_even_when_others_are_valid() {
        let input = PageSpecifier::MixedList(vec![
            PageToken::Page(1),
            PageToken::Range(PageSpan::new(9, 20)),
            PageToken::Range(PageSpan::new(4, 3)),
        ]);
        assert_eq!(
            resolve(&input, ctx(10)),
            Err(PageRangeError::InvalidRange { start: 4, end: 3 })
        );
    }

    #[test]
    fn test_range_past_end_contributes_nothing() {
        let input = PageSpecifier::RangeList(vec![PageSpan::new(8, 9), PageSpan::new(1, 2)]);
        assert_eq!(pages(input, 5), vec![1, 2]);

        let input = PageSpecifier::RangeList(vec![PageSpan::new(8, 9)]);
        assert_eq!(resolve(&input, ctx(5)), Err(PageRangeError::NoValidPages));
    }

    #[test]
    fn test_mixed_list_union() {
        let input = PageSpecifier::MixedList(vec![
            PageToken::Range(PageSpan::new(4, 6)),
            PageToken::Page(1),
            PageToken::Page(5),
            PageToken::Page(42),
        ]);
        assert_eq!(pages(input, 10), vec![1, 4, 5, 6]);
    }

    #[test]
    fn test_stride() {
        let input = PageSpecifier::Stride {
            step: 3,
            start_from: 1,
        };
        assert_eq!(pages(input, 10), vec![1, 4, 7, 10]);

        let input = PageSpecifier::Stride {
            step: 2,
            start_from: 2,
        };
        assert_eq!(pages(input, 7), vec![2, 4, 6]);
    }

    #[rstest]
    #[case(0, 1, PageRangeError::InvalidStride)]
    #[case(2, 0, PageRangeError::PageOutOfBounds { page: 0, total: 10 })]
    #[case(2, 11, PageRangeError::NoValidPages)]
    fn test_stride_errors(
        #[case] step: u32,
        #[case] start_from: u32,
        #[case] expected: PageRangeError,
    ) {
        let input = PageSpecifier::Stride { step, start_from };
        assert_eq!(resolve(&input, ctx(10)), Err(expected));
    }

    #[test]
    fn test_parity() {
        assert_eq!(pages(PageSpecifier::Parity(Parity::Even), 5), vec![2, 4]);
        assert_eq!(pages(PageSpecifier::Parity(Parity::Odd), 5), vec![1, 3, 5]);
        assert_eq!(pages(PageSpecifier::Parity(Parity::Odd), 1), vec![1]);
        assert_eq!(
            resolve(&PageSpecifier::Parity(Parity::Even), ctx(1)),
            Err(PageRangeError::NoValidPages)
        );
    }

    #[test]
    fn test_current_page() {
        assert_eq!(pages(PageSpecifier::Current(3), 5), vec![3]);
        assert_eq!(
            resolve(&PageSpecifier::Current(7), ctx(5)),
            Err(PageRangeError::PageOutOfBounds { page: 7, total: 5 })
        );
        assert_eq!(
            resolve(&PageSpecifier::Current(0), ctx(5)),
            Err(PageRangeError::PageOutOfBounds { page: 0, total: 5 })
        );
    }

    #[test]
    fn test_empty_document_context() {
        assert_eq!(DocumentContext::new(0), Err(PageRangeError::EmptyDocument));
    }

    #[test]
    fn test_parse_mixed() {
        let input = parse_specifier_text("1, 2-3, 5", ParseMode::Mixed).unwrap();
        assert_eq!(
            input,
            PageSpecifier::MixedList(vec![
                PageToken::Page(1),
                PageToken::Range(PageSpan::new(2, 3)),
                PageToken::Page(5),
            ])
        );
    }

    #[test]
    fn test_parse_end_keyword() {
        let input = parse_specifier_text("5-end", ParseMode::Mixed).unwrap();
        assert_eq!(
            input,
            PageSpecifier::MixedList(vec![PageToken::Range(PageSpan::new(5, OPEN_END))])
        );
        assert_eq!(resolve(&input, ctx(7)).unwrap().into_vec(), vec![5, 6, 7]);
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_specifier_text(" ALL ", ParseMode::Mixed),
            Ok(PageSpecifier::All)
        );
        assert_eq!(
            parse_specifier_text("odd", ParseMode::Mixed),
            Ok(PageSpecifier::Parity(Parity::Odd))
        );
        assert!(matches!(
            parse_specifier_text("all", ParseMode::Explicit),
            Err(PageRangeError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_parse_explicit_mode() {
        assert_eq!(
            parse_specifier_text("4,2", ParseMode::Explicit),
            Ok(PageSpecifier::Explicit(vec![4, 2]))
        );
        assert!(matches!(
            parse_specifier_text("4,2-3", ParseMode::Explicit),
            Err(PageRangeError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_parse_ranges_mode() {
        let expected = vec![PageSpan::new(1, 3), PageSpan::new(7, 7)];
        assert_eq!(
            parse_specifier_text("1-3, 7", ParseMode::Ranges),
            Ok(PageSpecifier::RangeList(expected))
        );
    }

    #[test]
    fn test_parse_keeps_reversed_range_for_resolve() {
        let input = parse_specifier_text("9-6", ParseMode::Mixed).unwrap();
        assert_eq!(
            resolve(&input, ctx(10)),
            Err(PageRangeError::InvalidRange { start: 9, end: 6 })
        );
    }

    #[rstest]
    #[case("1,,3")]
    #[case("")]
    #[case("   ")]
    #[case("1,2,")]
    #[case("abc")]
    #[case("-5")]
    #[case("1-2-3")]
    #[case("3-")]
    #[case("0")]
    #[case("+4")]
    #[case("2.5")]
    #[case("99999999999")]
    fn test_parse_malformed(#[case] raw: &str) {
        match parse_specifier_text(raw, ParseMode::Mixed) {
            Err(PageRangeError::MalformedInput { raw: got, .. }) => assert_eq!(got, raw),
            other => panic!("expected MalformedInput for {:?}, got {:?}", raw, other),
        }
    }

    #[test]
    fn test_malformed_reason_names_token() {
        let err = parse_specifier_text("1, x7, 3", ParseMode::Mixed).unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
        assert!(err.to_string().contains("\"x7\""), "{}", err);
    }

    #[test]
    fn test_display_compacts_runs() {
        let input = PageSpecifier::Explicit(vec![1, 2, 3, 7, 9, 10]);
        let set = resolve(&input, ctx(10)).unwrap();
        assert_eq!(set.to_string(), "1-3,7,9-10");
    }

    #[test]
    fn test_set_accessors() {
        let set = resolve(&PageSpecifier::Explicit(vec![2, 5, 4]), ctx(6)).unwrap();
        assert_eq!(set.first(), 2);
        assert_eq!(set.last(), 5);
        assert_eq!(set.count(), 3);
        assert!(set.contains(4));
        assert!(!set.contains(3));
        assert_eq!(set.complement(ctx(6)), vec![1, 3, 6]);
    }

    fn specifier() -> impl Strategy<Value = PageSpecifier> {
        prop_oneof![
            Just(PageSpecifier::All),
            prop::collection::vec(0u32..60, 0..10).prop_map(PageSpecifier::Explicit),
            prop::collection::vec((0u32..60, 0u32..60), 0..5).prop_map(|spans| {
                PageSpecifier::RangeList(
                    spans
                        .into_iter()
                        .map(|(a, b)| PageSpan::new(a.min(b), a.max(b)))
                        .collect(),
                )
            }),
            (0u32..10, 0u32..60)
                .prop_map(|(step, start_from)| PageSpecifier::Stride { step, start_from }),
            prop_oneof![Just(Parity::Even), Just(Parity::Odd)].prop_map(PageSpecifier::Parity),
            (0u32..60).prop_map(PageSpecifier::Current),
        ]
    }

    proptest! {
        #[test]
        fn prop_all_is_every_page(total in 1u32..500) {
            let expected: Vec<u32> = (1..=total).collect();
            prop_assert_eq!(pages(PageSpecifier::All, total), expected);
        }

        #[test]
        fn prop_success_is_ascending_and_in_bounds(input in specifier(), total in 1u32..50) {
            if let Ok(set) = resolve(&input, ctx(total)) {
                let pages = set.as_slice();
                prop_assert!(!pages.is_empty());
                prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(pages.iter().all(|&p| p >= 1 && p <= total));
            }
        }

        #[test]
        fn prop_resolve_is_deterministic(input in specifier(), total in 1u32..50) {
            prop_assert_eq!(resolve(&input, ctx(total)), resolve(&input, ctx(total)));
        }

        #[test]
        fn prop_resolved_set_is_a_fixed_point(input in specifier(), total in 1u32..50) {
            if let Ok(set) = resolve(&input, ctx(total)) {
                let explicit = PageSpecifier::Explicit(set.as_slice().to_vec());
                prop_assert_eq!(resolve(&explicit, ctx(total)), Ok(set));
            }
        }

        #[test]
        fn prop_parsed_text_matches_structured(
            tokens in prop::collection::vec((1u32..40, prop::option::of(0u32..10)), 1..6),
            total in 1u32..50,
        ) {
            let structured: Vec<PageToken> = tokens
                .iter()
                .map(|&(start, len)| match len {
                    Some(len) => PageToken::Range(PageSpan::new(start, start + len)),
                    None => PageToken::Page(start),
                })
                .collect();
            let text = structured
                .iter()
                .map(|token| match token {
                    PageToken::Page(page) => page.to_string(),
                    PageToken::Range(span) => span.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");

            let parsed = parse_specifier_text(&text, ParseMode::Mixed).unwrap();
            prop_assert_eq!(
                resolve(&parsed, ctx(total)),
                resolve(&PageSpecifier::MixedList(structured), ctx(total))
            );
        }

        #[test]
        fn prop_stride_has_fixed_gaps(step in 1u32..8, start_from in 1u32..30, total in 30u32..60) {
            let set = resolve(&PageSpecifier::Stride { step, start_from }, ctx(total)).unwrap();
            prop_assert_eq!(set.first(), start_from);
            prop_assert!(set.as_slice().windows(2).all(|w| w[1] - w[0] == step));
            prop_assert!(set.last() + step > total);
        }
    }
}
