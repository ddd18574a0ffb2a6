//! Planning how a document is cut into parts.
//!
//! Planning is pure: it only needs the page count, so every split method is
//! validated before any output file is written.

use crate::page_range::{
    resolve, DocumentContext, PageRangeError, PageSpan, PageSpecifier, ResolvedPageSet,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMethod {
    /// One part per range. Ranges past the last page are clamped.
    ByRanges(Vec<PageSpan>),
    /// Cut after each of these pages.
    AtPages(Vec<u32>),
    /// Consecutive chunks of N pages; the last chunk may be shorter.
    EveryN(u32),
    /// One part per page.
    AllPages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    /// File name suffix, e.g. `part2_pages4-6` or `page3`
    pub label: String,
    pub pages: ResolvedPageSet,
}

impl SplitPart {
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}_{}.pdf", stem, self.label)
    }
}

pub fn plan_split(
    method: &SplitMethod,
    ctx: DocumentContext,
) -> Result<Vec<SplitPart>, PageRangeError> {
    let total = ctx.total_pages();

    let runs: Vec<ResolvedPageSet> = match method {
        SplitMethod::ByRanges(spans) => spans
            .iter()
            .map(|span| resolve(&PageSpecifier::RangeList(vec![*span]), ctx))
            .collect::<Result<_, _>>()?,
        SplitMethod::AtPages(points) => {
            let cuts: Vec<u32> = resolve(&PageSpecifier::Explicit(points.clone()), ctx)?
                .iter()
                .filter(|&page| page < total)
                .collect();
            if cuts.is_empty() {
                return Err(PageRangeError::NoValidPages);
            }

            let mut runs = Vec::with_capacity(cuts.len() + 1);
            let mut start = 1;
            for cut in cuts {
                runs.push(contiguous(start, cut, ctx)?);
                start = cut + 1;
            }
            runs.push(contiguous(start, total, ctx)?);
            runs
        }
        SplitMethod::EveryN(n) => {
            if *n == 0 {
                return Err(PageRangeError::InvalidStride);
            }
            (1..=total)
                .step_by(*n as usize)
                .map(|start| contiguous(start, start.saturating_add(n - 1), ctx))
                .collect::<Result<_, _>>()?
        }
        SplitMethod::AllPages => {
            return (1..=total)
                .map(|page| -> Result<SplitPart, PageRangeError> {
                    Ok(SplitPart {
                        label: format!("page{}", page),
                        pages: resolve(&PageSpecifier::Current(page), ctx)?,
                    })
                })
                .collect();
        }
    };

    if runs.is_empty() {
        return Err(PageRangeError::NoValidPages);
    }

    Ok(runs
        .into_iter()
        .enumerate()
        .map(|(i, pages)| SplitPart {
            label: format!("part{}_pages{}-{}", i + 1, pages.first(), pages.last()),
            pages,
        })
        .collect())
}

fn contiguous(
    start: u32,
    end: u32,
    ctx: DocumentContext,
) -> Result<ResolvedPageSet, PageRangeError> {
    resolve(
        &PageSpecifier::RangeList(vec![PageSpan::new(start, end)]),
        ctx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_range::OPEN_END;
    use pretty_assertions::assert_eq;

    fn ctx(total: u32) -> DocumentContext {
        DocumentContext::new(total).unwrap()
    }

    fn plan(method: SplitMethod, total: u32) -> Vec<(String, Vec<u32>)> {
        plan_split(&method, ctx(total))
            .unwrap()
            .into_iter()
            .map(|part| (part.label, part.pages.into_vec()))
            .collect()
    }

    #[test]
    fn test_by_ranges() {
        let parts = plan(
            SplitMethod::ByRanges(vec![PageSpan::new(1, 2), PageSpan::new(4, OPEN_END)]),
            6,
        );
        assert_eq!(
            parts,
            vec![
                ("part1_pages1-2".to_string(), vec![1, 2]),
                ("part2_pages4-6".to_string(), vec![4, 5, 6]),
            ]
        );
    }

    #[test]
    fn test_by_ranges_rejects_range_outside_document() {
        let method = SplitMethod::ByRanges(vec![PageSpan::new(1, 2), PageSpan::new(8, 9)]);
        assert_eq!(
            plan_split(&method, ctx(5)),
            Err(PageRangeError::NoValidPages)
        );

        let method = SplitMethod::ByRanges(vec![PageSpan::new(3, 1)]);
        assert_eq!(
            plan_split(&method, ctx(5)),
            Err(PageRangeError::InvalidRange { start: 3, end: 1 })
        );

        assert_eq!(
            plan_split(&SplitMethod::ByRanges(vec![]), ctx(5)),
            Err(PageRangeError::NoValidPages)
        );
    }

    #[test]
    fn test_at_pages() {
        let parts = plan(SplitMethod::AtPages(vec![6, 3, 10]), 10);
        assert_eq!(
            parts,
            vec![
                ("part1_pages1-3".to_string(), vec![1, 2, 3]),
                ("part2_pages4-6".to_string(), vec![4, 5, 6]),
                ("part3_pages7-10".to_string(), vec![7, 8, 9, 10]),
            ]
        );
    }

    #[test]
    fn test_at_last_page_only_is_an_error() {
        assert_eq!(
            plan_split(&SplitMethod::AtPages(vec![4]), ctx(4)),
            Err(PageRangeError::NoValidPages)
        );
    }

    #[test]
    fn test_every_n() {
        let parts = plan(SplitMethod::EveryN(2), 5);
        assert_eq!(
            parts,
            vec![
                ("part1_pages1-2".to_string(), vec![1, 2]),
                ("part2_pages3-4".to_string(), vec![3, 4]),
                ("part3_pages5-5".to_string(), vec![5]),
            ]
        );
        assert_eq!(
            plan_split(&SplitMethod::EveryN(0), ctx(5)),
            Err(PageRangeError::InvalidStride)
        );
    }

    #[test]
    fn test_every_n_larger_than_document() {
        let parts = plan(SplitMethod::EveryN(u32::MAX), 3);
        assert_eq!(parts, vec![("part1_pages1-3".to_string(), vec![1, 2, 3])]);
    }

    #[test]
    fn test_all_pages() {
        let parts = plan_split(&SplitMethod::AllPages, ctx(3)).unwrap();
        let names: Vec<String> = parts.iter().map(|p| p.file_name("report")).collect();
        assert_eq!(
            names,
            vec!["report_page1.pdf", "report_page2.pdf", "report_page3.pdf"]
        );
    }
}
