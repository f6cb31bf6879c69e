//! Pagination coordinator shared by every listing source.
//!
//! Given a filter selection and a requested page, the coordinator resolves
//! the filters, fetches that page from the upstream, and derives the page
//! count, the window of page numbers to offer for direct navigation and
//! which of first/prev/next/last are usable. The requested page is sent
//! upstream as-is; navigation state is always derived from the total count
//! returned by that same call.

use log::{debug, warn};
use serde::Serialize;

use crate::api::client::ListingSource;
use crate::api::types::{ListingRecord, SourceKind};
use crate::error::Result;
use crate::filters::{FilterSelection, QueryResolver};
use crate::normalize::LookupTable;

/// Rows requested per page for interactive browsing
pub const ROWS_PER_PAGE: u32 = 10;

/// Number of page numbers offered for direct navigation
pub const PAGE_WINDOW_SIZE: u32 = 5;

/// Number of pages needed for `total_count` rows, never less than 1
pub fn total_pages(total_count: u64, rows_per_page: u32) -> u32 {
    if rows_per_page == 0 {
        return 1;
    }
    let pages = total_count.div_ceil(u64::from(rows_per_page));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Coerce user input into a page number (anything invalid becomes 1)
pub fn coerce_page(input: &str) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Inclusive range of page numbers shown as quick-jump controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
}

impl PageWindow {
    /// Window of `size` pages around `current`, clamped to `[1, total_pages]`.
    ///
    /// Near either edge the window slides instead of shrinking, so it always
    /// holds `min(total_pages, size)` pages.
    pub fn compute(current: u32, total_pages: u32, size: u32) -> Self {
        let total = i64::from(total_pages.max(1));
        let size = i64::from(size.max(1));
        let current = i64::from(current.max(1));
        let half = size / 2;

        let mut start = (current - half).max(1);
        let end = total.min(start + size - 1);
        if end - start + 1 < size {
            start = (end - size + 1).max(1);
        }

        // both bounds lie in [1, total_pages], so the casts cannot truncate
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    pub fn pages(&self) -> Vec<u32> {
        (self.start..=self.end).collect()
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

/// Enablement of the navigation controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavState {
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
    /// Whether the pagination controls are shown at all
    pub visible: bool,
}

impl NavState {
    pub fn compute(current_page: u32, total_pages: u32) -> Self {
        let back = current_page > 1;
        let forward = current_page < total_pages;
        Self {
            first: back,
            prev: back,
            next: forward,
            last: forward,
            visible: total_pages > 1,
        }
    }

    /// Everything disabled and hidden
    pub fn disabled() -> Self {
        Self {
            first: false,
            prev: false,
            next: false,
            last: false,
            visible: false,
        }
    }

    pub fn allows(&self, nav: Navigation) -> bool {
        match nav {
            Navigation::First => self.first,
            Navigation::Prev => self.prev,
            Navigation::Next => self.next,
            Navigation::Last => self.last,
            Navigation::Jump(_) => true,
        }
    }
}

/// A pagination action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Prev,
    Next,
    Last,
    Jump(u32),
}

/// One rendered page of results
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub source: SourceKind,
    pub filters: FilterSelection,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub rows_per_page: u32,
    pub window: PageWindow,
    pub nav: NavState,
    pub lookup: LookupTable,
    /// Why the view is empty, when the fetch failed
    pub error: Option<String>,
}

impl PageView {
    /// Safe empty state used when anything in the fetch fails
    pub fn fallback(source: SourceKind, filters: FilterSelection, rows_per_page: u32, error: impl Into<String>) -> Self {
        Self {
            source,
            filters,
            current_page: 1,
            total_pages: 1,
            total_count: 0,
            rows_per_page,
            window: PageWindow { start: 1, end: 1 },
            nav: NavState::disabled(),
            lookup: LookupTable::default(),
            error: Some(error.into()),
        }
    }

    pub fn records(&self) -> &[ListingRecord] {
        self.lookup.records()
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Navigation state kept between pagination actions.
///
/// Created on the first search, updated after every page load, and
/// replaced when the user submits new filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub filters: FilterSelection,
    pub current_page: u32,
    pub total_pages: u32,
    pub window_start: u32,
    pub window_end: u32,
}

impl PageState {
    pub fn new(filters: FilterSelection) -> Self {
        Self {
            filters,
            current_page: 1,
            total_pages: 1,
            window_start: 1,
            window_end: 1,
        }
    }

    /// Page to request for a navigation action. Not clamped to
    /// `total_pages`; the next load recomputes the controls.
    pub fn target(&self, nav: Navigation) -> u32 {
        match nav {
            Navigation::First => 1,
            Navigation::Prev => self.current_page.saturating_sub(1).max(1),
            Navigation::Next => self.current_page.saturating_add(1),
            Navigation::Last => self.total_pages.max(1),
            Navigation::Jump(page) => page.max(1),
        }
    }

    /// Adopt the outcome of a page load
    pub fn apply(&mut self, view: &PageView) {
        self.current_page = view.current_page;
        self.total_pages = view.total_pages;
        self.window_start = view.window.start;
        self.window_end = view.window.end;
    }

    pub fn nav(&self) -> NavState {
        NavState::compute(self.current_page, self.total_pages)
    }
}

/// Pagination coordinator over one listing source
pub struct Paginator<'a> {
    source: &'a dyn ListingSource,
    resolver: &'a dyn QueryResolver,
    rows_per_page: u32,
    window_size: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn ListingSource, resolver: &'a dyn QueryResolver) -> Self {
        Self {
            source,
            resolver,
            rows_per_page: ROWS_PER_PAGE,
            window_size: PAGE_WINDOW_SIZE,
        }
    }

    pub fn with_rows_per_page(mut self, rows: u32) -> Self {
        self.rows_per_page = rows.max(1);
        self
    }

    pub fn with_window_size(mut self, size: u32) -> Self {
        self.window_size = size.max(1);
        self
    }

    /// Load `requested_page` for `filters`.
    ///
    /// Never fails: any error while resolving filters or fetching yields
    /// [`PageView::fallback`] and is logged.
    pub async fn compute_page(&self, filters: &FilterSelection, requested_page: u32) -> PageView {
        match self.try_compute_page(filters, requested_page).await {
            Ok(view) => view,
            Err(e) => {
                warn!(
                    "[{:?}] page {} for '{}' failed: {}",
                    self.source.kind(),
                    requested_page,
                    filters.describe(),
                    e
                );
                PageView::fallback(self.source.kind(), filters.clone(), self.rows_per_page, e.to_string())
            }
        }
    }

    /// Load the page a navigation action points at
    pub async fn navigate(&self, state: &mut PageState, nav: Navigation) -> PageView {
        let target = state.target(nav);
        let view = self.compute_page(&state.filters, target).await;
        state.apply(&view);
        view
    }

    async fn try_compute_page(&self, filters: &FilterSelection, requested_page: u32) -> Result<PageView> {
        let page = requested_page.max(1);
        let query = self.resolver.resolve(filters).await?;
        let fetch = self.source.fetch_page(&query, page, self.rows_per_page).await?;

        let total_pages = total_pages(fetch.total_count, self.rows_per_page);
        let window = PageWindow::compute(page, total_pages, self.window_size);
        let nav = NavState::compute(page, total_pages);
        debug!(
            "page {}/{} ({} rows total), window {:?}",
            page, total_pages, fetch.total_count, window
        );

        Ok(PageView {
            source: self.source.kind(),
            filters: filters.clone(),
            current_page: page,
            total_pages,
            total_count: fetch.total_count,
            rows_per_page: self.rows_per_page,
            window,
            nav,
            lookup: LookupTable::from_records(fetch.records),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ListingQuery, PageFetch};
    use crate::error::TourError;
    use crate::filters::NoFilters;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn test_total_pages_ceil_and_floor() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
        assert_eq!(total_pages(1000, 100), 10);
        assert_eq!(total_pages(5, 0), 1);
    }

    #[test]
    fn test_total_pages_property() {
        for total_count in 0..500u64 {
            let expected = ((total_count + 9) / 10).max(1) as u32;
            assert_eq!(total_pages(total_count, 10), expected, "count {total_count}");
        }
    }

    #[test]
    fn test_window_examples() {
        assert_eq!(PageWindow::compute(1, 10, 5).pages(), vec![1, 2, 3, 4, 5]);
        assert_eq!(PageWindow::compute(10, 10, 5).pages(), vec![6, 7, 8, 9, 10]);
        assert_eq!(PageWindow::compute(7, 10, 5).pages(), vec![5, 6, 7, 8, 9]);
        assert_eq!(PageWindow::compute(2, 10, 5).pages(), vec![1, 2, 3, 4, 5]);
        assert_eq!(PageWindow::compute(9, 10, 5).pages(), vec![6, 7, 8, 9, 10]);
        assert_eq!(PageWindow::compute(1, 1, 5).pages(), vec![1]);
        assert_eq!(PageWindow::compute(2, 3, 5).pages(), vec![1, 2, 3]);
        assert_eq!(PageWindow::compute(1, 0, 5).pages(), vec![1]);
    }

    #[test]
    fn test_window_beyond_last_page_snaps_to_end() {
        assert_eq!(PageWindow::compute(15, 10, 5).pages(), vec![6, 7, 8, 9, 10]);
        assert_eq!(PageWindow::compute(4, 2, 5).pages(), vec![1, 2]);
    }

    #[test]
    fn test_window_properties() {
        for total in 1..=30u32 {
            for requested in 1..=35u32 {
                let window = PageWindow::compute(requested, total, PAGE_WINDOW_SIZE);
                assert_eq!(window.len(), total.min(PAGE_WINDOW_SIZE) as usize, "p={requested} t={total}");
                assert!(window.start >= 1 && window.end <= total);
                if requested <= total {
                    assert!(window.contains(requested), "p={requested} t={total}");
                }
            }
        }
    }

    #[test]
    fn test_nav_state() {
        let first = NavState::compute(1, 10);
        assert!(!first.first && !first.prev && first.next && first.last && first.visible);

        let last = NavState::compute(10, 10);
        assert!(last.first && last.prev && !last.next && !last.last);

        let only = NavState::compute(1, 1);
        assert_eq!(only, NavState::disabled());

        for total in 1..=12u32 {
            for current in 1..=12u32 {
                let nav = NavState::compute(current, total);
                assert_eq!(nav.first, nav.prev);
                assert_eq!(nav.next, nav.last);
                assert_eq!(nav.first, current > 1);
                assert_eq!(nav.next, current < total);
            }
        }
    }

    #[test]
    fn test_coerce_page() {
        assert_eq!(coerce_page("3"), 3);
        assert_eq!(coerce_page(" 12 "), 12);
        assert_eq!(coerce_page("0"), 1);
        assert_eq!(coerce_page("-4"), 1);
        assert_eq!(coerce_page("abc"), 1);
    }

    #[test]
    fn test_page_state_targets() {
        let mut state = PageState::new(FilterSelection::new("서울"));
        state.current_page = 4;
        state.total_pages = 10;
        assert_eq!(state.target(Navigation::First), 1);
        assert_eq!(state.target(Navigation::Prev), 3);
        assert_eq!(state.target(Navigation::Next), 5);
        assert_eq!(state.target(Navigation::Last), 10);
        assert_eq!(state.target(Navigation::Jump(0)), 1);
        assert_eq!(state.target(Navigation::Jump(42)), 42);

        state.current_page = 1;
        assert_eq!(state.target(Navigation::Prev), 1);
    }

    struct FakeSource {
        total_count: u64,
        fail: bool,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn new(total_count: u64) -> Self {
            Self {
                total_count,
                fail: false,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListingSource for FakeSource {
        async fn fetch_page(&self, _query: &ListingQuery, page: u32, rows: u32) -> Result<PageFetch> {
            self.requested.lock().unwrap().push(page);
            if self.fail {
                return Err(TourError::ServerError("503".into()));
            }
            let first = (page - 1) * rows;
            let records = (first..first + rows)
                .filter(|i| u64::from(*i) < self.total_count)
                .map(|i| ListingRecord::new(format!("관광지 {}", i + 1), Some(i.to_string()), Some("12".into())))
                .collect();
            Ok(PageFetch {
                records,
                total_count: self.total_count,
            })
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Tour
        }
    }

    #[tokio::test]
    async fn test_compute_page_scenarios() {
        let source = FakeSource::new(95);
        let paginator = Paginator::new(&source, &NoFilters);
        let filters = FilterSelection::new("서울");

        let view = paginator.compute_page(&filters, 1).await;
        assert_eq!(view.total_pages, 10);
        assert_eq!(view.window.pages(), vec![1, 2, 3, 4, 5]);
        assert!(!view.nav.first && !view.nav.prev && view.nav.next && view.nav.last);
        assert_eq!(view.records().len(), 10);

        let view = paginator.compute_page(&filters, 10).await;
        assert_eq!(view.window.pages(), vec![6, 7, 8, 9, 10]);
        assert!(view.nav.first && view.nav.prev && !view.nav.next && !view.nav.last);
        assert_eq!(view.records().len(), 5);

        let view = paginator.compute_page(&filters, 7).await;
        assert_eq!(view.window.pages(), vec![5, 6, 7, 8, 9]);
    }

    #[tokio::test]
    async fn test_empty_result_hides_pagination() {
        let source = FakeSource::new(0);
        let paginator = Paginator::new(&source, &NoFilters);
        let view = paginator.compute_page(&FilterSelection::new("세종"), 1).await;
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.window.pages(), vec![1]);
        assert!(!view.nav.visible);
        assert!(!view.is_fallback());
    }

    #[tokio::test]
    async fn test_request_beyond_total_is_sent_unclamped() {
        let source = FakeSource::new(25);
        let paginator = Paginator::new(&source, &NoFilters);
        let view = paginator.compute_page(&FilterSelection::new("서울"), 9).await;
        assert_eq!(*source.requested.lock().unwrap(), vec![9]);
        assert_eq!(view.current_page, 9);
        assert_eq!(view.total_pages, 3);
        assert!(!view.nav.next && !view.nav.last);
        assert!(view.nav.prev);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_safe_state() {
        let mut source = FakeSource::new(95);
        source.fail = true;
        let paginator = Paginator::new(&source, &NoFilters);
        let view = paginator.compute_page(&FilterSelection::new("서울"), 4).await;
        assert!(view.is_fallback());
        assert_eq!(view.current_page, 1);
        assert_eq!(view.total_pages, 1);
        assert!(view.records().is_empty());
        assert_eq!(view.nav, NavState::disabled());
    }

    #[tokio::test]
    async fn test_custom_rows_and_window() {
        let source = FakeSource::new(95);
        let paginator = Paginator::new(&source, &NoFilters)
            .with_rows_per_page(20)
            .with_window_size(3);
        let view = paginator.compute_page(&FilterSelection::new("서울"), 5).await;
        assert_eq!(view.total_pages, 5);
        assert_eq!(view.rows_per_page, 20);
        assert_eq!(view.window.pages(), vec![3, 4, 5]);
        assert_eq!(view.records().len(), 15);
    }

    #[tokio::test]
    async fn test_navigate_updates_state() {
        let source = FakeSource::new(95);
        let paginator = Paginator::new(&source, &NoFilters);
        let mut state = PageState::new(FilterSelection::new("서울"));

        paginator.navigate(&mut state, Navigation::First).await;
        assert_eq!((state.current_page, state.total_pages), (1, 10));

        paginator.navigate(&mut state, Navigation::Last).await;
        assert_eq!(state.current_page, 10);
        assert_eq!((state.window_start, state.window_end), (6, 10));
        assert!(!state.nav().next);

        paginator.navigate(&mut state, Navigation::Prev).await;
        assert_eq!(state.current_page, 9);

        paginator.navigate(&mut state, Navigation::Jump(3)).await;
        assert_eq!((state.window_start, state.window_end), (1, 5));
    }
}
