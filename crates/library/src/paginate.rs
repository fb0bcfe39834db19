use forge_catalog::AssetEntry;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An immutable snapshot of search results, revealed one page at a time.
///
/// Every search produces a new result set, so the reveal cursor starts over
/// with each query. Revealing hands out slices of the snapshot and never
/// changes it; any number of readers can hold windows at once.
#[derive(Debug)]
pub struct ResultSet {
    results: Arc<[AssetEntry]>,
    page_size: usize,
    revealed: AtomicUsize,
    in_flight: AtomicBool,
}

impl ResultSet {
    pub fn new(results: impl Into<Arc<[AssetEntry]>>, page_size: usize) -> Self {
        Self {
            results: results.into(),
            page_size: page_size.max(1),
            revealed: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// How many results the display surface has been handed so far.
    pub fn revealed(&self) -> usize {
        self.revealed.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.revealed() >= self.len()
    }

    /// The page of results starting at `offset`; empty past the end.
    pub fn page(&self, offset: usize) -> &[AssetEntry] {
        let start = offset.min(self.results.len());
        let end = offset.saturating_add(self.page_size).min(self.results.len());
        &self.results[start..end]
    }

    /// The first page. Marks it as revealed.
    pub fn first_page(&self) -> &[AssetEntry] {
        let window = self.page(0);
        self.revealed.fetch_max(window.len(), Ordering::AcqRel);
        window
    }

    /// Reveal the next page.
    ///
    /// Returns `None` when everything has been revealed, or when another
    /// reveal is still in progress (its [`Reveal`] hasn't been dropped yet).
    /// A request that finds a reveal in progress is dropped, not queued.
    pub fn reveal_more(&self) -> Option<Reveal<'_>> {
        if self.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::trace!("Reveal already in progress");
            return None;
        }
        let offset = self.revealed();
        let window = self.page(offset);
        if window.is_empty() {
            self.in_flight.store(false, Ordering::Release);
            return None;
        }
        self.revealed.store(offset + window.len(), Ordering::Release);
        Some(Reveal { set: self, offset, window })
    }
}

/// A page handed out by [`ResultSet::reveal_more`].
///
/// While it is alive, further reveals on the same result set are no-ops.
/// Drop it once the page has been rendered.
#[derive(Debug)]
pub struct Reveal<'a> {
    set: &'a ResultSet,
    offset: usize,
    window: &'a [AssetEntry],
}
impl Reveal<'_> {
    /// Position of the first entry of this page within the results.
    pub fn offset(&self) -> usize {
        self.offset
    }
}
impl Deref for Reveal<'_> {
    type Target = [AssetEntry];

    fn deref(&self) -> &Self::Target {
        self.window
    }
}
impl Drop for Reveal<'_> {
    fn drop(&mut self) {
        self.set.in_flight.store(false, Ordering::Release);
    }
}
