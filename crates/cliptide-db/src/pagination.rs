use cliptide_types::api::Paginated;

/// A page window over a feed query. Feeds never run unbounded: a
/// missing page/limit falls back to the defaults, and the limit is
/// clamped so a client cannot request the whole collection.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        // pages are 1-based; a hand-built page 0 reads like page 1
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Wrap a fetched slice and its total count into the response
    /// envelope. `total_pages` is a ceiling division; an empty
    /// collection still reports page metadata consistently.
    pub fn wrap<T>(self, items: Vec<T>, total_items: i64) -> Paginated<T> {
        let total_items = total_items.max(0) as u64;
        let total_pages = total_items.div_ceil(u64::from(self.limit));
        Paginated {
            items,
            page: self.page,
            limit: self.limit,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = Page::new(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);

        let p = Page::new(Some(0), Some(0));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);

        let p = Page::new(Some(3), Some(500));
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, MAX_LIMIT);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn literal_page_zero_does_not_underflow() {
        let p = Page { page: 0, limit: 10 };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn wrap_computes_total_pages() {
        let p = Page::new(Some(1), Some(10));
        let out = p.wrap(vec![1, 2, 3], 23);
        assert_eq!(out.total_items, 23);
        assert_eq!(out.total_pages, 3);

        let exact = Page::new(Some(2), Some(10)).wrap(Vec::<i32>::new(), 20);
        assert_eq!(exact.total_pages, 2);

        let empty = Page::new(Some(9), Some(10)).wrap(Vec::<i32>::new(), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
