use crate::api::PageInfo;

/// Most page buttons shown at once.
const WINDOW: u32 = 5;

/// Pagination control derived from the current page and the API envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    /// Page numbers to offer, starting two before the current page.
    pub window: Vec<u32>,
}

impl Pagination {
    pub fn new(page: u32, info: &PageInfo) -> Self {
        let start = page.saturating_sub(2).max(1);
        // `page` comes from the location and may lie far past `info.pages`
        let window = (start..start.saturating_add(WINDOW.min(info.pages)))
            .filter(|n| *n <= info.pages)
            .collect();
        Self {
            page,
            pages: info.pages,
            has_prev: page > 1,
            has_next: info.next.is_some(),
            window,
        }
    }

    /// Hidden for single-page results and in the favorites view.
    pub fn is_visible(&self, favorites_only: bool) -> bool {
        self.pages > 1 && !favorites_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(pages: u32, page: u32) -> PageInfo {
        PageInfo {
            count: pages * 20,
            pages,
            next: (page < pages).then(|| format!("https://example.test/?page={}", page + 1)),
            prev: (page > 1).then(|| format!("https://example.test/?page={}", page - 1)),
        }
    }

    #[test]
    fn test_first_of_three_pages() {
        let p = Pagination::new(1, &info(3, 1));
        assert!(!p.has_prev);
        assert!(p.has_next);
        assert_eq!(p.window, vec![1, 2, 3]);
    }

    #[test]
    fn test_last_of_three_pages() {
        let p = Pagination::new(3, &info(3, 3));
        assert!(p.has_prev);
        assert!(!p.has_next);
        assert_eq!(p.window, vec![1, 2, 3]);
    }

    #[test]
    fn test_window_centers_and_clips() {
        assert_eq!(Pagination::new(10, &info(42, 10)).window, vec![8, 9, 10, 11, 12]);
        assert_eq!(Pagination::new(41, &info(42, 41)).window, vec![39, 40, 41, 42]);
        assert_eq!(Pagination::new(2, &info(42, 2)).window, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_page_past_the_end_does_not_overflow() {
        let p = Pagination::new(u32::MAX, &info(42, 42));
        assert!(p.window.is_empty());
        assert!(p.has_prev);
        assert!(!p.has_next);

        assert!(Pagination::new(u32::MAX - 1, &info(42, 42)).window.is_empty());
    }

    #[test]
    fn test_visibility() {
        assert!(!Pagination::new(1, &info(1, 1)).is_visible(false));
        assert!(Pagination::new(1, &info(2, 1)).is_visible(false));
        assert!(!Pagination::new(1, &info(2, 1)).is_visible(true));
    }
}
