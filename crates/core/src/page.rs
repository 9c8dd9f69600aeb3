//! Page-number pagination over fully materialised result lists.

use serde::Serialize;

/// One page of results plus the numbers a client needs to navigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: usize,
    pub num_pages: usize,
    /// Total number of items across all pages.
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Slice `items` into the requested page.
    ///
    /// The page number is resolved leniently: a missing or non-numeric value
    /// serves page 1, anything out of range (past the end, zero or negative)
    /// serves the last page. An empty list still has one (empty) page.
    pub fn paginate(items: Vec<T>, per_page: usize, requested: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        let count = items.len();
        let num_pages = count.div_ceil(per_page).max(1);

        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 1 => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
            Some(Ok(_)) => num_pages,
            Some(Err(_)) | None => 1,
        };

        let start = (number - 1) * per_page;
        let items = items.into_iter().skip(start).take(per_page).collect();

        Self {
            items,
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_page_serves_first() {
        let page = Page::paginate((1..=12).collect(), 5, None);
        assert_eq!(page.number, 1);
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.num_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn garbage_page_serves_first() {
        let page = Page::paginate((1..=12).collect(), 5, Some("abc"));
        assert_eq!(page.number, 1);
    }

    #[test]
    fn out_of_range_page_serves_last() {
        let page = Page::paginate((1..=12).collect(), 5, Some("99"));
        assert_eq!(page.number, 3);
        assert_eq!(page.items, vec![11, 12]);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn non_positive_page_serves_last() {
        let page = Page::paginate((1..=12).collect(), 5, Some("0"));
        assert_eq!(page.number, 3);
        let page = Page::paginate((1..=12).collect(), 5, Some("-2"));
        assert_eq!(page.number, 3);
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let page = Page::<u8>::paginate(Vec::new(), 10, Some("2"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.count, 0);
        assert!(page.items.is_empty());
    }

    proptest! {
        #[test]
        fn served_page_is_always_in_range(len in 0usize..200, per_page in 1usize..20, req in any::<i64>()) {
            let items: Vec<usize> = (0..len).collect();
            let raw = req.to_string();
            let page = Page::paginate(items, per_page, Some(raw.as_str()));
            prop_assert!(page.number >= 1);
            prop_assert!(page.number <= page.num_pages);
            prop_assert!(page.items.len() <= per_page);
            prop_assert_eq!(page.count, len);
        }
    }
}
