use serde::Serialize;

/// Page-number pagination for the HTML search page. Out-of-range or
/// malformed page numbers are clamped instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn resolve(raw_page: Option<&str>, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = num_pages(total, per_page);
        let number = raw_page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1);
        let number = if number < 1 {
            1
        } else {
            number.min(num_pages)
        };
        Self { number, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }
}

/// At least one page, even when there are no results.
pub fn num_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: i64,
    pub next_page: i64,
}

impl PageInfo {
    pub fn new(page: PageRequest, count: i64) -> Self {
        let num_pages = num_pages(count, page.per_page);
        Self {
            number: page.number,
            num_pages,
            count,
            has_previous: page.number > 1,
            has_next: page.number < num_pages,
            previous_page: (page.number - 1).max(1),
            next_page: (page.number + 1).min(num_pages),
        }
    }
}

/// Limit/offset pagination for the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

/// Upper bound for a client-supplied `limit`.
pub const MAX_LIMIT: i64 = 100;

impl LimitOffset {
    /// Unparsable or non-positive values fall back to the defaults rather
    /// than failing the request.
    pub fn new(limit: Option<&str>, offset: Option<&str>, default_limit: i64) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());
        Self {
            limit: parse(limit)
                .filter(|l| *l > 0)
                .unwrap_or(default_limit)
                .clamp(1, MAX_LIMIT),
            offset: parse(offset).unwrap_or(0).max(0),
        }
    }

    /// `base_query` is the request query string without limit/offset.
    pub fn next_link(&self, path: &str, base_query: &str, count: i64) -> Option<String> {
        let next = self.offset.saturating_add(self.limit);
        if next >= count {
            return None;
        }
        Some(link(path, base_query, self.limit, next))
    }

    pub fn previous_link(&self, path: &str, base_query: &str) -> Option<String> {
        if self.offset <= 0 {
            return None;
        }
        Some(link(path, base_query, self.limit, self.offset.saturating_sub(self.limit).max(0)))
    }
}

fn link(path: &str, base_query: &str, limit: i64, offset: i64) -> String {
    if base_query.is_empty() {
        format!("{}?limit={}&offset={}", path, limit, offset)
    } else {
        format!("{}?{}&limit={}&offset={}", path, base_query, limit, offset)
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps_past_end() {
        let page = PageRequest::resolve(Some("9"), 25, 60);
        assert_eq!(page.number, 3);
        assert_eq!(page.offset(), 50);
    }

    #[test]
    fn test_page_defaults_on_garbage() {
        assert_eq!(PageRequest::resolve(Some("abc"), 25, 60).number, 1);
        assert_eq!(PageRequest::resolve(Some("-2"), 25, 60).number, 1);
        assert_eq!(PageRequest::resolve(None, 25, 0).number, 1);
    }

    #[test]
    fn test_page_info_neighbours() {
        let info = PageInfo::new(PageRequest::resolve(Some("2"), 25, 60), 60);
        assert_eq!(info.num_pages, 3);
        assert!(info.has_previous && info.has_next);
        assert_eq!(info.previous_page, 1);
        assert_eq!(info.next_page, 3);
    }

    #[test]
    fn test_limit_offset_links() {
        let lo = LimitOffset::new(None, Some("7"), 7);
        assert_eq!(
            lo.next_link("/api/search/", "mood=2", 20).as_deref(),
            Some("/api/search/?mood=2&limit=7&offset=14")
        );
        assert_eq!(
            lo.previous_link("/api/search/", "").as_deref(),
            Some("/api/search/?limit=7&offset=0")
        );
    }

    #[test]
    fn test_limit_offset_last_page_has_no_next() {
        let lo = LimitOffset::new(Some("10"), Some("10"), 7);
        assert_eq!(lo.next_link("/api/search/", "", 20), None);
        assert!(LimitOffset::new(None, None, 7)
            .previous_link("/api/search/", "")
            .is_none());
    }

    #[test]
    fn test_limit_offset_huge_offset_does_not_overflow() {
        let lo = LimitOffset::new(Some("7"), Some("9223372036854775807"), 7);
        assert_eq!(lo.offset, i64::MAX);
        assert_eq!(lo.next_link("/api/search/", "", 3), None);
        assert_eq!(
            lo.previous_link("/api/search/", "").as_deref(),
            Some("/api/search/?limit=7&offset=9223372036854775800")
        );
    }

    #[test]
    fn test_limit_offset_lenient_parsing() {
        let lo = LimitOffset::new(Some("abc"), Some("-5"), 7);
        assert_eq!(lo, LimitOffset { limit: 7, offset: 0 });

        let lo = LimitOffset::new(Some("100000"), Some("x"), 7);
        assert_eq!(lo, LimitOffset { limit: MAX_LIMIT, offset: 0 });
    }
}
