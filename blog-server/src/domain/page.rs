use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 50;

/// 1-based page position, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let has_next = request.offset() + (items.len() as i64) < total;
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
            has_next,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let req = PageRequest::new(None, None);
        assert_eq!((req.page, req.page_size), (1, DEFAULT_PAGE_SIZE));
        let req = PageRequest::new(Some(0), Some(10_000));
        assert_eq!((req.page, req.page_size), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(5)).offset(), 10);
    }

    #[test]
    fn test_has_next() {
        let req = PageRequest::new(Some(1), Some(2));
        assert!(Page::new(vec![1, 2], req, 3).has_next);
        let req = PageRequest::new(Some(2), Some(2));
        assert!(!Page::new(vec![3], req, 3).has_next);
    }
}
