//! Pagination for list endpoints.

/// Pagination parameters
#[derive(Clone, Copy, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Cut one page out of an already ordered list.
    pub fn slice<T>(self, items: Vec<T>) -> Vec<T> {
        let (idx, per) = self.normalize();
        items.into_iter().skip((idx * per) as usize).take(per as usize).collect()
    }

    pub fn wrap<T>(self, items: Vec<T>) -> common::types::Page<T> {
        let (idx, per) = self.normalize();
        common::types::Page { items, page: idx as u32 + 1, per_page: per as u32 }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}
