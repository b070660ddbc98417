//! Filters shared by the news and event listings.

use uuid::Uuid;

/// Listing filter. Public listings leave `include_drafts` off, which hides
/// unpublished and soft-deleted rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFilter {
    pub tenant_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub include_drafts: bool,
    /// Events only: hide events that already ended.
    pub upcoming: bool,
}

impl ContentFilter {
    pub fn public() -> Self { Self::default() }

    pub fn admin(tenant_id: Option<Uuid>) -> Self {
        Self { tenant_id, include_drafts: true, ..Self::default() }
    }

    pub(crate) fn admits(&self, tenant_id: Option<Uuid>, category_id: Option<Uuid>, published: bool, active: bool) -> bool {
        if self.tenant_id.is_some() && self.tenant_id != tenant_id {
            return false;
        }
        if self.category_id.is_some() && self.category_id != category_id {
            return false;
        }
        self.include_drafts || (published && active)
    }
}
