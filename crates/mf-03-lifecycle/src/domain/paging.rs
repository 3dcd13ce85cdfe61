use serde::{Deserialize, Serialize};
use shared_types::PageRequest;

/// Page-size policy for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl PaginationConfig {
    /// Normalize client input: page ≥ 1, page size in `[1, max_page_size]`.
    #[must_use]
    pub fn resolve(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
        let page = page.unwrap_or(1).max(1);
        let size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        PageRequest::new(page, size)
    }
}
