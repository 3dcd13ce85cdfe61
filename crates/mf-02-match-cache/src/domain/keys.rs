//! Cache key layout.
//!
//! | Entry | Key |
//! |-------|-----|
//! | single match | `match:{id}` |
//! | list page | `matches:list:{tournament or all}:{status or all}:{page}:{page_size}` |

use shared_types::{MatchFilter, MatchId, PageRequest};

/// Prefix shared by every list-query key.
pub const LIST_PREFIX: &str = "matches:list:";

#[must_use]
pub fn match_key(id: MatchId) -> String {
    format!("match:{id}")
}

#[must_use]
pub fn list_key(filter: &MatchFilter, page: PageRequest) -> String {
    let tournament = filter
        .tournament_id
        .map_or_else(|| "all".to_string(), |t| t.to_string());
    let status = filter.status.map_or("all", |s| s.as_str());
    format!(
        "{LIST_PREFIX}{tournament}:{status}:{}:{}",
        page.page, page.page_size
    )
}
