pub mod catalog;
pub mod events;
pub mod orders;

use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl PageParams {
    pub fn clamped(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, 100))
    }
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::PageParams;

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.clamped(), (1, 20));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let params = PageParams { page: 0, limit: 5000 };
        assert_eq!(params.clamped(), (1, 100));
        let params = PageParams { page: -3, limit: 0 };
        assert_eq!(params.clamped(), (1, 1));
    }
}
