use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_page_size() -> u32 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if self.page_size < 1 || self.page_size > 100 {
            return Err("page_size must be between 1 and 100".to_string());
        }
        Ok(())
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, page_size: u32, total_items: i64) -> Self {
        let total_pages = ((total_items as f64) / (page_size as f64)).ceil() as u32;
        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, page_size: u32, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, page_size, total_items),
        }
    }

    /// Slices an already computed, fully ordered list.
    pub fn from_items(items: Vec<T>, params: &PaginationParams) -> Self {
        let total_items = items.len() as i64;
        let data = items
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .collect();

        Self::new(data, params.page, params.page_size, total_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_items_slices_requested_page() {
        let params = PaginationParams {
            page: 2,
            page_size: 3,
        };
        let response = PaginatedResponse::from_items((1..=8).collect::<Vec<_>>(), &params);

        assert_eq!(response.data, vec![4, 5, 6]);
        assert_eq!(response.pagination.total_items, 8);
        assert_eq!(response.pagination.total_pages, 3);
    }

    #[test]
    fn test_pagination_validation() {
        assert!(PaginationParams::default().validate().is_ok());
        assert!(PaginationParams { page: 0, page_size: 10 }.validate().is_err());
        assert!(PaginationParams { page: 1, page_size: 101 }.validate().is_err());
    }
}
