use serde::{Deserialize, Serialize};

/// One page of a cursor-paginated collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPage<T> {
    /// Cursor to request the following page with
    pub next_cursor: Option<String>,

    pub items: Vec<T>,

    /// Set by the server on the final page
    pub is_last: bool,
}

impl<T> DataPage<T> {
    pub fn new(next_cursor: Option<String>, items: Vec<T>, is_last: bool) -> Self {
        Self {
            next_cursor,
            items,
            is_last,
        }
    }

    /// A page with no items that terminates pagination
    pub fn last_empty() -> Self {
        Self {
            next_cursor: None,
            items: Vec::new(),
            is_last: true,
        }
    }

    /// Convert items while keeping the paging metadata
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> DataPage<U> {
        DataPage {
            next_cursor: self.next_cursor,
            items: f(self.items),
            is_last: self.is_last,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagingOrder {
    #[default]
    Asc,
    Desc,
}

/// Cursor paging parameters sent with every page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingParams {
    pub cursor: Option<String>,
    pub limit: u32,
    pub order: PagingOrder,
}

impl PagingParams {
    pub fn new(cursor: Option<String>, limit: u32) -> Self {
        Self {
            cursor,
            limit,
            order: PagingOrder::Asc,
        }
    }

    pub fn with_order(mut self, order: PagingOrder) -> Self {
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_items_keeps_cursor() {
        let page = DataPage::new(Some("42".to_string()), vec![1, 2, 3], false);
        let mapped = page.map_items(|items| items.into_iter().map(|i| i * 10).collect());

        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.next_cursor.as_deref(), Some("42"));
        assert!(!mapped.is_last);
    }

    #[test]
    fn test_paging_params_order() {
        let params = PagingParams::new(None, 10).with_order(PagingOrder::Desc);
        assert_eq!(params.order, PagingOrder::Desc);
        assert_eq!(params.limit, 10);
    }
}
