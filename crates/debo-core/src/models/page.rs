use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_envelope() {
        let json = r#"{"count": 3, "next": "https://debo-ethiopia-api.onrender.com/api/projects?page=2", "previous": null, "results": [1, 2]}"#;
        let page: Page<u32> = serde_json::from_str(json).expect("Failed to parse page JSON");

        assert_eq!(page.count, 3);
        assert!(page.has_next());
        assert!(page.previous.is_none());
        assert_eq!(page.results, vec![1, 2]);
    }

    #[test]
    fn test_last_page() {
        let json = r#"{"count": 0, "next": null, "previous": null, "results": []}"#;
        let page: Page<u32> = serde_json::from_str(json).unwrap();
        assert!(!page.has_next());
        assert!(page.is_empty());
    }
}
