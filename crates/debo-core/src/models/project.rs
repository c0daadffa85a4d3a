use serde::{Deserialize, Serialize};

/// A project as listed on the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Project {
    /// Assigned by the server; omitted when creating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Project {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_omits_id() {
        let body = serde_json::to_value(Project::new("Wells", "Clean water")).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["title"], "Wells");
    }

    #[test]
    fn test_parse_project() {
        let project: Project =
            serde_json::from_str(r#"{"id": 4, "title": "School", "description": "Books"}"#).unwrap();
        assert_eq!(project.id, Some(4));
        assert_eq!(project.description, "Books");
    }
}
