//! Serde models for the repository metadata document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata served at the repository's API root: the publish refs plus the
/// repository's shape (document types, tags, languages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    #[serde(default)]
    pub refs: Vec<RepositoryRef>,
    #[serde(default)]
    pub languages: Vec<Language>,
    /// Document type id -> display name.
    #[serde(default)]
    pub types: HashMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RepositoryInfo {
    /// The ref queries resolve against by default.
    pub fn master_ref(&self) -> Option<&RepositoryRef> {
        self.refs.iter().find(|r| r.is_master)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub label: String,
    #[serde(default, rename = "isMasterRef")]
    pub is_master: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metadata_document() {
        let raw = r#"{
            "refs": [
                { "id": "master", "ref": "Yz8yR0IAAB8AyJLm", "label": "Master", "isMasterRef": true },
                { "id": "preview", "ref": "Yz9qqRIAAB4Az0Qe", "label": "Preview" }
            ],
            "languages": [ { "id": "en-us", "name": "English - United States" } ],
            "types": { "article": "Article", "page": "Page" },
            "tags": ["featured"]
        }"#;
        let info: RepositoryInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.refs.len(), 2);
        assert_eq!(info.master_ref().unwrap().reference, "Yz8yR0IAAB8AyJLm");
        assert!(!info.refs[1].is_master);
        assert_eq!(info.types["article"], "Article");
        assert_eq!(info.languages[0].id, "en-us");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let info: RepositoryInfo = serde_json::from_str("{}").unwrap();
        assert!(info.refs.is_empty());
        assert!(info.master_ref().is_none());
        assert!(info.tags.is_empty());
    }
}
