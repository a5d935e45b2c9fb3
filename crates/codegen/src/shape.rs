//! Loop shape descriptions consumed by the templates.

use serde::{Deserialize, Serialize};

/// Names and fragments a template splices into the generated loop.
/// Optional `filter`/`selector` stages only affect the query-shaped
/// strategies; the other templates fold everything into the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeShape {
    pub collection: String,
    pub item: String,
    pub index: String,
    pub body: String,
    pub filter: Option<String>,
    pub selector: Option<String>,
    pub result: String,
}

impl Default for CodeShape {
    fn default() -> Self {
        Self {
            collection: "items".to_string(),
            item: "item".to_string(),
            index: "i".to_string(),
            body: String::new(),
            filter: None,
            selector: None,
            result: "results".to_string(),
        }
    }
}

impl CodeShape {
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = item.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    /// Blank fields fall back to defaults; a blank body becomes a
    /// placeholder call so every template stays syntactically complete.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.collection.trim().is_empty() {
            self.collection = defaults.collection;
        }
        if self.item.trim().is_empty() {
            self.item = defaults.item;
        }
        if self.index.trim().is_empty() {
            self.index = defaults.index;
        }
        if self.result.trim().is_empty() {
            self.result = defaults.result;
        }
        if self.body.trim().is_empty() {
            self.body = format!("Process({});", self.item);
        }
        self.filter = self.filter.filter(|stage| !stage.trim().is_empty());
        self.selector = self.selector.filter(|stage| !stage.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_normalize_to_defaults() {
        let shape = CodeShape {
            collection: "  ".to_string(),
            item: String::new(),
            index: String::new(),
            body: String::new(),
            filter: Some("   ".to_string()),
            selector: None,
            result: String::new(),
        }
        .normalized();
        assert_eq!(shape.collection, "items");
        assert_eq!(shape.item, "item");
        assert_eq!(shape.body, "Process(item);");
        assert!(shape.filter.is_none());
    }

    #[test]
    fn populated_fields_survive_normalization() {
        let shape = CodeShape::default()
            .with_collection("users")
            .with_item("user")
            .with_body("Touch(user);")
            .with_filter("user.IsActive")
            .normalized();
        assert_eq!(shape.collection, "users");
        assert_eq!(shape.body, "Touch(user);");
        assert_eq!(shape.filter.as_deref(), Some("user.IsActive"));
    }

    #[test]
    fn placeholder_body_tracks_the_item_name() {
        let shape = CodeShape::default().with_item("row").normalized();
        assert_eq!(shape.body, "Process(row);");
    }
}
