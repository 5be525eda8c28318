//! Image content filter.

use super::{FilterError, UuidFilter};
use crate::domain::content::Content;

/// Skips documents whose `type` is `image` (case-insensitive).
///
/// Missing `type` keeps the document; missing body fails closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFilter;

impl UuidFilter for ImageFilter {
    fn requires_content(&self) -> bool {
        true
    }

    fn keep(&self, uuid: &str, content: Option<&Content>) -> Result<bool, FilterError> {
        let content = content
            .filter(|c| c.body.is_some())
            .ok_or_else(|| FilterError::MissingBody { uuid: uuid.to_string() })?;

        Ok(content
            .content_kind()
            .map(|kind| kind.to_lowercase() != "image")
            .unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::DEFAULT_CONTENT_TYPE;
    use serde_json::{json, Value};

    fn content(value: Value) -> Content {
        match value {
            Value::Object(map) => Content::new(map, DEFAULT_CONTENT_TYPE),
            _ => unreachable!(),
        }
    }

    #[test]
    fn skips_images_in_any_case() {
        let c = content(json!({"uuid": "a", "type": "Image"}));
        assert!(!ImageFilter.keep("a", Some(&c)).unwrap());
    }

    #[test]
    fn keeps_other_types() {
        let c = content(json!({"uuid": "a", "type": "Article"}));
        assert!(ImageFilter.keep("a", Some(&c)).unwrap());
    }

    #[test]
    fn keeps_untyped_content() {
        let c = content(json!({"uuid": "a"}));
        assert!(ImageFilter.keep("a", Some(&c)).unwrap());
    }

    #[test]
    fn fails_closed_without_body() {
        let c = Content::empty(DEFAULT_CONTENT_TYPE);
        assert!(ImageFilter.keep("a", Some(&c)).is_err());
        assert!(ImageFilter.keep("a", None).is_err());
    }
}
