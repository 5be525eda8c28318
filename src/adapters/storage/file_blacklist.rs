//! Loads the blacklist filter from a line-oriented file.

use std::path::Path;

use tokio::fs;

use crate::domain::filter::BlacklistFilter;
use crate::ports::ObjectStoreError;

/// Reads one id per line; blank lines are ignored.
pub async fn load_blacklist(path: impl AsRef<Path>) -> Result<BlacklistFilter, ObjectStoreError> {
    let text = fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| ObjectStoreError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    Ok(BlacklistFilter::from_lines(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_ids_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist.txt");
        tokio::fs::write(&path, "a1\n\nb2\n").await.unwrap();

        let filter = load_blacklist(&path).await.unwrap();

        assert_eq!(filter.len(), 2);
        assert!(filter.contains_line("b2"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = load_blacklist(dir.path().join("nope.txt")).await;
        assert!(matches!(result, Err(ObjectStoreError::Io(_))));
    }
}
