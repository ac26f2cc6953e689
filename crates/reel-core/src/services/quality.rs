//! Quality Catalog

use crate::{ContentId, Quality, Result};
use async_trait::async_trait;

/// Lists renditions of a content item, independent of any session
#[async_trait]
pub trait QualityCatalog: Send + Sync {
    /// GetQualities `{contentId}` -> ordered renditions
    async fn get_qualities(&self, content_id: &ContentId) -> Result<Vec<Quality>>;
}

/// Quality to select once the catalog loads: keep an existing choice, else the first entry
pub fn default_quality(current: Option<&str>, catalog: &[Quality]) -> Option<String> {
    current
        .map(str::to_string)
        .or_else(|| catalog.first().map(|q| q.quality.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(label: &str) -> Quality {
        Quality {
            quality: label.into(),
            resolution: None,
            file_size: None,
        }
    }

    #[test]
    fn test_default_is_first_entry() {
        assert_eq!(default_quality(None, &[q("1080p"), q("720p")]), Some("1080p".into()));
        assert_eq!(default_quality(None, &[]), None);
    }

    #[test]
    fn test_existing_choice_wins() {
        assert_eq!(
            default_quality(Some("720p"), &[q("1080p"), q("720p")]),
            Some("720p".into())
        );
    }
}
