//! News article model and validated create/update inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Rating, RatingSummary, ValidationError};

/// Maximum length for titles and sources
const MAX_TITLE_LEN: usize = 256;

/// Maximum length for category names
const MAX_CATEGORY_LEN: usize = 64;

/// Maximum length for descriptions
const MAX_DESCRIPTION_LEN: usize = 10_000;

/// News article identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewsId(pub Uuid);

impl NewsId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id taken from a request path.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(s).map(Self).map_err(|_| ValidationError::InvalidFormat {
            field: "id",
            reason: "invalid UUID format",
        })
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for NewsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored news article, ratings included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: NewsId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub source: Option<String>,
    pub ratings: Vec<Rating>,
    pub num_reviews: i64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl News {
    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            num_reviews: self.num_reviews,
            average_rating: self.average_rating,
        }
    }
}

/// Validated input for creating an article.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNews {
    pub title: String,
    pub description: String,
    pub category: String,
    pub source: Option<String>,
}

impl NewNews {
    /// Validate raw create fields.
    ///
    /// # Rules
    /// - `title`, `description`, `category` required and non-blank
    /// - `source` optional; blank counts as absent
    /// - Surrounding whitespace is trimmed
    ///
    /// # Example
    /// ```
    /// use newsdesk_server::models::NewNews;
    ///
    /// assert!(NewNews::new("Title", "Body", "tech", None).is_ok());
    /// assert!(NewNews::new("", "Body", "tech", None).is_err());
    /// ```
    pub fn new(
        title: &str,
        description: &str,
        category: &str,
        source: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: title_field(title)?,
            description: description_field(description)?,
            category: category_field(category)?,
            source: source_field(source)?,
        })
    }
}

/// Validated partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// `Some(None)` clears the source.
    pub source: Option<Option<String>>,
}

impl NewsPatch {
    pub fn new(
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        source: Option<Option<&str>>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: title.map(title_field).transpose()?,
            description: description.map(description_field).transpose()?,
            category: category.map(category_field).transpose()?,
            source: source.map(source_field).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.source.is_none()
    }

    /// Apply the patch to an in-memory article.
    pub fn apply_to(&self, news: &mut News) {
        if let Some(title) = &self.title {
            news.title = title.clone();
        }
        if let Some(description) = &self.description {
            news.description = description.clone();
        }
        if let Some(category) = &self.category {
            news.category = category.clone();
        }
        if let Some(source) = &self.source {
            news.source = source.clone();
        }
    }
}

fn required(field: &'static str, s: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn title_field(s: &str) -> Result<String, ValidationError> {
    required("title", s, MAX_TITLE_LEN)
}

fn description_field(s: &str) -> Result<String, ValidationError> {
    required("description", s, MAX_DESCRIPTION_LEN)
}

fn category_field(s: &str) -> Result<String, ValidationError> {
    required("category", s, MAX_CATEGORY_LEN)
}

fn source_field(s: Option<&str>) -> Result<Option<String>, ValidationError> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(source) => required("source", source, MAX_TITLE_LEN).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> News {
        let now = Utc::now();
        News {
            id: NewsId::new_v4(),
            title: "Old".into(),
            description: "Old body".into(),
            category: "world".into(),
            source: Some("wire".into()),
            ratings: vec![],
            num_reviews: 0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_news_trims_fields() {
        let news = NewNews::new("  Title ", " Body ", " tech ", Some("  Reuters ")).unwrap();
        assert_eq!(news.title, "Title");
        assert_eq!(news.description, "Body");
        assert_eq!(news.category, "tech");
        assert_eq!(news.source.as_deref(), Some("Reuters"));
    }

    #[test]
    fn blank_source_is_none() {
        let news = NewNews::new("Title", "Body", "tech", Some("   ")).unwrap();
        assert_eq!(news.source, None);
    }

    #[test]
    fn rejects_missing_required_fields() {
        assert_eq!(
            NewNews::new("   ", "Body", "tech", None).unwrap_err(),
            ValidationError::Empty { field: "title" }
        );
        assert_eq!(
            NewNews::new("Title", "", "tech", None).unwrap_err(),
            ValidationError::Empty { field: "description" }
        );
        assert_eq!(
            NewNews::new("Title", "Body", "", None).unwrap_err(),
            ValidationError::Empty { field: "category" }
        );
    }

    #[test]
    fn rejects_long_category() {
        let long = "c".repeat(65);
        let err = NewNews::new("Title", "Body", &long, None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 64, .. }));
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut news = sample();
        let patch = NewsPatch::new(Some("New"), None, None, Some(None)).unwrap();
        patch.apply_to(&mut news);
        assert_eq!(news.title, "New");
        assert_eq!(news.description, "Old body");
        assert_eq!(news.category, "world");
        assert_eq!(news.source, None);
    }

    #[test]
    fn empty_patch() {
        let patch = NewsPatch::new(None, None, None, None).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_validates_present_fields() {
        let err = NewsPatch::new(Some(""), None, None, None).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "title" });
    }

    #[test]
    fn parse_id() {
        let id = NewsId::new_v4();
        assert_eq!(NewsId::parse(&id.to_string()).unwrap(), id);
        assert!(matches!(
            NewsId::parse("not-a-uuid"),
            Err(ValidationError::InvalidFormat { field: "id", .. })
        ));
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("numReviews").is_some());
        assert!(value.get("averageRating").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
