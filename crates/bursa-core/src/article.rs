use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ArticleStatus, Category, CoreError};

/// Full article as returned by the detail and create endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author: String,
    pub is_premium: bool,
    pub views: i64,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry; omits the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author: String,
    pub is_premium: bool,
    pub views: i64,
    pub published_at: Option<DateTime<Utc>>,
}

/// Unvalidated article payload, exactly as posted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub is_premium: Option<bool>,
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Article payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub author: String,
    pub is_premium: bool,
    pub status: ArticleStatus,
    /// `Some` iff `status` is `Published`.
    pub published_at: Option<DateTime<Utc>>,
}

fn required(value: &Option<String>, field: &str) -> Result<String, CoreError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::missing_field(field))
}

impl NewArticleInput {
    /// Check required fields in declaration order and normalise the rest.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewArticle, CoreError> {
        let title = required(&self.title, "title")?;
        let excerpt = required(&self.excerpt, "excerpt")?;
        let content = required(&self.content, "content")?;
        let category_raw = required(&self.category, "category")?;
        let author = required(&self.author, "author")?;

        let category = Category::parse(&category_raw).ok_or_else(|| {
            CoreError::Validation(format!("Kategori '{}' tidak dikenal", category_raw))
        })?;

        let status = match self.status.as_deref() {
            None => ArticleStatus::Draft,
            Some(raw) => ArticleStatus::parse(raw).ok_or_else(|| {
                CoreError::Validation(format!("Status '{}' tidak dikenal", raw))
            })?,
        };

        let slug = match self.slug.as_deref().map(slugify) {
            Some(s) if !s.is_empty() => s,
            _ => slugify(&title),
        };
        if slug.is_empty() {
            return Err(CoreError::Validation(
                "Slug tidak dapat dibuat dari judul".to_string(),
            ));
        }

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.unwrap_or_default() {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let published_at = match status {
            ArticleStatus::Published => Some(self.published_at.unwrap_or(now)),
            ArticleStatus::Draft => None,
        };

        Ok(NewArticle {
            title,
            slug,
            excerpt,
            content,
            category,
            tags,
            author,
            is_premium: self.is_premium.unwrap_or(false),
            status,
            published_at,
        })
    }
}

/// URL-safe slug: lower-case ASCII alphanumerics separated by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> NewArticleInput {
        NewArticleInput {
            title: Some("IHSG Menguat 1%".to_string()),
            excerpt: Some("Ringkasan".to_string()),
            content: Some("Isi artikel".to_string()),
            category: Some("saham".to_string()),
            author: Some("Redaksi".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("IHSG Menguat 1%"), "ihsg-menguat-1");
        assert_eq!(slugify("  --Harga  Emas!! "), "harga-emas");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut input = valid_input();
        input.content = Some("   ".to_string());
        let err = input.validate(Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::Validation("Field 'content' wajib diisi".to_string()));

        let err = NewArticleInput::default().validate(Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::missing_field("title"));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut input = valid_input();
        input.category = Some("forex".to_string());
        assert!(matches!(input.validate(Utc::now()), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_draft_has_no_publish_date() {
        let mut input = valid_input();
        input.published_at = Some(Utc::now());
        let article = input.validate(Utc::now()).unwrap();
        assert_eq!(article.status, ArticleStatus::Draft);
        assert!(article.published_at.is_none());
        assert_eq!(article.slug, "ihsg-menguat-1");
    }

    #[test]
    fn test_published_defaults_publish_date_to_now() {
        let now = Utc::now();
        let mut input = valid_input();
        input.status = Some("PUBLISHED".to_string());
        input.tags = Some(vec![" Bank ".into(), "bank".into(), "".into(), "BBCA".into()]);
        let article = input.validate(now).unwrap();
        assert_eq!(article.published_at, Some(now));
        assert_eq!(article.tags, vec!["bank".to_string(), "bbca".to_string()]);
    }
}
