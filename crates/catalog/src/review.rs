use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devcamper_core::{DocumentId, DomainResult, Entity, FieldErrors};
use devcamper_query::Schema;

pub const TITLE_MAX: usize = 100;
/// Ratings are plain numbers; fractional values such as 7.5 are allowed.
pub const RATING_RANGE: core::ops::RangeInclusive<f64> = 1.0..=10.0;

/// One review per user per bootcamp.
pub const SCHEMA: Schema = Schema {
    collection: "reviews",
    fields: &["title", "text", "rating", "bootcamp", "user", "createdAt"],
    hidden: &[],
    unique: &[&["bootcamp", "user"]],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: DocumentId,
    pub title: String,
    pub text: String,
    pub rating: f64,
    pub bootcamp: DocumentId,
    pub user: DocumentId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    const COLLECTION: &'static str = "reviews";

    fn id(&self) -> DocumentId {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<f64>,
}

impl ReviewInput {
    pub fn into_review(
        self,
        bootcamp: DocumentId,
        user: DocumentId,
        now: DateTime<Utc>,
    ) -> DomainResult<Review> {
        let review = Review {
            id: DocumentId::new(),
            title: self.title.unwrap_or_default().trim().to_string(),
            text: self.text.unwrap_or_default(),
            rating: self.rating.unwrap_or(0.0),
            bootcamp,
            user,
            created_at: now,
        };
        review.validate()?;
        Ok(review)
    }

    pub fn apply(self, review: &mut Review) -> DomainResult<()> {
        let mut next = review.clone();
        if let Some(title) = self.title {
            next.title = title.trim().to_string();
        }
        if let Some(text) = self.text {
            next.text = text;
        }
        if let Some(rating) = self.rating {
            next.rating = rating;
        }
        next.validate()?;
        *review = next;
        Ok(())
    }
}

impl Review {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        errors.require_text(
            &self.title,
            "Please add a title for the review",
            Some((TITLE_MAX, "Title can not be more than 100 characters")),
        );
        errors.require_text(&self.text, "Please add some text", None);
        errors.check(
            RATING_RANGE.contains(&self.rating),
            "Please add a rating between 1 and 10",
        );
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        let make = |rating| ReviewInput {
            title: Some("Great".into()),
            text: Some("Learned a lot".into()),
            rating: Some(rating),
        };
        let now = Utc::now();
        for good in [1.0, 7.5, 10.0] {
            assert!(make(good).into_review(DocumentId::new(), DocumentId::new(), now).is_ok());
        }
        for bad in [0.0, 0.5, 10.5, 300.0] {
            assert_eq!(
                make(bad).into_review(DocumentId::new(), DocumentId::new(), now).unwrap_err().to_string(),
                "Please add a rating between 1 and 10"
            );
        }
    }

    #[test]
    fn missing_fields() {
        let err = ReviewInput::default()
            .into_review(DocumentId::new(), DocumentId::new(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please add a title for the review, Please add some text, Please add a rating between 1 and 10"
        );
    }
}
