use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devcamper_core::{DocumentId, DomainResult, Entity, FieldErrors};
use devcamper_query::Schema;

pub const SCHEMA: Schema = Schema {
    collection: "courses",
    fields: &[
        "title",
        "description",
        "weeks",
        "tuition",
        "minimumSkill",
        "scholarshipAvailable",
        "bootcamp",
        "user",
        "createdAt",
    ],
    hidden: &[],
    unique: &[],
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumSkill {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    pub weeks: String,
    pub tuition: f64,
    pub minimum_skill: MinimumSkill,
    #[serde(default)]
    pub scholarship_available: bool,
    pub bootcamp: DocumentId,
    /// Creator; only they (or an admin) may change the course.
    pub user: DocumentId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Course {
    const COLLECTION: &'static str = "courses";

    fn id(&self) -> DocumentId {
        self.id
    }
}

/// Weeks may arrive as `"12"` or `12`; stored as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Weeks {
    Text(String),
    Count(u32),
}

impl Weeks {
    fn into_text(self) -> String {
        match self {
            Weeks::Text(s) => s.trim().to_string(),
            Weeks::Count(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<Weeks>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<MinimumSkill>,
    pub scholarship_available: Option<bool>,
}

impl CourseInput {
    pub fn into_course(
        self,
        bootcamp: DocumentId,
        user: DocumentId,
        now: DateTime<Utc>,
    ) -> DomainResult<Course> {
        let mut errors = FieldErrors::new();
        let course = Course {
            id: DocumentId::new(),
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default(),
            weeks: self.weeks.map(Weeks::into_text).unwrap_or_default(),
            tuition: self.tuition.unwrap_or_default(),
            minimum_skill: self.minimum_skill.unwrap_or(MinimumSkill::Beginner),
            scholarship_available: self.scholarship_available.unwrap_or(false),
            bootcamp,
            user,
            created_at: now,
        };
        course.collect_errors(&mut errors);
        errors.check(self.tuition.is_some(), "Please add a tuition cost");
        errors.check(self.minimum_skill.is_some(), "Please add a minimum skill");
        errors.finish()?;
        Ok(course)
    }

    /// Merge into `course`; `course` is left unchanged on error.
    pub fn apply(self, course: &mut Course) -> DomainResult<()> {
        let mut next = course.clone();
        if let Some(title) = self.title {
            next.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            next.description = description;
        }
        if let Some(weeks) = self.weeks {
            next.weeks = weeks.into_text();
        }
        if let Some(tuition) = self.tuition {
            next.tuition = tuition;
        }
        if let Some(skill) = self.minimum_skill {
            next.minimum_skill = skill;
        }
        if let Some(scholarship) = self.scholarship_available {
            next.scholarship_available = scholarship;
        }

        let mut errors = FieldErrors::new();
        next.collect_errors(&mut errors);
        errors.finish()?;
        *course = next;
        Ok(())
    }
}

impl Course {
    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.require_text(&self.title, "Please add a course title", None);
        errors.require_text(&self.description, "Please add a description", None);
        errors.require_text(&self.weeks, "Please add number of weeks", None);
        errors.check(
            self.tuition.is_finite() && self.tuition >= 0.0,
            "Tuition can not be negative",
        );
    }
}
