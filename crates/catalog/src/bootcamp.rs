//! Bootcamps: the primary listed entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devcamper_core::validate::{is_valid_email, is_valid_url};
use devcamper_core::{DocumentId, DomainResult, Entity, FieldErrors};
use devcamper_query::Schema;

use crate::geo::Location;
use crate::photo::DEFAULT_PHOTO;
use crate::slug::slugify;

pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 500;
pub const PHONE_MAX: usize = 20;

pub const SCHEMA: Schema = Schema {
    collection: "bootcamps",
    fields: &[
        "name",
        "slug",
        "description",
        "website",
        "phone",
        "email",
        "address",
        "location",
        "careers",
        "averageRating",
        "averageCost",
        "photo",
        "housing",
        "jobAssistance",
        "jobGuarantee",
        "acceptGi",
        "user",
        "createdAt",
    ],
    hidden: &[],
    unique: &[&["name"]],
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Career {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Data Science")]
    DataScience,
    Business,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub careers: Vec<Career>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    /// Owning publisher (or admin).
    pub user: DocumentId,
    pub created_at: DateTime<Utc>,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

impl Entity for Bootcamp {
    const COLLECTION: &'static str = "bootcamps";

    fn id(&self) -> DocumentId {
        self.id
    }
}

/// Client-writable bootcamp fields. On create the required ones must be
/// present; on update absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub careers: Option<Vec<Career>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl BootcampInput {
    pub fn into_bootcamp(self, owner: DocumentId, now: DateTime<Utc>) -> DomainResult<Bootcamp> {
        let mut bootcamp = Bootcamp {
            id: DocumentId::new(),
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            website: None,
            phone: None,
            email: None,
            address: String::new(),
            location: None,
            careers: Vec::new(),
            average_rating: None,
            average_cost: None,
            photo: default_photo(),
            housing: false,
            job_assistance: false,
            job_guarantee: false,
            accept_gi: false,
            user: owner,
            created_at: now,
        };
        self.apply(&mut bootcamp)?;
        Ok(bootcamp)
    }

    /// Merge into `bootcamp` and validate the result. `bootcamp` is left
    /// unchanged on error.
    pub fn apply(self, bootcamp: &mut Bootcamp) -> DomainResult<()> {
        let mut next = bootcamp.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
            next.slug = slugify(&next.name);
        }
        if let Some(description) = self.description {
            next.description = description;
        }
        if let Some(website) = self.website {
            next.website = non_blank(website);
        }
        if let Some(phone) = self.phone {
            next.phone = non_blank(phone);
        }
        if let Some(email) = self.email {
            next.email = non_blank(email);
        }
        if let Some(address) = self.address {
            if address != next.address {
                // Stale once the address moves; re-resolved by the geocoder.
                next.location = None;
            }
            next.address = address;
        }
        if let Some(careers) = self.careers {
            next.careers = careers;
        }
        next.housing = self.housing.unwrap_or(next.housing);
        next.job_assistance = self.job_assistance.unwrap_or(next.job_assistance);
        next.job_guarantee = self.job_guarantee.unwrap_or(next.job_guarantee);
        next.accept_gi = self.accept_gi.unwrap_or(next.accept_gi);

        next.validate()?;
        *bootcamp = next;
        Ok(())
    }
}

impl Bootcamp {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        errors.require_text(
            &self.name,
            "Please add a name",
            Some((NAME_MAX, "Name can not be more than 50 characters")),
        );
        errors.require_text(
            &self.description,
            "Please add a description",
            Some((DESCRIPTION_MAX, "Description can not be more than 500 characters")),
        );
        if let Some(website) = &self.website {
            errors.check(is_valid_url(website), "Please use a valid URL with HTTP or HTTPS");
        }
        if let Some(phone) = &self.phone {
            errors.check(
                phone.chars().count() <= PHONE_MAX,
                "Phone number can not be longer than 20 characters",
            );
        }
        if let Some(email) = &self.email {
            errors.check(is_valid_email(email), "Please add a valid email");
        }
        errors.require_text(&self.address, "Please add an address", None);
        errors.check(!self.careers.is_empty(), "Please add at least one career");
        errors.finish()
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
