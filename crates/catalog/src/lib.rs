//! `devcamper-catalog`: the bootcamp directory domain.
//!
//! Bootcamps, their courses and reviews, the validation rules for each, and
//! the derived values (slug, location, average cost and rating) computed from
//! them. Pure domain code: no IO, no HTTP.

pub mod aggregates;
pub mod bootcamp;
pub mod course;
pub mod geo;
pub mod photo;
pub mod review;
pub mod slug;

pub use aggregates::{average_cost, average_rating};
pub use bootcamp::{Bootcamp, BootcampInput, Career};
pub use photo::{DEFAULT_PHOTO, check_upload, photo_file_name};
pub use course::{Course, CourseInput, MinimumSkill, Weeks};
pub use geo::{EARTH_RADIUS_MILES, GeoPoint, Location, Place};
pub use review::{Review, ReviewInput};
pub use slug::slugify;
