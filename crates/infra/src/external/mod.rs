//! External service adapters: geocoding, e-mail delivery, file storage.

pub mod geocoder;
pub mod mailer;
pub mod photos;

pub use geocoder::{GeocodeError, Geocoder, StaticGeocoder};
pub use mailer::{EmailMessage, LogMailer, MailError, Mailer, MemoryMailer};
pub use photos::{LocalPhotoStore, PhotoError, PhotoStore};
