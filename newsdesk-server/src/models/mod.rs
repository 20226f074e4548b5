//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod rating;
pub mod news;

pub use validation::ValidationError;
pub use rating::{Rating, RatingSummary, RatingValue, UserId, MAX_RATING, MIN_RATING};
pub use news::{NewNews, News, NewsId, NewsPatch};
