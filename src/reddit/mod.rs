pub mod client;
pub mod error;
pub mod types;

pub use client::{Platform, RedditClient, RedditCredentials};
pub use error::RedditError;
pub use types::{Item, ItemKind, Listing, VoteDirection};
