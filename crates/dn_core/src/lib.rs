pub mod error;
pub mod types;

pub use error::Error;
pub use types::{News, NewsResponse};

pub type Result<T> = std::result::Result<T, Error>;
