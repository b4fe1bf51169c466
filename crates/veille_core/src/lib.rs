pub mod config;
pub mod error;
pub mod score;
pub mod storage;
pub mod text;
pub mod types;
pub mod window;

pub use error::Error;
pub use storage::ArticleStore;
pub use types::{Article, ArticleStub, Category, RunReport, Source, SourceReport};

pub type Result<T> = std::result::Result<T, Error>;
