pub mod s3;
pub mod traits;

pub use s3::S3Fetcher;
pub use traits::{FetchError, ObjectFetcher};
