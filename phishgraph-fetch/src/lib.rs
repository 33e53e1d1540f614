pub mod collect;
pub mod error;
pub mod fetcher;
pub mod result;

pub use collect::{CollectOptions, CollectProgress, CollectStats, ProgressCallback, collect};
pub use error::FetchError;
pub use fetcher::{Fetcher, normalize_url};
pub use result::{ContentKind, FetchResult};
