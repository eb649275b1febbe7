pub mod endpoint;
pub mod error_handler;
pub mod fetcher;

pub use endpoint::{Endpoint, HttpMethod, Params, endpoints};
pub use error_handler::ErrorHandler;
pub use fetcher::{Ack, FailureReason, FetchResult, Item, ResourceFetcher, SubmitError};
