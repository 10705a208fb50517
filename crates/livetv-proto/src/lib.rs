pub mod catalog;
pub mod channel;
pub mod config;
pub mod detail;
pub mod platform;
pub mod query;
pub mod route;
pub mod session;
pub mod tabs;

pub use catalog::{CatalogClient, CatalogError, CatalogSource, RetryPolicy};
pub use channel::{Channel, StreamKind};
pub use config::Config;
pub use query::{FetchError, FetchState, QueryClient, QueryOptions, QueryState};
pub use route::Route;
