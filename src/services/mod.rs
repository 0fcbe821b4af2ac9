// Service exports
pub mod analytics;
pub mod browser;
pub mod listings;
pub mod preferences;
pub mod store;

pub use analytics::{AnalyticsClient, AnalyticsError};
pub use browser::ListingBrowser;
pub use listings::{ListingSource, ListingsClient, ListingsError};
pub use preferences::{PreferenceKey, PreferenceStore, UiFlags};
pub use store::{KeyValueStore, MemoryStore, RedisStore, StoreError};
