pub mod elasticsearch;
pub mod traits;

pub use elasticsearch::ElasticsearchStore;
pub use traits::{BulkItemError, BulkOutcome, ClusterInfo, IndexStore, StoreError};
