//! Service layer: a generic resource store over pluggable persistence.
//! - `ResourceStore` validates input and maps provider outcomes to error kinds.
//! - Providers own the records; `MemoryProvider` is the in-process fallback.
//! - `ExchangeService` validates and converts currency amounts.

pub mod errors;
pub mod exchange;
pub mod provider;
pub mod record;
pub mod runtime;
pub mod schema;
pub mod storage;
pub mod store;
#[cfg(test)]
pub mod test_support;

pub use errors::{ErrorKind, ProviderError, ServiceError};
pub use record::{FieldFilter, Payload, Record, RecordId};
pub use schema::ResourceSchema;
pub use store::ResourceStore;
