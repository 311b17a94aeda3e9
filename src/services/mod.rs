pub mod envelope;
pub mod order;
pub mod product;
pub mod store;
pub mod user;

pub use envelope::ApiError;
pub use store::{MemoryStore, StoreError};
