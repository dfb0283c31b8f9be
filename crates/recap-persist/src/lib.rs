pub mod error;
pub mod trait_client;
pub mod memory;

#[cfg(feature = "mongodb")]
pub mod dbs;

pub use error::{PersistError, Result};
pub use trait_client::PersistenceClient;
pub use memory::InMemoryPersistence;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::client::MongoPersistenceClient;
