mod local_storage;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, DARK_MODE_KEY, FAVORITES_KEY};
