pub mod backend;
pub mod entry;
pub mod error;
pub mod lister;
pub mod vpath;

pub use backend::{ObjectMeta, ObjectStore};
pub use entry::Entry;
pub use error::StoreError;
