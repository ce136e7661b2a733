mod error;
mod traits;

pub mod filesystem;
pub mod layout;

pub use error::StorageError;
pub use traits::ObjectStorage;

#[cfg(test)]
pub use traits::MockObjectStorage;
