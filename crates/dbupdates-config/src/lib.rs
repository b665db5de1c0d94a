pub mod loader;
pub mod model;

pub use loader::ConfigLoader;
pub use model::{DEFAULT_COLLECTION, DEFAULT_EXTENSION, DEFAULT_UPDATE_DIR, UpdaterConfig};
