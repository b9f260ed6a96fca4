pub mod analysis;
pub mod cancel;
pub mod detect;
pub mod duplicate;
pub mod loader;
pub mod model;
pub mod store;
