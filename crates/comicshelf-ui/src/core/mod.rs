//! DOM-free UI logic shared by components.

pub mod location;
pub mod store;
