//! Authentication models

pub mod department;
pub mod host;
pub mod role;

// Re-export for convenience
pub use department::Department;
pub use host::{Host, NewHost};
pub use role::Role;
