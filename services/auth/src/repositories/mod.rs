//! Repositories for the `hosts` and `departments` tables

pub mod departments;
pub mod hosts;

pub use departments::{DepartmentsRepository, MockDepartmentsRepository, PlatformDepartmentsRepository};
pub use hosts::{HostsRepository, MockHostsRepository, PlatformHostsRepository};
