//! Repositories for the `visitors` and `visits` tables

pub mod visitors;
pub mod visits;

pub use visitors::{MockVisitorsRepository, PlatformVisitorsRepository, VisitorsRepository};
pub use visits::{MockVisitsRepository, PlatformVisitsRepository, VisitsRepository};
