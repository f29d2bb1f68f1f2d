//! Visit and visitor models

pub mod visit;
pub mod visitor;

// Re-export for convenience
pub use visit::{
    NewVisit, TimeColumn, TimeRange, Visit, VisitAction, VisitDetails, VisitFilter, VisitStatus,
    VisitUpdate,
};
pub use visitor::{NewVisitor, Visitor, VisitorUpdate};
