pub mod visit;

pub use visit::{NewVisit, Visit, VisitorAttributes};
