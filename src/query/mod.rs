pub mod aggregate;
pub mod filter;

pub use aggregate::{GroupCount, GroupCountStage};
pub use filter::{build_predicate, Comparison, FieldFilter, FilterParams, FilterValue, Predicate};
