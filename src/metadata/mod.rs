//! Metadata views: the generic bag and the refinement map.

mod bag;
mod refines;

pub use bag::{MetaValue, MetadataBag};
pub use refines::{Properties, RefinementMode, Refinements, resolve_refinements};
