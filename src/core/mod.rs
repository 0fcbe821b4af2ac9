// Core algorithm exports
pub mod compatibility;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use compatibility::type_compatibility;
pub use filters::matches_criteria;
pub use matcher::{Matcher, SearchOutcome};
pub use scoring::{calculate_compatibility, score};
