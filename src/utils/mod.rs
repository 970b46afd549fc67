pub mod filename;
pub mod validation;
