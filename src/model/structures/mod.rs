pub mod participant;
pub mod rating_source;
