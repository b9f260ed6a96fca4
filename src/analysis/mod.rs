pub mod confidence;
pub mod dependency;
