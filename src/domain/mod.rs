// Domain layer - Core types and business rules

pub mod model;
pub mod rules;
