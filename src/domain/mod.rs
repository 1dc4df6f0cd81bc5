// Domain layer: models and ports. Adapters for the external tools live in crate::adapters.

pub mod model;
pub mod ports;
