// Domain layer: result-set models and ports (interfaces).

pub mod model;
pub mod ports;
