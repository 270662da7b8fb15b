// Domain layer: table/diff models and ports. The engine depends only on these.

pub mod model;
pub mod ports;
