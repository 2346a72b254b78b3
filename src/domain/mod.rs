// Domain layer: reference data, validation results and the interceptor port.

pub mod model;
pub mod ports;
