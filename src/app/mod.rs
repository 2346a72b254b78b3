// Application layer: long-running hosts built on top of the validation service.

pub mod serve;
