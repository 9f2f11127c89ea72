// Transient result types. Nothing here outlives a single request.

pub mod analysis;
pub mod rebuild;
