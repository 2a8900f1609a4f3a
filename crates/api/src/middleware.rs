/// Mapping of scheduling errors to HTTP responses
pub mod error_handling;
/// Extraction of the caller identity supplied by the gateway
pub mod identity;
