/// Middleware modules for the API server
///
/// Bearer authentication lives next to the router in [`crate::app`]; this
/// module holds the response-side layers.

pub mod security;
