// Middleware for CORS and the JSON fallbacks

pub mod cors;
pub mod fallback;

pub use cors::*;
pub use fallback::*;
