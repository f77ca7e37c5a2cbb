pub mod handlers;
pub mod server;

// Re-export commonly used handler functions for convenience
pub use handlers::{load_urls_from_file, load_urls_from_source, parse_url_line, resolve_settings};
pub use server::{AppState, router, serve};
