pub mod code;
pub mod service;

pub use code::{generate_short_code, is_valid_custom_code, normalize_url};
pub use service::ShortenService;
