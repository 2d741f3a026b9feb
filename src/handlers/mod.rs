pub mod health_handlers;
pub mod rate_limit;
pub mod seo_handlers;
