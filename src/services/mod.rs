pub mod dispatcher;
pub mod extractor;
pub mod fetcher;
pub mod generative;
pub mod history;
pub mod rate_limiter;
pub mod seo_service;
pub mod synthesizer;
