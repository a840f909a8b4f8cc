// src/ingest/providers/mod.rs
pub mod linkedin_rss;

pub use linkedin_rss::LinkedInRssSource;
