//! Where feed payloads come from.

pub mod http;

#[cfg(test)]
pub mod scripted;

pub use http::HttpFeedSource;
