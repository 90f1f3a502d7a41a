pub mod client;
pub mod newsapi;
pub mod recency;
pub mod twitter;

#[cfg(test)]
pub(crate) mod stub_server;
