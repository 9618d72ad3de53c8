pub mod http;

pub use http::EgographServer;
