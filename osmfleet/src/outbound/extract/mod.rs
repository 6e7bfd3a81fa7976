//! HTTP-backed extract source adapter (C2).

mod reqwest_source;

pub use reqwest_source::ReqwestExtractSource;
