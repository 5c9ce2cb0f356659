pub mod client;
mod input;
pub mod service;

pub use service::Service;
