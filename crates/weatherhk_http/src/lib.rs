//! Response sink contract shared by handlers, middlewares and the cache.
//!
//! Handlers never see the network connection: they receive a
//! [`RequestInfo`] and write into a [`ResponseSink`]. The server turns the
//! resulting [`ResponseWriter`] into a hyper response once the handler
//! chain has finished.

mod handler;
mod request;
pub mod responses;
mod sink;
mod writer;

pub use handler::Handler;
pub use request::RequestInfo;
pub use sink::ResponseSink;
pub use writer::ResponseWriter;
