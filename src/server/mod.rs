#[cfg(feature = "rtu-server")]
pub mod rtu;
#[cfg(feature = "tcp-server")]
pub mod tcp;

mod handler;
mod service;

pub use handler::{HandlerService, NewHandlerService, RequestHandler};
pub use service::{NewService, Service};
