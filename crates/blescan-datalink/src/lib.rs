#![allow(async_fn_in_trait)]

pub mod capture;
pub mod filter;
pub mod replay;
pub mod traits;

pub use capture::CapturingTransport;
pub use filter::HciFilter;
pub use replay::ReplayTransport;
pub use traits::{HciTransport, TransportError};
