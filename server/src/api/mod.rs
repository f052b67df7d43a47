//! HTTP API: typed request/response bodies over the domain core.
//!
//! Every handler validates its payload at the boundary and maps domain
//! errors through [`error::ApiError`]; malformed requests never reach the
//! core.

pub mod error;
pub mod events;
pub mod payments;
pub mod resale;
pub mod session;
pub mod verify;

pub use error::ApiError;
pub use session::Session;
