//! # seva-api
//!
//! Derives the application's two HTTP clients from connection state.
//!
//! ```ignore
//! use std::sync::Arc;
//! use seva_api::{ApiBinding, ConnectionState};
//! use seva_http::HttpProvider;
//!
//! let binding = ApiBinding::new(Arc::new(HttpProvider::default()));
//! let apis = binding.observe(&ConnectionState::from_env());
//!
//! if let Some(api) = apis.api {
//!     let villages = api.get("/villages", None).await?.into_data();
//! }
//! ```

pub mod binding;
pub mod connection;
pub mod error;

pub use binding::{ApiBinding, Apis, CENTRAL_CONNECTION, PRIMARY_CONNECTION};
pub use connection::{ConnectionState, ProjectMode};
pub use error::{Error, Result};
