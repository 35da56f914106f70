//! Client SDK for the pxe-manager HTTP API.

pub mod client;
pub mod types;

pub use client::{PxeClient, SdkError};
pub use types::*;
