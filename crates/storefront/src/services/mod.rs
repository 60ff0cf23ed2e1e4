//! Services shared by the storefront flows.
//!
//! # Services
//!
//! - `auth` - Signed-in identity resolution and sign-out

pub mod auth;
