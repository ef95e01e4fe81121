//! Short-lived authorization tokens for gating access to a service
//!
//! A [`Token`] binds a service name, a session identifier, an expiration
//! time, and a per-token secret into a compact string that can travel in a
//! header or URL and be reconstructed later for comparison.
//!
//! Tokens come in two wire representations, and both are accepted by the
//! same decoding path:
//!
//! * **structured**: the token's non-empty properties rendered as a
//!   compact JSON object and encoded as URL-safe Base64;
//! * **opaque**: an arbitrary string with no internal structure, passed
//!   through verbatim.
//!
//! Decoding never fails: anything that is not recognizably a structured
//! token is treated as an opaque one. This lets a single validation path
//! accept both richly-structured tokens and simple shared-secret strings.
//!
//! ```
//! use gatepass::{Token, SID, SRV};
//!
//! let token = Token::new();
//! token.set(SRV, "avatar");
//! token.set(SID, "abc123");
//!
//! let presented = token.wire();
//!
//! let decoded = Token::from_wire(presented.as_str());
//! assert_eq!(decoded.get(SRV).as_deref(), Some("avatar"));
//! assert!(decoded.matches(&token));
//! ```
//!
//! The wire form is built lazily and cached; property mutations invalidate
//! the cache, and the rebuild happens under a per-token critical section so
//! the type is safe to share across request-handling threads.

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
pub mod expiry;
mod props;
mod token;
mod wire;

pub use braids::{Credential, CredentialRef, ServiceName, ServiceNameRef};
pub use props::{EXP, SECRET, SID, SRV};
pub use token::Token;
