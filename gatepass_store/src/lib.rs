//! Per-service token bookkeeping and request validation for [`gatepass`]
//! tokens
//!
//! A host keeps one [`TokenStore`] per region or service module, issues a
//! token when a service registers, and calls a [`Validator`] with the
//! credential string presented on each gated request.
//!
//! ```
//! use gatepass::ServiceName;
//! use gatepass_store::{TokenStore, Validator, Verdict};
//!
//! let store = TokenStore::new();
//! let validator = Validator::default();
//!
//! let service = ServiceName::new("avatar".to_string());
//! let issued = store.issue(&service).unwrap();
//! let credential = issued.wire();
//!
//! let verdict = validator.validate(store.token_for(&service).as_deref(), &credential);
//! assert_eq!(verdict, Verdict::Allowed);
//! ```
//!
//! Validation is a value comparison against the server-held token; no
//! cryptographic signature is verified unless a [`VerifySignature`]
//! implementation is plugged in.

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

mod store;
mod validate;

pub use store::{AlreadyIssued, TokenStore};
pub use validate::{
    DenyReason, MatchPolicy, NoSignature, SignatureMismatch, Validator, Verdict, VerifySignature,
};
