//! The validation policy applied to presented credentials

use aliri_clock::{Clock, System};
use gatepass::{CredentialRef, Token};
use thiserror::Error;

/// How a presented credential is compared to the expected token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Byte-identical wire strings.
    ExactWire,
    /// `Sid` and `Secret` equality, tolerant of re-encoding differences
    /// such as JSON key ordering or a refreshed expiration.
    Semantic,
}

/// Why a presented credential was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// The credential does not correspond to the issued token.
    Mismatch,
    /// The issued token has passed its expiration. Only produced when
    /// expiry enforcement is switched on.
    Expired,
    /// The signature hook rejected the credential.
    Signature,
}

/// Outcome of validating a presented credential
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The credential corresponds to the issued token.
    Allowed,
    /// No token has been issued for this context, so there is nothing to
    /// check against and the credential is provisionally accepted.
    ///
    /// This is an explicit not-yet-enforced branch, not a security
    /// feature.
    Unenforced,
    /// The credential was refused.
    Denied(DenyReason),
}

impl Verdict {
    /// Whether the request should be let through.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed | Verdict::Unenforced)
    }
}

/// The credential's signature did not verify
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

impl SignatureMismatch {
    /// Constructs a signature rejection.
    pub const fn new() -> Self {
        Self { _p: () }
    }
}

/// Hook for verifying the authenticity of a presented credential
///
/// Nothing in this workspace performs cryptographic verification; the
/// default hook accepts everything. Implement this trait to layer a MAC
/// or an asymmetric signature over the wire string without touching the
/// token data model.
pub trait VerifySignature {
    /// Checks `presented` against the token issued for this context.
    fn verify(
        &self,
        expected: &Token,
        presented: &CredentialRef,
    ) -> Result<(), SignatureMismatch>;
}

/// Accepts every credential without inspecting it
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSignature;

impl VerifySignature for NoSignature {
    #[inline]
    fn verify(&self, _: &Token, _: &CredentialRef) -> Result<(), SignatureMismatch> {
        Ok(())
    }
}

/// Decides whether a presented credential authorizes a request
///
/// The default validator uses [`MatchPolicy::Semantic`], does not enforce
/// expiration, and verifies no signature.
#[derive(Clone, Copy, Debug)]
pub struct Validator<V = NoSignature, C = System> {
    policy: MatchPolicy,
    enforce_expiry: bool,
    verifier: V,
    clock: C,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::Semantic,
            enforce_expiry: false,
            verifier: NoSignature,
            clock: System,
        }
    }
}

impl Validator {
    /// Constructs a validator with the given comparison policy.
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}

impl<V, C> Validator<V, C> {
    /// Switches expiration enforcement on or off.
    ///
    /// Off by default: issued tokens carry an `Exp` property, but the
    /// comparison path has historically never consulted it, and tokens
    /// with malformed expirations are effectively unbounded.
    pub fn enforce_expiry(self, enforce: bool) -> Self {
        Self {
            enforce_expiry: enforce,
            ..self
        }
    }

    /// Replaces the signature verification hook.
    pub fn with_verifier<V2: VerifySignature>(self, verifier: V2) -> Validator<V2, C> {
        Validator {
            policy: self.policy,
            enforce_expiry: self.enforce_expiry,
            verifier,
            clock: self.clock,
        }
    }

    /// Replaces the clock used for expiration checks.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Validator<V, C2> {
        Validator {
            policy: self.policy,
            enforce_expiry: self.enforce_expiry,
            verifier: self.verifier,
            clock,
        }
    }
}

impl<V: VerifySignature, C: Clock> Validator<V, C> {
    /// Validates a presented credential against the token expected for
    /// this context, if one has been issued.
    pub fn validate(&self, expected: Option<&Token>, presented: &CredentialRef) -> Verdict {
        let expected = match expected {
            Some(token) => token,
            None => {
                tracing::debug!("no token issued for this context; provisionally accepting");
                return Verdict::Unenforced;
            }
        };

        if self.verifier.verify(expected, presented).is_err() {
            tracing::warn!(credential = %presented, "credential rejected by signature hook");
            return Verdict::Denied(DenyReason::Signature);
        }

        if self.enforce_expiry {
            let now = self.clock.now().0 as i64;
            if expected.expiry().timestamp() <= now {
                tracing::warn!(expiry = %expected.expiry_string(), "issued token has expired");
                return Verdict::Denied(DenyReason::Expired);
            }
        }

        let matched = match self.policy {
            MatchPolicy::ExactWire => expected.wire().as_str() == presented.as_str(),
            MatchPolicy::Semantic => Token::from_wire(presented.as_str()).matches(expected),
        };

        if matched {
            Verdict::Allowed
        } else {
            tracing::warn!(credential = %presented, "presented credential does not correspond to the issued token");
            Verdict::Denied(DenyReason::Mismatch)
        }
    }
}
