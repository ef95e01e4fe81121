//! The token value object and its lazy, cached wire form

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::braids::Credential;
use crate::props::{PropertyBag, EXP, SECRET, SID};
use crate::{expiry, wire};

const SECRET_LEN: usize = 32;

/// A short-lived authorization token
///
/// A token is either *structured*, with its wire form derived from its
/// named properties, or *opaque*, with an arbitrary string carried
/// verbatim as its wire form. The mode is fixed at construction.
///
/// Structured tokens serialize lazily: the first [`wire()`][Token::wire()]
/// read after a mutation rebuilds and caches the wire string under a
/// per-token critical section, so a `Token` can be shared across
/// request-handling threads without readers ever observing a stale or
/// half-built value.
pub struct Token {
    raw_override: Option<String>,
    state: Mutex<State>,
}

#[derive(Clone, Debug)]
struct State {
    props: PropertyBag,
    /// When false, `wire` and `body` are current for `props`.
    dirty: bool,
    wire: Credential,
    body: String,
    builds: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            props: PropertyBag::default(),
            dirty: false,
            wire: Credential::new(String::new()),
            body: String::new(),
            builds: 0,
        }
    }
}

impl Token {
    /// Creates a fresh structured token.
    ///
    /// The new token carries a newly generated `Secret` and an expiration
    /// four hours from now; no other properties are set.
    pub fn new() -> Self {
        Self::expiring_at(expiry::fresh(Utc::now()))
    }

    /// Creates a fresh structured token with an explicit expiration.
    pub fn expiring_at(when: DateTime<FixedOffset>) -> Self {
        let mut props = PropertyBag::default();
        props.set(SECRET, fresh_secret());
        props.set(EXP, expiry::format(when));
        Self {
            raw_override: None,
            state: Mutex::new(State {
                props,
                dirty: true,
                ..State::default()
            }),
        }
    }

    /// Reconstructs a token from a previously issued wire string.
    ///
    /// This never fails. An input that Base64-decodes to an object-shaped
    /// JSON document yields a structured token whose property bag holds
    /// every key/value pair found, with the input cached as its wire form.
    /// Anything else yields an opaque token carrying the input verbatim.
    pub fn from_wire(input: &str) -> Self {
        match wire::decode(input) {
            wire::Decoded::Structured { body, entries } => {
                let mut props = PropertyBag::default();
                for (key, value) in entries {
                    props.set(&key, value);
                }
                Self {
                    raw_override: None,
                    state: Mutex::new(State {
                        props,
                        dirty: false,
                        wire: Credential::new(input.to_owned()),
                        body,
                        builds: 0,
                    }),
                }
            }
            wire::Decoded::Opaque => Self::opaque(input),
        }
    }

    /// Creates an opaque token whose wire form is `raw`, unchanged.
    pub fn opaque(raw: &str) -> Self {
        Self {
            raw_override: Some(raw.to_owned()),
            state: Mutex::new(State {
                dirty: false,
                wire: Credential::new(raw.to_owned()),
                body: raw.to_owned(),
                ..State::default()
            }),
        }
    }

    /// Whether this token is in opaque mode.
    pub fn is_opaque(&self) -> bool {
        self.raw_override.is_some()
    }

    /// Upserts a named property, invalidating the cached wire form.
    ///
    /// Keys and values are unconstrained; an empty value is legal but will
    /// be omitted from the wire form.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut state = self.state();
        state.props.set(key, value);
        state.dirty = true;
    }

    /// Reads a named property. Absent keys yield `None`, never an error.
    pub fn get(&self, key: &str) -> Option<String> {
        self.state().props.get(key).map(str::to_owned)
    }

    /// Whether the named property has been set.
    pub fn has(&self, key: &str) -> bool {
        self.state().props.has(key)
    }

    /// Snapshot of every property that has been set, well-known keys
    /// first, extension keys in sorted order.
    ///
    /// The snapshot is detached from the token, so traversal is finite and
    /// restartable regardless of concurrent mutation.
    pub fn properties(&self) -> Vec<(String, String)> {
        self.state().props.entries()
    }

    /// The token's transportable wire string.
    ///
    /// For structured tokens this is `Base64(UTF8(JSON-object))` over the
    /// non-empty properties, rebuilt here if any property changed since
    /// the last read. For opaque tokens it is the raw string, unchanged.
    pub fn wire(&self) -> Credential {
        if let Some(raw) = &self.raw_override {
            return Credential::new(raw.clone());
        }
        let state = self.built();
        state.wire.clone()
    }

    /// The canonical pre-encoding document backing the wire string,
    /// exposed for diagnostics.
    ///
    /// For opaque tokens, this is the raw string itself.
    pub fn wire_body(&self) -> String {
        if let Some(raw) = &self.raw_override {
            return raw.clone();
        }
        self.built().body.clone()
    }

    /// How many times the wire form has been rebuilt.
    pub fn build_count(&self) -> u64 {
        self.state().builds
    }

    /// The token's expiration as a point in time.
    ///
    /// An absent or unparsable `Exp` property is treated as effectively
    /// unbounded and maps to [`expiry::far_future()`].
    pub fn expiry(&self) -> DateTime<FixedOffset> {
        match self.get(EXP) {
            Some(value) => expiry::parse(&value),
            None => expiry::far_future(),
        }
    }

    /// The token's expiration in the canonical on-wire rendering.
    pub fn expiry_string(&self) -> String {
        expiry::format(self.expiry())
    }

    /// Whether two tokens represent the same credential.
    ///
    /// Matching is defined over `Sid` and `Secret` only: re-encoding a
    /// decoded token is not guaranteed to reproduce byte-identical JSON,
    /// so exact wire equality is too strict for "is this the same
    /// credential" checks. When either token lacks `Sid` or `Secret`
    /// (opaque tokens), matching falls back to exact wire comparison.
    pub fn matches(&self, other: &Token) -> bool {
        let lhs = (self.get(SID), self.get(SECRET));
        let rhs = (other.get(SID), other.get(SECRET));
        match (lhs, rhs) {
            ((Some(sid_a), Some(secret_a)), (Some(sid_b), Some(secret_b))) => {
                sid_a == sid_b && secret_a == secret_b
            }
            _ => self.wire() == other.wire(),
        }
    }

    /// A diagnostic rendering of the token's properties with the secret
    /// redacted.
    pub fn dump(&self) -> String {
        let mut out = String::from(if self.is_opaque() {
            "Token(opaque){"
        } else {
            "Token{"
        });
        let mut first = true;
        for (key, value) in self.properties() {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&key);
            out.push('=');
            if key == SECRET {
                out.push_str("***");
            } else {
                out.push_str(&value);
            }
        }
        out.push('}');
        out
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the critical section and rebuilds the cached wire form if a
    /// property changed since the last build.
    fn built(&self) -> MutexGuard<'_, State> {
        let mut state = self.state();
        if state.dirty {
            let body = wire::build_body(&state.props.entries());
            state.wire = Credential::new(wire::encode(&body));
            state.body = body;
            state.dirty = false;
            state.builds += 1;
        }
        state
    }
}

fn fresh_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}

impl Default for Token {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Token {
    fn clone(&self) -> Self {
        Self {
            raw_override: self.raw_override.clone(),
            state: Mutex::new(self.state().clone()),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// Exact wire equality: two tokens are equal iff their wire strings are
/// byte-identical. See [`matches()`][Token::matches()] for the tolerant
/// comparison intended for authorization decisions.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.wire() == other.wire()
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.wire().hash(hasher);
    }
}

/// Serializes as the wire string.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire().as_str())
    }
}

/// Deserializes through the lenient [`from_wire()`][Token::from_wire()]
/// path, so this never rejects a string.
impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Token::from_wire(&raw))
    }
}
