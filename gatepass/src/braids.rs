use std::fmt;

use aliri_braid::braid;

/// The name of a service that a token gates access to
#[braid(serde)]
pub struct ServiceName;

/// The transportable wire form of a token, as handed to clients
///
/// Credentials are secrets. `Debug` and `Display` reveal only a short
/// prefix; use [`as_str()`][CredentialRef::as_str()] where the full value
/// is actually needed.
#[braid(serde, debug = "owned", display = "owned")]
pub struct Credential;

const REVEAL_CHARS: usize = 8;

fn reveal_prefix(value: &str, f: &mut fmt::Formatter) -> fmt::Result {
    match value.char_indices().nth(REVEAL_CHARS) {
        Some((idx, _)) => write!(f, "{}…", &value[..idx]),
        None => f.write_str(value),
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("`")?;
        reveal_prefix(&self.0, f)?;
        f.write_str("`")
    }
}

impl fmt::Display for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        reveal_prefix(&self.0, f)
    }
}
