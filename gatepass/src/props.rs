//! The named-property bag backing a token
//!
//! The four well-known keys get dedicated fields; anything else lands in a
//! side map so that unrecognized properties survive a round-trip through
//! the wire format.

use std::collections::BTreeMap;

/// Property key holding the service name.
pub const SRV: &str = "Srv";

/// Property key holding the session identifier.
pub const SID: &str = "Sid";

/// Property key holding the expiration timestamp.
pub const EXP: &str = "Exp";

/// Property key holding the per-token uniqueness secret.
pub const SECRET: &str = "Secret";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PropertyBag {
    srv: Option<String>,
    sid: Option<String>,
    exp: Option<String>,
    secret: Option<String>,
    extra: BTreeMap<String, String>,
}

impl PropertyBag {
    /// Upserts a property. Empty values are legal; they are only dropped
    /// at serialization time.
    pub(crate) fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match key {
            SRV => self.srv = Some(value),
            SID => self.sid = Some(value),
            EXP => self.exp = Some(value),
            SECRET => self.secret = Some(value),
            _ => {
                self.extra.insert(key.to_owned(), value);
            }
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        match key {
            SRV => self.srv.as_deref(),
            SID => self.sid.as_deref(),
            EXP => self.exp.as_deref(),
            SECRET => self.secret.as_deref(),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    pub(crate) fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Snapshot of every property that has been set, well-known keys
    /// first, extension keys in sorted order.
    pub(crate) fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(4 + self.extra.len());
        let known = [
            (SRV, self.srv.as_deref()),
            (SID, self.sid.as_deref()),
            (EXP, self.exp.as_deref()),
            (SECRET, self.secret.as_deref()),
        ];
        for &(key, value) in &known {
            if let Some(value) = value {
                out.push((key.to_owned(), value.to_owned()));
            }
        }
        for (key, value) in &self.extra {
            out.push((key.clone(), value.clone()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_extension_keys_are_both_reachable() {
        let mut bag = PropertyBag::default();
        bag.set(SRV, "avatar");
        bag.set("Region", "eu-west");

        assert_eq!(bag.get(SRV), Some("avatar"));
        assert_eq!(bag.get("Region"), Some("eu-west"));
        assert!(bag.has(SRV));
        assert!(!bag.has(SID));
        assert_eq!(bag.get(SID), None);
    }

    #[test]
    fn set_upserts() {
        let mut bag = PropertyBag::default();
        bag.set(SID, "one");
        bag.set(SID, "two");
        assert_eq!(bag.get(SID), Some("two"));
    }

    #[test]
    fn entries_list_known_keys_first() {
        let mut bag = PropertyBag::default();
        bag.set("Aux", "x");
        bag.set(SECRET, "s");
        bag.set(SRV, "svc");

        let entries = bag.entries();
        assert_eq!(
            entries,
            vec![
                (SRV.to_owned(), "svc".to_owned()),
                (SECRET.to_owned(), "s".to_owned()),
                ("Aux".to_owned(), "x".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_values_are_still_present_in_the_bag() {
        let mut bag = PropertyBag::default();
        bag.set(SRV, "");
        assert!(bag.has(SRV));
        assert_eq!(bag.get(SRV), Some(""));
    }
}
