//! Call fingerprinting
//!
//! A fingerprint is the hash of the JSON encoding of
//! `[type_name, method, args]`. The encoding is deterministic (ordered maps,
//! tagged variants) so identical calls map to identical keys, across processes
//! too, as long as the same [`HashFunction`] is used.
//!
//! Collisions are possible in principle. The default 128-bit digest makes them
//! negligible, and a colliding call would be served the other call's result.
//!
//! Swapping the hash function only affects future fingerprints. Entries already
//! stored under the old function stay in the backend but can no longer be
//! reached.

use std::borrow::Borrow;
use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::subject::Invokable;
use crate::value::Value;

/// Stable key identifying one logical call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the key
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Fingerprint {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Structured description of a call: subject type, method, arguments
#[derive(Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    /// Subject type identifier
    pub type_name: String,
    /// Method name
    pub method: String,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl CallDescriptor {
    /// Describe a call by its parts
    pub fn new(type_name: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            method: method.into(),
            args,
        }
    }

    /// Describe a call on `subject`, taking the type name from it
    pub fn on(subject: &dyn Invokable, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(subject.type_name(), method, args)
    }
}

/// Strategy turning encoded call bytes into a fingerprint string
pub trait HashFunction: Send + Sync {
    /// Identifier for logs and diagnostics
    fn name(&self) -> &str;

    /// Hash `input` into a printable key
    fn digest(&self, input: &[u8]) -> String;
}

/// Default: first 128 bits of SHA-256, as 32 lowercase hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortSha256;

impl HashFunction for ShortSha256 {
    fn name(&self) -> &str {
        "sha256-128"
    }

    fn digest(&self, input: &[u8]) -> String {
        let hash = Sha256::digest(input);
        to_hex(&hash[..16])
    }
}

/// Full SHA-256, as 64 lowercase hex characters
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hex;

impl HashFunction for Sha256Hex {
    fn name(&self) -> &str {
        "sha256"
    }

    fn digest(&self, input: &[u8]) -> String {
        let hash = Sha256::digest(input);
        to_hex(&hash)
    }
}

/// Any `Fn(&[u8]) -> String` closure can serve as a hash function
impl<F> HashFunction for F
where
    F: Fn(&[u8]) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        "custom"
    }

    fn digest(&self, input: &[u8]) -> String {
        self(input)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Deterministic byte encoding of a call
pub fn encode_call(type_name: &str, method: &str, args: &[Value]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&(type_name, method, args))?)
}

/// Compute the fingerprint of a call with `hasher`
pub fn fingerprint(
    hasher: &dyn HashFunction,
    type_name: &str,
    method: &str,
    args: &[Value],
) -> Result<Fingerprint> {
    let encoded = encode_call(type_name, method, args)?;
    Ok(Fingerprint(hasher.digest(&encoded)))
}

/// Compute the fingerprint of a described call with `hasher`
pub fn fingerprint_call(hasher: &dyn HashFunction, call: &CallDescriptor) -> Result<Fingerprint> {
    fingerprint(hasher, &call.type_name, &call.method, &call.args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_digest_is_128_bits() {
        let fp = fingerprint(&ShortSha256, "Calc", "compute", &[Value::Int(5)]).unwrap();
        assert_eq!(fp.as_str().len(), 32);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_digest() {
        // SHA-256("abc")
        let full = Sha256Hex.digest(b"abc");
        assert_eq!(
            full,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(ShortSha256.digest(b"abc"), &full[..32]);
    }

    #[test]
    fn test_components_change_fingerprint() {
        let base = fingerprint(&ShortSha256, "Calc", "compute", &[Value::Int(5)]).unwrap();
        let other_type = fingerprint(&ShortSha256, "Other", "compute", &[Value::Int(5)]).unwrap();
        let other_method = fingerprint(&ShortSha256, "Calc", "square", &[Value::Int(5)]).unwrap();
        let other_arg = fingerprint(&ShortSha256, "Calc", "compute", &[Value::Int(6)]).unwrap();
        let other_kind = fingerprint(&ShortSha256, "Calc", "compute", &[Value::from("5")]).unwrap();

        assert_ne!(base, other_type);
        assert_ne!(base, other_method);
        assert_ne!(base, other_arg);
        assert_ne!(base, other_kind);
    }

    #[test]
    fn test_non_finite_floats_fingerprint_apart() {
        let fp = |x: f64| fingerprint(&ShortSha256, "T", "sign", &[Value::Float(x)]).unwrap();

        let pos = fp(f64::INFINITY);
        let neg = fp(f64::NEG_INFINITY);
        let nan = fp(f64::NAN);

        assert_ne!(pos, neg);
        assert_ne!(pos, nan);
        assert_ne!(neg, nan);
        assert_eq!(nan, fp(f64::NAN));
    }

    #[test]
    fn test_argument_boundaries_are_encoded() {
        let split = fingerprint(&ShortSha256, "T", "m", &[Value::from("ab"), Value::from("c")]).unwrap();
        let joined = fingerprint(&ShortSha256, "T", "m", &[Value::from("a"), Value::from("bc")]).unwrap();
        assert_ne!(split, joined);
    }

    #[test]
    fn test_closure_hash_function() {
        let len_hash = |input: &[u8]| format!("len-{}", input.len());
        let fp = fingerprint(&len_hash, "T", "m", &[]).unwrap();
        assert!(fp.as_str().starts_with("len-"));
        assert_eq!(len_hash.name(), "custom");
    }

    #[test]
    fn test_descriptor_matches_parts() {
        let call = CallDescriptor::new("Calc", "compute", vec![Value::Int(5)]);
        let a = fingerprint_call(&ShortSha256, &call).unwrap();
        let b = fingerprint(&ShortSha256, "Calc", "compute", &[Value::Int(5)]).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        /// Property: identical inputs always produce the same fingerprint
        #[test]
        fn prop_fingerprint_is_deterministic(
            type_name in "[A-Za-z]{1,12}",
            method in "[a-z_]{1,12}",
            ints in prop::collection::vec(any::<i64>(), 0..8),
            text in ".{0,16}"
        ) {
            let mut args: Vec<Value> = ints.into_iter().map(Value::Int).collect();
            args.push(Value::Str(text));

            let first = fingerprint(&ShortSha256, &type_name, &method, &args).unwrap();
            let second = fingerprint(&ShortSha256, &type_name, &method, &args.clone()).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: distinct integer arguments give distinct fingerprints
        #[test]
        fn prop_distinct_args_distinct_fingerprints(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(a != b);
            let fa = fingerprint(&ShortSha256, "T", "m", &[Value::Int(a)]).unwrap();
            let fb = fingerprint(&ShortSha256, "T", "m", &[Value::Int(b)]).unwrap();
            prop_assert_ne!(fa, fb);
        }
    }
}
