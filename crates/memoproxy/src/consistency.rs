//! Name collision check between the proxy and its subject
//!
//! `Proxy::call` forwards by name, so a subject operation sharing a name with
//! a proxy operation could never be told apart from it. Such subjects are
//! rejected when attached.

use std::collections::{BTreeSet, HashSet};

use crate::error::{Error, Result};

/// Public operations of [`Proxy`](crate::Proxy); none may appear on a subject
pub const PROXY_OPERATIONS: &[&str] = &[
    "attach_subject",
    "attach_store",
    "attach_store_with_ttl",
    "store",
    "fingerprint",
    "fingerprint_call",
    "set_hash_function",
    "hash_function",
    "hit_count",
    "hit_count_for",
    "call",
];

/// Fail with [`Error::AmbiguousDispatch`] if any subject name is reserved
///
/// Offending names are reported sorted and deduplicated.
pub fn assert_no_collision<'a, I>(reserved: &HashSet<&'static str>, subject_methods: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let common: BTreeSet<&str> = subject_methods
        .into_iter()
        .filter(|name| reserved.contains(*name))
        .collect();

    if common.is_empty() {
        Ok(())
    } else {
        Err(Error::AmbiguousDispatch(
            common.into_iter().map(str::to_string).collect(),
        ))
    }
}
