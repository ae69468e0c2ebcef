//! Subjects: objects whose operations the proxy can call by name
//!
//! The proxy never knows a subject's interface up front. Everything it needs
//! goes through [`Invokable`]: the subject's type name, the list of operation
//! names it exposes, and a way to invoke one with positional [`Value`]s.
//!
//! [`MethodTable`] builds an `Invokable` around any concrete type from a table
//! of registered operations:
//!
//! ```
//! use memoproxy::{Args, MethodTable, Value};
//!
//! struct Calculator {
//!     offset: i64,
//! }
//!
//! let subject = MethodTable::new(Calculator { offset: 10 })
//!     .method("add", |calc, args| Ok(Value::Int(calc.offset + args.int(0)?)));
//!
//! # use memoproxy::Invokable;
//! assert_eq!(subject.invoke("add", &[Value::Int(5)]).unwrap(), Value::Int(15));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::error::BoxError;
use crate::value::Value;

/// Capability the proxy needs from a subject
pub trait Invokable: Send + Sync {
    /// Stable identifier of the subject's type, part of every fingerprint
    fn type_name(&self) -> &str;

    /// Names of all operations the subject exposes
    fn methods(&self) -> Vec<&str>;

    /// Check whether `method` is exposed
    fn responds_to(&self, method: &str) -> bool {
        self.methods().iter().any(|m| *m == method)
    }

    /// Run `method` with positional `args`
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, BoxError>;
}

type Operation<S> = Box<dyn Fn(&S, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// Registered function table adapting a concrete subject to [`Invokable`]
pub struct MethodTable<S> {
    subject: S,
    type_name: String,
    operations: BTreeMap<String, Operation<S>>,
}

impl<S> MethodTable<S>
where
    S: Send + Sync + 'static,
{
    /// Wrap `subject`, named after its Rust type
    pub fn new(subject: S) -> Self {
        Self::named(std::any::type_name::<S>(), subject)
    }

    /// Wrap `subject` under an explicit type name
    pub fn named(type_name: impl Into<String>, subject: S) -> Self {
        Self {
            subject,
            type_name: type_name.into(),
            operations: BTreeMap::new(),
        }
    }

    /// Register an operation; a later registration under the same name wins
    pub fn method<F>(mut self, name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&S, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.operations.insert(name.into(), Box::new(op));
        self
    }

    /// Borrow the wrapped subject
    pub fn subject(&self) -> &S {
        &self.subject
    }
}

impl<S> Invokable for MethodTable<S>
where
    S: Send + Sync + 'static,
{
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn methods(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    fn responds_to(&self, method: &str) -> bool {
        self.operations.contains_key(method)
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, BoxError> {
        match self.operations.get(method) {
            Some(op) => op(&self.subject, args),
            None => Err(format!("no operation named {}", method).into()),
        }
    }
}

impl<S> fmt::Debug for MethodTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("type_name", &self.type_name)
            .field("methods", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}
