//! Shared string type for customer identifiers and categorical levels.
//!
//! Records get cloned when scenarios are simulated and when populations are scored, so string
//! fields are reference-counted instead of being deep-copied every time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// `Str` is an immutable string that can be cloned cheaply.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Str(Arc<str>);

impl Str {
    /// Return the string with leading and trailing whitespace removed. Reuses the allocation when
    /// there is nothing to trim.
    pub fn trimmed(self) -> Str {
        if self.0.trim().len() == self.0.len() {
            self
        } else {
            Str::from(self.0.trim())
        }
    }
}

impl std::fmt::Display for Str {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T: Into<Arc<str>>> From<T> for Str {
    fn from(value: T) -> Str {
        Str(value.into())
    }
}

impl AsRef<str> for Str {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Str {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Str {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl log::kv::ToValue for Str {
    fn to_value(&self) -> log::kv::Value {
        log::kv::Value::from_display(self)
    }
}
