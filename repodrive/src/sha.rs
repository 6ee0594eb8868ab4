//! Opaque remote references.
//!
//! The backing store requires the current content hash of an object to
//! update or delete it. The hash is never interpreted locally, only compared.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

#[repr(transparent)]
#[derive(PartialEq, Eq, Hash)]
pub struct Sha {
    inner: str,
}

impl Sha {
    pub fn new<S: AsRef<str> + ?Sized>(sha: &S) -> &Sha {
        // SAFETY: Sha is a repr(transparent) wrapper around str
        unsafe { &*(sha.as_ref() as *const str as *const Sha) }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn to_sha_buf(&self) -> ShaBuf {
        ShaBuf {
            inner: self.inner.to_string(),
        }
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sha(")?;
        fmt::Debug::fmt(&self.inner, f)?;
        f.write_str(")")
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ShaBuf {
    inner: String,
}

impl ShaBuf {
    pub fn as_sha(&self) -> &Sha {
        Sha::new(self.inner.as_str())
    }

    pub fn into_string(self) -> String {
        self.inner
    }
}

impl From<String> for ShaBuf {
    fn from(value: String) -> Self {
        ShaBuf { inner: value }
    }
}

impl From<&str> for ShaBuf {
    fn from(value: &str) -> Self {
        ShaBuf::from(value.to_string())
    }
}

impl fmt::Debug for ShaBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShaBuf(")?;
        fmt::Debug::fmt(&self.inner, f)?;
        f.write_str(")")
    }
}

impl fmt::Display for ShaBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl Deref for ShaBuf {
    type Target = Sha;

    fn deref(&self) -> &Sha {
        self.as_sha()
    }
}

impl Borrow<Sha> for ShaBuf {
    fn borrow(&self) -> &Sha {
        self.as_sha()
    }
}

impl ToOwned for Sha {
    type Owned = ShaBuf;

    fn to_owned(&self) -> ShaBuf {
        self.to_sha_buf()
    }
}
