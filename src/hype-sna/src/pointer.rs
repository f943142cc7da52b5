//! Pointer classification
//!
//! Every 32-bit field is either a virtual address or a scalar, decided solely
//! by comparing it against [`POINTER_THRESHOLD`].

use std::fmt;

use serde::Serialize;

use crate::POINTER_THRESHOLD;

/// Whether a raw 32-bit value is read as a virtual address
#[inline]
pub const fn is_pointer(raw: u32) -> bool {
    raw >= POINTER_THRESHOLD
}

/// A classified 32-bit field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Word {
    Pointer(u32),
    Scalar(u32),
}

impl Word {
    #[inline]
    pub const fn classify(raw: u32) -> Self {
        if is_pointer(raw) {
            Self::Pointer(raw)
        } else {
            Self::Scalar(raw)
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Pointer(v) | Self::Scalar(v) => v,
        }
    }

    /// The address, when this word is a pointer
    #[inline]
    pub const fn pointer(self) -> Option<u32> {
        match self {
            Self::Pointer(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }

    /// Scalar zero, the usual "no link" value
    #[inline]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Scalar(0))
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Self::classify(raw)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer(v) => write!(f, "-> 0x{:08x}", v),
            Self::Scalar(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert!(is_pointer(POINTER_THRESHOLD));
        assert!(!is_pointer(POINTER_THRESHOLD - 1));
        assert_eq!(Word::classify(POINTER_THRESHOLD), Word::Pointer(0x1000_0000));
        assert_eq!(Word::classify(POINTER_THRESHOLD - 1), Word::Scalar(0x0FFF_FFFF));
        assert!(is_pointer(u32::MAX));
    }

    #[test]
    fn test_accessors() {
        let p = Word::from(0x1000_0040);
        assert_eq!(p.pointer(), Some(0x1000_0040));
        assert_eq!(p.raw(), 0x1000_0040);
        assert!(!p.is_null());

        let s = Word::from(3);
        assert_eq!(s.pointer(), None);
        assert!(!s.is_null());
        assert!(Word::from(0).is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Word::Pointer(0x1000_0000).to_string(), "-> 0x10000000");
        assert_eq!(Word::Scalar(12).to_string(), "12");
    }
}
