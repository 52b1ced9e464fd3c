//! Probe argument model: type tags, signatures, and fire-time encoding
//!
//! A probe's [`Signature`] is fixed at declaration time. At fire time the
//! call site supplies [`ArgValue`]s, which are checked against the signature
//! and encoded into owned [`EncodedArg`]s before they are handed to the sink.
//!
//! # RT-Safety
//!
//! [`ArgValue`] is `Copy` and borrows string data, so building an argument
//! slice at a call site never allocates. Allocation happens only on the
//! enabled path, inside [`Signature::encode`].

use core::fmt;

/// Maximum encoded length of a string argument in bytes.
///
/// Longer strings are truncated on a character boundary rather than
/// rejected, matching how native SDT backends cap string payloads.
pub const MAX_STR_BYTES: usize = 256;

/// Type tag for a single probe argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// 64-bit signed integer
    Int,
    /// UTF-8 string
    Str,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Int => write!(f, "int"),
            ArgKind::Str => write!(f, "string"),
        }
    }
}

/// Ordered argument type signature of a probe, immutable after declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    kinds: Vec<ArgKind>,
}

impl Signature {
    /// Create a signature from an ordered list of argument kinds.
    pub fn new(kinds: impl Into<Vec<ArgKind>>) -> Self {
        Self {
            kinds: kinds.into(),
        }
    }

    /// Signature with no arguments.
    pub const fn empty() -> Self {
        Self { kinds: Vec::new() }
    }

    /// Number of arguments.
    pub fn arity(&self) -> usize {
        self.kinds.len()
    }

    /// Argument kinds in declaration order.
    pub fn kinds(&self) -> &[ArgKind] {
        &self.kinds
    }

    /// Check and encode fire-time arguments against this signature.
    ///
    /// Strings longer than [`MAX_STR_BYTES`] are truncated on a character
    /// boundary. Strings containing an interior NUL byte are rejected, since
    /// sink backends forward string arguments NUL-terminated.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::ArityMismatch`] or [`EncodeError::TypeMismatch`]
    /// when the supplied values do not match the declared signature, and
    /// [`EncodeError::InteriorNul`] for unencodable string values.
    pub fn encode(&self, args: &[ArgValue<'_>]) -> Result<Vec<EncodedArg>, EncodeError> {
        if args.len() != self.kinds.len() {
            return Err(EncodeError::ArityMismatch {
                expected: self.kinds.len(),
                got: args.len(),
            });
        }

        let mut encoded = Vec::with_capacity(args.len());
        for (index, (kind, value)) in self.kinds.iter().zip(args).enumerate() {
            match (kind, value) {
                (ArgKind::Int, ArgValue::Int(v)) => encoded.push(EncodedArg::Int(*v)),
                (ArgKind::Str, ArgValue::Str(s)) => {
                    if s.as_bytes().contains(&0) {
                        return Err(EncodeError::InteriorNul { index });
                    }
                    encoded.push(EncodedArg::Str(truncate_str(s, MAX_STR_BYTES).to_owned()));
                }
                _ => {
                    return Err(EncodeError::TypeMismatch {
                        index,
                        expected: *kind,
                        got: value.kind(),
                    });
                }
            }
        }
        Ok(encoded)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, kind) in self.kinds.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{kind}")?;
        }
        write!(f, ")")
    }
}

impl From<&[ArgKind]> for Signature {
    fn from(kinds: &[ArgKind]) -> Self {
        Self::new(kinds.to_vec())
    }
}

impl<const N: usize> From<[ArgKind; N]> for Signature {
    fn from(kinds: [ArgKind; N]) -> Self {
        Self::new(kinds.to_vec())
    }
}

/// A concrete argument value supplied at fire time.
///
/// Borrows string data so that assembling an argument slice is free on the
/// disabled path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgValue<'a> {
    /// Integer argument
    Int(i64),
    /// String argument
    Str(&'a str),
}

impl ArgValue<'_> {
    /// The kind tag this value matches.
    #[inline]
    pub const fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Int(_) => ArgKind::Int,
            ArgValue::Str(_) => ArgKind::Str,
        }
    }
}

impl From<i64> for ArgValue<'_> {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue<'_> {
    fn from(v: i32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<u32> for ArgValue<'_> {
    fn from(v: u32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<u16> for ArgValue<'_> {
    fn from(v: u16) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl<'a> From<&'a str> for ArgValue<'a> {
    fn from(v: &'a str) -> Self {
        ArgValue::Str(v)
    }
}

impl<'a> From<&'a String> for ArgValue<'a> {
    fn from(v: &'a String) -> Self {
        ArgValue::Str(v.as_str())
    }
}

/// An argument after signature checking, owned and ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedArg {
    /// Encoded integer argument
    Int(i64),
    /// Encoded string argument, at most [`MAX_STR_BYTES`] bytes
    Str(String),
}

impl fmt::Display for EncodedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedArg::Int(v) => write!(f, "{v}"),
            EncodedArg::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Fire-time encoding failure.
///
/// These never propagate to the firing call site; the dispatch path counts
/// and logs them (see the provider metrics).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Wrong number of arguments for the declared signature
    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Declared arity
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Argument type does not match the declared kind
    #[error("argument {index}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Zero-based argument position
        index: usize,
        /// Declared kind
        expected: ArgKind,
        /// Supplied kind
        got: ArgKind,
    },

    /// String argument contains an interior NUL byte
    #[error("argument {index}: string contains an interior NUL byte")]
    InteriorNul {
        /// Zero-based argument position
        index: usize,
    },
}

impl EncodeError {
    /// True when the failure is a caller mistake (wrong count or types)
    /// rather than an unencodable value.
    pub const fn is_argument_mismatch(&self) -> bool {
        matches!(
            self,
            EncodeError::ArityMismatch { .. } | EncodeError::TypeMismatch { .. }
        )
    }
}

fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    s.get(..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let sig = Signature::new(vec![ArgKind::Int, ArgKind::Str]);
        assert_eq!(sig.to_string(), "(int, string)");
        assert_eq!(Signature::empty().to_string(), "()");
    }

    #[test]
    fn test_encode_matching_args() {
        let sig = Signature::new(vec![ArgKind::Int, ArgKind::Str]);
        let encoded = sig
            .encode(&[ArgValue::Int(5), ArgValue::Str("hello")])
            .expect("encode");
        assert_eq!(
            encoded,
            vec![EncodedArg::Int(5), EncodedArg::Str("hello".to_string())]
        );
    }

    #[test]
    fn test_encode_arity_mismatch() {
        let sig = Signature::new(vec![ArgKind::Int]);
        let err = sig.encode(&[]).expect_err("must fail");
        assert_eq!(
            err,
            EncodeError::ArityMismatch {
                expected: 1,
                got: 0
            }
        );
        assert!(err.is_argument_mismatch());
    }

    #[test]
    fn test_encode_type_mismatch() {
        let sig = Signature::new(vec![ArgKind::Int]);
        let err = sig.encode(&[ArgValue::Str("oops")]).expect_err("must fail");
        assert_eq!(
            err,
            EncodeError::TypeMismatch {
                index: 0,
                expected: ArgKind::Int,
                got: ArgKind::Str,
            }
        );
        assert!(err.is_argument_mismatch());
    }

    #[test]
    fn test_encode_rejects_interior_nul() {
        let sig = Signature::new(vec![ArgKind::Str]);
        let err = sig
            .encode(&[ArgValue::Str("he\0llo")])
            .expect_err("must fail");
        assert_eq!(err, EncodeError::InteriorNul { index: 0 });
        assert!(!err.is_argument_mismatch());
    }

    #[test]
    fn test_encode_truncates_long_strings() {
        let sig = Signature::new(vec![ArgKind::Str]);
        let long = "x".repeat(MAX_STR_BYTES * 2);
        let encoded = sig.encode(&[ArgValue::Str(&long)]).expect("encode");
        match encoded.first() {
            Some(EncodedArg::Str(s)) => assert_eq!(s.len(), MAX_STR_BYTES),
            other => panic!("unexpected encoding: {other:?}"),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // U+00E9 is two bytes in UTF-8; an odd byte cap lands mid-char.
        let s = "é".repeat(MAX_STR_BYTES);
        let truncated = truncate_str(&s, MAX_STR_BYTES - 1);
        assert!(truncated.len() <= MAX_STR_BYTES - 1);
        assert!(s.starts_with(truncated));
    }

    #[test]
    fn test_arg_value_conversions() {
        assert_eq!(ArgValue::from(5i32), ArgValue::Int(5));
        assert_eq!(ArgValue::from(5u32), ArgValue::Int(5));
        assert_eq!(ArgValue::from("hi"), ArgValue::Str("hi"));
        let owned = String::from("hi");
        assert_eq!(ArgValue::from(&owned), ArgValue::Str("hi"));
        assert_eq!(ArgValue::Int(1).kind(), ArgKind::Int);
        assert_eq!(ArgValue::Str("x").kind(), ArgKind::Str);
    }
}
