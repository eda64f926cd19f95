//! Nondeterministic Value Source
//!
//! The harness never invents an outcome on its own: every value that a real
//! kernel would compute (an allocation result, an error code, a lookup index)
//! is requested from an [`Oracle`] by *kind*. An external engine answers by
//! forking over all feasible values; the oracles in [`crate::oracle`] answer
//! from a script, a seed, or a replayed path prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::kernel::Kernel;
use crate::result::ContractError;

/// Linux `ENOMEM`
pub const ENOMEM: i64 = 12;
/// Linux `EINVAL`
pub const EINVAL: i64 = 22;

/// Shape of a requested nondeterministic value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceKind {
    /// Any boolean
    Bool,
    /// A pointer that may be null; `Bool(true)` means non-null
    Nullable,
    /// Any signed integer
    Int,
    /// A signed integer `<= 0` (0 on success, negative errno on failure)
    IntNonPositive,
    /// A signed integer `< 0` (an errno)
    IntNegative,
    /// Any unsigned integer
    UInt,
}

/// A value produced for a [`ChoiceKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// Boolean or null/non-null decision
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
}

const BOOL_REPS: [Choice; 2] = [Choice::Bool(true), Choice::Bool(false)];
const INT_REPS: [Choice; 3] = [Choice::Int(0), Choice::Int(1), Choice::Int(-1)];
const NONPOS_REPS: [Choice; 2] = [Choice::Int(0), Choice::Int(-ENOMEM)];
const NEG_REPS: [Choice; 2] = [Choice::Int(-ENOMEM), Choice::Int(-EINVAL)];
const UINT_REPS: [Choice; 3] = [Choice::UInt(0), Choice::UInt(1), Choice::UInt(u64::MAX)];

impl ChoiceKind {
    /// Every kind
    pub const ALL: [Self; 6] = [
        Self::Bool,
        Self::Nullable,
        Self::Int,
        Self::IntNonPositive,
        Self::IntNegative,
        Self::UInt,
    ];

    /// Finite abstract domain an exhaustive explorer branches over.
    ///
    /// Index 0 is always the outcome a well-behaved kernel would usually
    /// produce (non-null, zero, true).
    #[must_use]
    pub const fn representatives(self) -> &'static [Choice] {
        match self {
            Self::Bool | Self::Nullable => &BOOL_REPS,
            Self::Int => &INT_REPS,
            Self::IntNonPositive => &NONPOS_REPS,
            Self::IntNegative => &NEG_REPS,
            Self::UInt => &UINT_REPS,
        }
    }

    /// Whether `choice` belongs to this kind
    #[must_use]
    pub const fn admits(self, choice: Choice) -> bool {
        match (self, choice) {
            (Self::Bool | Self::Nullable, Choice::Bool(_))
            | (Self::Int, Choice::Int(_))
            | (Self::UInt, Choice::UInt(_)) => true,
            (Self::IntNonPositive, Choice::Int(v)) => v <= 0,
            (Self::IntNegative, Choice::Int(v)) => v < 0,
            _ => false,
        }
    }

    /// Value used when an oracle cannot answer
    #[must_use]
    pub const fn fallback(self) -> Choice {
        self.representatives()[0]
    }
}

impl Choice {
    /// Interpret as a boolean (non-zero integers are true)
    #[must_use]
    pub const fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(v) => v != 0,
            Self::UInt(v) => v != 0,
        }
    }

    /// Interpret as a signed integer
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Bool(b) => b as i64,
            Self::Int(v) => v,
            Self::UInt(v) => v as i64,
        }
    }

    /// Interpret as an unsigned integer
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::Bool(b) => b as u64,
            Self::Int(v) => v as u64,
            Self::UInt(v) => v,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}u"),
        }
    }
}

impl FromStr for Choice {
    type Err = ContractError;

    /// Parse `true`, `false`, `-12` (signed) or `4096u` (unsigned)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "true" => return Ok(Self::Bool(true)),
            "false" => return Ok(Self::Bool(false)),
            _ => {}
        }
        if let Some(digits) = s.strip_suffix('u') {
            return digits
                .parse()
                .map(Self::UInt)
                .map_err(|e| ContractError::invalid_script(format!("'{s}': {e}")));
        }
        s.parse()
            .map(Self::Int)
            .map_err(|e| ContractError::invalid_script(format!("'{s}': {e}")))
    }
}

/// Parse a comma-separated choice script such as `true,-12,0`
pub fn parse_script(script: &str) -> Result<Vec<Choice>, ContractError> {
    script
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Source of nondeterministic values.
///
/// Implementations decide a value for each request; the engine-backed
/// implementation forks, the test implementations replay or sample.
pub trait Oracle: fmt::Debug {
    /// Produce a value of the requested kind
    fn choose(&mut self, kind: ChoiceKind) -> Choice;

    /// Short name for reports
    fn name(&self) -> &'static str {
        "oracle"
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn choose(&mut self, kind: ChoiceKind) -> Choice {
        (**self).choose(kind)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// One nondeterministic decision taken on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    /// Requested kind
    pub kind: ChoiceKind,
    /// Value the oracle produced
    pub value: Choice,
}

/// Opaque non-null handle standing in for a kernel object pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Create from a raw non-zero value
    #[must_use]
    pub const fn new(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Types the value source can produce unconstrained
pub trait Nondet: Sized {
    /// Draw an arbitrary value through the kernel's oracle
    fn any(kernel: &mut Kernel) -> Self;
}

impl Nondet for bool {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_bool()
    }
}

impl Nondet for i64 {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_int()
    }
}

impl Nondet for i32 {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_int() as Self
    }
}

impl Nondet for u64 {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_uint()
    }
}

impl Nondet for u32 {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_uint() as Self
    }
}

impl Nondet for usize {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_uint() as Self
    }
}

impl Nondet for Option<Handle> {
    fn any(kernel: &mut Kernel) -> Self {
        kernel.any_ptr()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod kinds {
        use super::*;

        #[test]
        fn test_representatives_are_admitted() {
            for kind in ChoiceKind::ALL {
                assert!(!kind.representatives().is_empty());
                for rep in kind.representatives() {
                    assert!(kind.admits(*rep), "{kind:?} rejects own {rep:?}");
                }
            }
        }

        #[test]
        fn test_error_code_ranges() {
            assert!(ChoiceKind::IntNonPositive.admits(Choice::Int(0)));
            assert!(!ChoiceKind::IntNonPositive.admits(Choice::Int(1)));
            assert!(!ChoiceKind::IntNegative.admits(Choice::Int(0)));
            assert!(ChoiceKind::IntNegative.admits(Choice::Int(-ENOMEM)));
        }

        #[test]
        fn test_kind_mismatch_rejected() {
            assert!(!ChoiceKind::Nullable.admits(Choice::Int(1)));
            assert!(!ChoiceKind::UInt.admits(Choice::Int(1)));
            assert!(!ChoiceKind::Int.admits(Choice::UInt(1)));
        }

        #[test]
        fn test_fallback_is_success_representative() {
            assert_eq!(ChoiceKind::Nullable.fallback(), Choice::Bool(true));
            assert_eq!(ChoiceKind::IntNonPositive.fallback(), Choice::Int(0));
            assert_eq!(ChoiceKind::IntNegative.fallback(), Choice::Int(-ENOMEM));
        }
    }

    mod conversions {
        use super::*;

        #[test]
        fn test_as_bool() {
            assert!(Choice::Bool(true).as_bool());
            assert!(!Choice::Int(0).as_bool());
            assert!(Choice::UInt(7).as_bool());
        }

        #[test]
        fn test_as_integers() {
            assert_eq!(Choice::Int(-12).as_i64(), -12);
            assert_eq!(Choice::Bool(true).as_u64(), 1);
            assert_eq!(Choice::UInt(u64::MAX).as_u64(), u64::MAX);
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn test_parse_each_form() {
            assert_eq!("true".parse::<Choice>().unwrap(), Choice::Bool(true));
            assert_eq!("false".parse::<Choice>().unwrap(), Choice::Bool(false));
            assert_eq!("-12".parse::<Choice>().unwrap(), Choice::Int(-12));
            assert_eq!("4096u".parse::<Choice>().unwrap(), Choice::UInt(4096));
        }

        #[test]
        fn test_display_parses_back() {
            for choice in [Choice::Bool(false), Choice::Int(-22), Choice::UInt(u64::MAX)] {
                assert_eq!(choice.to_string().parse::<Choice>().unwrap(), choice);
            }
        }

        #[test]
        fn test_parse_script() {
            let script = parse_script("true, -12 ,0,").unwrap();
            assert_eq!(
                script,
                vec![Choice::Bool(true), Choice::Int(-12), Choice::Int(0)]
            );
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!("maybe".parse::<Choice>().is_err());
            assert!(parse_script("true,x").is_err());
            assert!("-1u".parse::<Choice>().is_err());
        }
    }

    #[test]
    fn test_handle_display() {
        let handle = Handle::new(NonZeroU64::new(0x10).unwrap());
        assert_eq!(handle.to_string(), "0x10");
        assert_eq!(handle.get(), 16);
    }
}
