//! Proptest strategies for choice values and scripts.
//!
//! Available with the `proptest` feature. Scripts built here feed a
//! [`ScriptedOracle`](crate::ScriptedOracle) so a driver can be run against
//! arbitrary kernel answers instead of only the representative ones.

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
use crate::nondet::{Choice, ChoiceKind, EINVAL, ENOMEM};

/// Any choice kind
#[cfg(feature = "proptest")]
pub fn choice_kind() -> impl Strategy<Value = ChoiceKind> {
    prop::sample::select(ChoiceKind::ALL.to_vec())
}

/// A negative errno; common codes weighted up
#[cfg(feature = "proptest")]
pub fn errno() -> impl Strategy<Value = i64> {
    prop_oneof![
        3 => Just(-ENOMEM),
        2 => Just(-EINVAL),
        5 => (1_i64..=133).prop_map(|e| -e),
    ]
}

/// A value admitted by `kind`
#[cfg(feature = "proptest")]
pub fn choice_for(kind: ChoiceKind) -> BoxedStrategy<Choice> {
    match kind {
        ChoiceKind::Bool | ChoiceKind::Nullable => any::<bool>().prop_map(Choice::Bool).boxed(),
        ChoiceKind::Int => any::<i64>().prop_map(Choice::Int).boxed(),
        ChoiceKind::IntNonPositive => prop_oneof![Just(0_i64), errno()]
            .prop_map(Choice::Int)
            .boxed(),
        ChoiceKind::IntNegative => errno().prop_map(Choice::Int).boxed(),
        ChoiceKind::UInt => prop_oneof![0_u64..64, any::<u64>()]
            .prop_map(Choice::UInt)
            .boxed(),
    }
}

/// Any choice value
#[cfg(feature = "proptest")]
pub fn any_choice() -> impl Strategy<Value = Choice> {
    choice_kind().prop_flat_map(choice_for)
}

/// A representative value of any kind
#[cfg(feature = "proptest")]
pub fn representative() -> impl Strategy<Value = Choice> {
    choice_kind().prop_flat_map(|kind| prop::sample::select(kind.representatives().to_vec()))
}

/// One value per kind, in order.
///
/// Useful when the driver's request sequence is known.
#[cfg(feature = "proptest")]
pub fn script_for(kinds: Vec<ChoiceKind>) -> impl Strategy<Value = Vec<Choice>> {
    kinds.into_iter().map(choice_for).collect::<Vec<_>>()
}

/// A script of arbitrary values, of any kind, up to `max_len` long
#[cfg(feature = "proptest")]
pub fn any_script(max_len: usize) -> impl Strategy<Value = Vec<Choice>> {
    prop::collection::vec(any_choice(), 0..=max_len)
}
