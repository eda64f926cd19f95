//! Oracle implementations.
//!
//! Three deterministic stand-ins for the verification engine's forking
//! choice:
//!
//! - [`ScriptedOracle`]: answers from a fixed script (unit tests, `replay`)
//! - [`SeededOracle`]: xorshift64 sampling from a [`Seed`] (Monte Carlo runs)
//! - [`ReplayOracle`]: follows a prefix of representative indices (the
//!   exhaustive explorer)

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::nondet::{Choice, ChoiceKind, Oracle};

/// Seed for reproducible sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Seed(u64);

impl Seed {
    /// Create a seed from a u64 value
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw seed value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Seed for the `n`th run derived from this one
    #[must_use]
    pub const fn derive(self, n: u64) -> Self {
        Self(self.0 ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// xorshift64 PRNG
#[derive(Debug, Clone)]
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const fn new(seed: Seed) -> Self {
        // zero is a fixed point of xorshift
        let state = if seed.0 == 0 { 1 } else { seed.0 };
        Self { state }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        min + (self.next() % (max - min))
    }
}

/// Largest errno value sampled for error returns
const MAX_ERRNO: u64 = 133;

/// Answers from a fixed FIFO script.
///
/// A scripted value that does not fit the requested kind, or a request after
/// the script ran out, gets the kind's first representative.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    script: VecDeque<Choice>,
    consumed: usize,
    fallbacks: usize,
}

impl ScriptedOracle {
    /// Create from a script
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            script: script.into_iter().collect(),
            consumed: 0,
            fallbacks: 0,
        }
    }

    /// Append a value to the script
    #[must_use]
    pub fn then(mut self, choice: Choice) -> Self {
        self.script.push_back(choice);
        self
    }

    /// Values still queued
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Values taken from the script
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Requests answered with a fallback
    #[must_use]
    pub const fn fallbacks(&self) -> usize {
        self.fallbacks
    }
}

impl Oracle for ScriptedOracle {
    fn choose(&mut self, kind: ChoiceKind) -> Choice {
        match self.script.pop_front() {
            Some(choice) if kind.admits(choice) => {
                self.consumed += 1;
                choice
            }
            Some(choice) => {
                self.consumed += 1;
                self.fallbacks += 1;
                let fallback = kind.fallback();
                tracing::warn!(?kind, %choice, %fallback, "scripted choice does not fit kind");
                fallback
            }
            None => {
                self.fallbacks += 1;
                let fallback = kind.fallback();
                tracing::warn!(?kind, %fallback, "choice script exhausted");
                fallback
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Samples values from a seeded xorshift64 generator
#[derive(Debug, Clone)]
pub struct SeededOracle {
    seed: Seed,
    rng: Xorshift64,
    drawn: u64,
}

impl SeededOracle {
    /// Create from a seed
    #[must_use]
    pub const fn new(seed: Seed) -> Self {
        Self {
            seed,
            rng: Xorshift64::new(seed),
            drawn: 0,
        }
    }

    /// Seed this oracle started from
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// Number of values drawn
    #[must_use]
    pub const fn drawn(&self) -> u64 {
        self.drawn
    }

    fn errno(&mut self) -> i64 {
        -(self.rng.next_range(1, MAX_ERRNO + 1) as i64)
    }
}

impl Oracle for SeededOracle {
    fn choose(&mut self, kind: ChoiceKind) -> Choice {
        self.drawn += 1;
        match kind {
            ChoiceKind::Bool => Choice::Bool(self.rng.next() % 2 == 0),
            ChoiceKind::Nullable => Choice::Bool(self.rng.next() % 4 != 0),
            ChoiceKind::Int => Choice::Int(self.rng.next() as i64),
            ChoiceKind::IntNonPositive => {
                if self.rng.next() % 2 == 0 {
                    Choice::Int(0)
                } else {
                    Choice::Int(self.errno())
                }
            }
            ChoiceKind::IntNegative => Choice::Int(self.errno()),
            ChoiceKind::UInt => {
                // small values half the time so bounded assumptions stay feasible
                if self.rng.next() % 2 == 0 {
                    Choice::UInt(self.rng.next_range(0, 64))
                } else {
                    Choice::UInt(self.rng.next())
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "seeded"
    }
}

/// Follows a prefix of representative indices, then index 0
#[derive(Debug, Clone, Default)]
pub struct ReplayOracle {
    prefix: Vec<usize>,
    cursor: usize,
}

impl ReplayOracle {
    /// Create from a prefix of indices into each kind's representatives
    #[must_use]
    pub const fn new(prefix: Vec<usize>) -> Self {
        Self { prefix, cursor: 0 }
    }

    /// The replayed prefix
    #[must_use]
    pub fn prefix(&self) -> &[usize] {
        &self.prefix
    }
}

impl Oracle for ReplayOracle {
    fn choose(&mut self, kind: ChoiceKind) -> Choice {
        let index = self.prefix.get(self.cursor).copied().unwrap_or(0);
        self.cursor += 1;
        kind.representatives()
            .get(index)
            .copied()
            .unwrap_or_else(|| kind.fallback())
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
