//! Bit search helpers: `find_next_bit`, `find_first_bit`.
//!
//! Stateless; the result is an arbitrary index bounded by `size`.

use crate::assume::PathResult;
use crate::kernel::{Intercepted, Kernel};
use crate::violation::ViolationId;

/// Search started past the end of the bitmap
pub const OFFSET_OUT_OF_RANGE: ViolationId =
    ViolationId::new("linux:bitops", "offset out of range");

impl Kernel {
    fn bit_index(&mut self, size: u64) -> PathResult<u64> {
        let index = self.any_uint();
        self.assume(index <= size, "index <= size")?;
        Ok(index)
    }

    /// `unsigned long find_next_bit(const unsigned long *addr, unsigned long size, unsigned long offset)`
    pub fn find_next_bit(&mut self, size: u64, offset: u64) -> PathResult<Intercepted<u64>> {
        self.intercept("find_next_bit", |k| {
            k.log.check(
                offset <= size,
                OFFSET_OUT_OF_RANGE,
                "offset <= size",
                "find_next_bit",
                || format!("offset {offset} > size {size}"),
            );
            k.bit_index(size)
        })
    }

    /// `unsigned long find_first_bit(const unsigned long *addr, unsigned long size)`
    pub fn find_first_bit(&mut self, size: u64) -> PathResult<Intercepted<u64>> {
        self.intercept("find_first_bit", |k| k.bit_index(size))
    }
}
