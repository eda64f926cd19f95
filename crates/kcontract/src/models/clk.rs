//! Clock gating: `clk_get`, `clk_enable`, `clk_disable`.

use crate::assume::PathResult;
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "linux:drivers:clk";

/// Clock disabled more often than enabled
pub const LESS_DECREMENT: ViolationId = ViolationId::new(SUBSYSTEM, "less initial decrement");
/// Clocks left enabled at unload
pub const MORE_AT_EXIT: ViolationId = ViolationId::new(SUBSYSTEM, "more initial at exit");

impl Kernel {
    /// `struct clk *clk_get(struct device *dev, const char *id)`
    pub fn clk_get(&mut self, _dev: Handle, _id: &str) -> PathResult<Intercepted<Option<Handle>>> {
        self.intercept("clk_get", |k| Ok(k.any_ptr()))
    }

    /// `int clk_enable(struct clk *clk)`; a NULL clock is a dummy that
    /// always enables
    pub fn clk_enable(&mut self, clk: Option<Handle>) -> PathResult<Intercepted<i64>> {
        self.intercept("clk_enable", |k| {
            if clk.is_none() {
                return Ok(0);
            }
            let res = k.any_int_nonpositive();
            k.models.clk.try_acquire(res == 0);
            Ok(res)
        })
    }

    /// `void clk_disable(struct clk *clk)`
    pub fn clk_disable(&mut self, clk: Option<Handle>) -> PathResult<Intercepted<()>> {
        self.intercept("clk_disable", |k| {
            if clk.is_some() {
                k.models
                    .clk
                    .decrement(&mut k.log, LESS_DECREMENT, "clk_disable");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::nondet::{Choice, ENOMEM};

    #[test]
    fn test_enable_disable_balanced() {
        let mut kernel = Kernel::scripted([Choice::Bool(true), Choice::Int(0)]);
        let dev = kernel.fresh_handle();
        let clk = kernel.clk_get(dev, "core").unwrap().value;
        assert_eq!(kernel.clk_enable(clk).unwrap().value, 0);
        assert_eq!(kernel.models().clk.value(), 1);
        assert!(kernel.clk_disable(clk).unwrap().is_clean());
    }

    #[test]
    fn test_failed_enable_not_counted() {
        let mut kernel = Kernel::scripted([Choice::Int(-ENOMEM)]);
        let clk = Some(kernel.fresh_handle());
        assert_eq!(kernel.clk_enable(clk).unwrap().value, -ENOMEM);
        assert!(kernel.models().clk.is_zero());
    }

    #[test]
    fn test_disable_without_enable() {
        let mut kernel = Kernel::scripted([Choice::Bool(true)]);
        let dev = kernel.fresh_handle();
        let clk = kernel.clk_get(dev, "core").unwrap().value;
        let out = kernel.clk_disable(clk).unwrap();
        assert!(out.raised(LESS_DECREMENT));
    }

    #[test]
    fn test_null_clock_is_dummy() {
        let mut kernel = Kernel::scripted([]);
        assert_eq!(kernel.clk_enable(None).unwrap().value, 0);
        assert!(kernel.clk_disable(None).unwrap().is_clean());
        assert!(kernel.trace().is_empty());
    }
}
