//! Module reference counting: `try_module_get`, `__module_get`,
//! `module_put`, `module_refcount`, `module_put_and_exit`.
//!
//! A NULL module stands for built-in code and is never counted.

use crate::assume::{PathResult, Pruned};
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "linux:kernel:module";

/// Reference dropped more often than taken
pub const LESS_DECREMENT: ViolationId = ViolationId::new(SUBSYSTEM, "less initial decrement");
/// References held at unload
pub const MORE_AT_EXIT: ViolationId = ViolationId::new(SUBSYSTEM, "more initial at exit");

impl Kernel {
    /// `bool try_module_get(struct module *module)`
    pub fn try_module_get(&mut self, module: Option<Handle>) -> PathResult<Intercepted<bool>> {
        self.intercept("try_module_get", |k| {
            if module.is_none() {
                return Ok(true);
            }
            let got = k.any_bool();
            Ok(k.models.module_refs.try_acquire(got))
        })
    }

    /// `void __module_get(struct module *module)`
    pub fn module_get(&mut self, module: Option<Handle>) -> PathResult<Intercepted<()>> {
        self.intercept("__module_get", |k| {
            if module.is_some() {
                k.models.module_refs.increment();
            }
            Ok(())
        })
    }

    /// `void module_put(struct module *module)`
    pub fn module_put(&mut self, module: Option<Handle>) -> PathResult<Intercepted<()>> {
        self.intercept("module_put", |k| {
            if module.is_some() {
                k.models
                    .module_refs
                    .decrement(&mut k.log, LESS_DECREMENT, "module_put");
            }
            Ok(())
        })
    }

    /// `unsigned int module_refcount(struct module *mod)`
    pub fn module_refcount(&mut self, module: Option<Handle>) -> PathResult<Intercepted<u64>> {
        self.intercept("module_refcount", |k| {
            Ok(module.map_or(0, |_| k.models.module_refs.value()))
        })
    }

    /// `void module_put_and_exit(long code)`
    ///
    /// Drops this module's reference and leaves the module; the path ends
    /// here and is not subject to the unload check.
    pub fn module_put_and_exit(&mut self, code: i64) -> PathResult<Intercepted<()>> {
        self.intercept("module_put_and_exit", |k| {
            k.models
                .module_refs
                .decrement(&mut k.log, LESS_DECREMENT, "module_put_and_exit");
            tracing::debug!(code, "module exited");
            Err(Pruned::exited("module_put_and_exit"))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assume::PruneKind;
    use crate::nondet::Choice;

    #[test]
    fn test_two_gets_refcount_two() {
        let mut kernel = Kernel::scripted([]);
        let module = Some(kernel.fresh_handle());
        kernel.module_get(module).unwrap();
        kernel.module_get(module).unwrap();
        assert_eq!(kernel.module_refcount(module).unwrap().value, 2);
        kernel.module_put(module).unwrap();
        kernel.module_put(module).unwrap();
        assert!(kernel.models().module_refs.is_zero());
        assert!(kernel.violations().is_empty());
    }

    #[test]
    fn test_third_put_flagged() {
        let mut kernel = Kernel::scripted([]);
        let module = Some(kernel.fresh_handle());
        kernel.module_get(module).unwrap();
        kernel.module_get(module).unwrap();
        assert!(kernel.module_put(module).unwrap().is_clean());
        assert!(kernel.module_put(module).unwrap().is_clean());
        assert!(kernel.module_put(module).unwrap().raised(LESS_DECREMENT));
    }

    #[test]
    fn test_try_get_failure_holds_nothing() {
        let mut kernel = Kernel::scripted([Choice::Bool(false)]);
        let module = Some(kernel.fresh_handle());
        assert!(!kernel.try_module_get(module).unwrap().value);
        assert!(kernel.models().module_refs.is_zero());
    }

    #[test]
    fn test_null_module_is_noop() {
        let mut kernel = Kernel::scripted([]);
        assert!(kernel.try_module_get(None).unwrap().value);
        kernel.module_get(None).unwrap();
        assert!(kernel.module_put(None).unwrap().is_clean());
        assert_eq!(kernel.module_refcount(None).unwrap().value, 0);
        assert!(kernel.trace().is_empty());
    }

    #[test]
    fn test_put_and_exit_ends_path() {
        let mut kernel = Kernel::scripted([]);
        let module = Some(kernel.fresh_handle());
        kernel.module_get(module).unwrap();
        let cut = kernel.module_put_and_exit(0).unwrap_err();
        assert_eq!(cut.kind, PruneKind::Exited);
        assert!(kernel.models().module_refs.is_zero());
        assert_eq!(kernel.pruned(), Some(cut));
    }
}
