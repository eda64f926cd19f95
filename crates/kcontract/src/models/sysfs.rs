//! sysfs attribute groups: `sysfs_create_group`, `sysfs_remove_group`.

use crate::assume::PathResult;
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "linux:sysfs";

/// Group removed more often than created
pub const LESS_DECREMENT: ViolationId = ViolationId::new(SUBSYSTEM, "less initial decrement");
/// Groups left at unload
pub const MORE_AT_EXIT: ViolationId = ViolationId::new(SUBSYSTEM, "more initial at exit");

impl Kernel {
    /// `int sysfs_create_group(struct kobject *kobj, const struct attribute_group *grp)`
    ///
    /// Returns 0 and takes a hold, or a negative error code.
    pub fn sysfs_create_group(
        &mut self,
        _kobj: Handle,
        _grp: Handle,
    ) -> PathResult<Intercepted<i64>> {
        self.intercept("sysfs_create_group", |k| {
            let res = k.any_int_nonpositive();
            k.models.sysfs.try_acquire(res == 0);
            Ok(res)
        })
    }

    /// `void sysfs_remove_group(struct kobject *kobj, const struct attribute_group *grp)`
    pub fn sysfs_remove_group(&mut self, _kobj: Handle, _grp: Handle) -> PathResult<Intercepted<()>> {
        self.intercept("sysfs_remove_group", |k| {
            k.models
                .sysfs
                .decrement(&mut k.log, LESS_DECREMENT, "sysfs_remove_group");
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::nondet::{Choice, ENOMEM};

    fn handles(kernel: &mut Kernel) -> (Handle, Handle) {
        (kernel.fresh_handle(), kernel.fresh_handle())
    }

    #[test]
    fn test_create_success_holds() {
        let mut kernel = Kernel::scripted([Choice::Int(0)]);
        let (kobj, grp) = handles(&mut kernel);
        assert_eq!(kernel.sysfs_create_group(kobj, grp).unwrap().value, 0);
        assert_eq!(kernel.models().sysfs.value(), 1);
        assert!(kernel.sysfs_remove_group(kobj, grp).unwrap().is_clean());
        assert!(kernel.models().sysfs.is_zero());
    }

    #[test]
    fn test_create_failure_holds_nothing() {
        let mut kernel = Kernel::scripted([Choice::Int(-ENOMEM)]);
        let (kobj, grp) = handles(&mut kernel);
        assert_eq!(kernel.sysfs_create_group(kobj, grp).unwrap().value, -ENOMEM);
        assert!(kernel.models().sysfs.is_zero());
    }

    #[test]
    fn test_remove_without_create() {
        let mut kernel = Kernel::scripted([]);
        let (kobj, grp) = handles(&mut kernel);
        let out = kernel.sysfs_remove_group(kobj, grp).unwrap();
        assert!(out.raised(LESS_DECREMENT));
        assert_eq!(
            out.violations[0].id.render(),
            "linux:sysfs::less initial decrement"
        );
    }
}
