//! USB driver registration and coherent DMA buffers.
//!
//! A failed `usb_register` leaves an error pending until the environment
//! checks the probe's return value with `check_return_value_probe`.

use crate::assume::PathResult;
use crate::kernel::{Intercepted, Kernel};
use crate::nondet::Handle;
use crate::violation::ViolationId;

const REGISTER: &str = "linux:usb:register";
const COHERENT: &str = "linux:usb:coherent";

/// Probe returned 0 after a registration failed
pub const WRONG_RETURN_VALUE: ViolationId = ViolationId::new(REGISTER, "wrong return value");
/// Driver deregistered without being registered
pub const DEREGISTER_BEFORE_REGISTER: ViolationId =
    ViolationId::new(REGISTER, "deregister before register");
/// Driver still registered at unload
pub const REGISTER_MORE_AT_EXIT: ViolationId = ViolationId::new(REGISTER, "more initial at exit");
/// Buffer freed more often than allocated
pub const COHERENT_LESS_DECREMENT: ViolationId =
    ViolationId::new(COHERENT, "less initial decrement");
/// Buffers left at unload
pub const COHERENT_MORE_AT_EXIT: ViolationId = ViolationId::new(COHERENT, "more initial at exit");

impl Kernel {
    /// `int usb_register(struct usb_driver *driver)`
    pub fn usb_register(&mut self, _driver: Handle) -> PathResult<Intercepted<i64>> {
        self.intercept("usb_register", |k| {
            let res = k.any_int_nonpositive();
            if res == 0 {
                k.models.usb_drivers.increment();
            } else {
                k.models.usb_probe.fail_registration();
            }
            Ok(res)
        })
    }

    /// `void usb_deregister(struct usb_driver *driver)`
    pub fn usb_deregister(&mut self, _driver: Handle) -> PathResult<Intercepted<()>> {
        self.intercept("usb_deregister", |k| {
            k.models.usb_drivers.decrement(
                &mut k.log,
                DEREGISTER_BEFORE_REGISTER,
                "usb_deregister",
            );
            Ok(())
        })
    }

    /// Environment hook run on a probe's return value.
    ///
    /// After a failed registration the value must be non-zero. The pending
    /// error is cleared by every check.
    pub fn check_return_value_probe(&mut self, retval: i64) -> PathResult<Intercepted<()>> {
        self.intercept("check_return_value_probe", |k| {
            k.models.usb_probe.check_return_value(
                &mut k.log,
                retval,
                WRONG_RETURN_VALUE,
                "check_return_value_probe",
            );
            Ok(())
        })
    }

    /// `void *usb_alloc_coherent(struct usb_device *dev, size_t size, gfp_t mem_flags, dma_addr_t *dma)`
    pub fn usb_alloc_coherent(
        &mut self,
        _dev: Handle,
        _size: usize,
    ) -> PathResult<Intercepted<Option<Handle>>> {
        self.intercept("usb_alloc_coherent", |k| {
            let buffer = k.any_ptr();
            k.models.usb_coherent.try_acquire(buffer.is_some());
            Ok(buffer)
        })
    }

    /// `void usb_free_coherent(struct usb_device *dev, size_t size, void *addr, dma_addr_t dma)`
    ///
    /// Freeing NULL is a no-op.
    pub fn usb_free_coherent(
        &mut self,
        _dev: Handle,
        addr: Option<Handle>,
    ) -> PathResult<Intercepted<()>> {
        self.intercept("usb_free_coherent", |k| {
            if addr.is_some() {
                k.models.usb_coherent.decrement(
                    &mut k.log,
                    COHERENT_LESS_DECREMENT,
                    "usb_free_coherent",
                );
            }
            Ok(())
        })
    }
}
