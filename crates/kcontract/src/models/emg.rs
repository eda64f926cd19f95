//! Environment model callbacks.
//!
//! The environment registers driver-supplied callbacks (timer functions,
//! work handlers, probe routines), invokes them while they are live, and
//! records whether their bodies ran.

use crate::assume::PathResult;
use crate::kernel::{Intercepted, Kernel};
use crate::violation::ViolationId;

const SUBSYSTEM: &str = "emg:callback";

/// Callback invoked outside its registration window
pub const INVOKED_OUTSIDE_REGISTRATION: ViolationId =
    ViolationId::new(SUBSYSTEM, "invoked outside registration");
/// Registration window still open at unload
pub const NOT_CLOSED_AT_EXIT: ViolationId =
    ViolationId::new(SUBSYSTEM, "registration not closed at exit");

impl Kernel {
    /// Open the window in which `name` may be called
    pub fn ldv_register(&mut self, name: &'static str) {
        self.models.callbacks.register(name);
    }

    /// Close the window of `name`
    pub fn ldv_deregister(&mut self, name: &'static str) {
        self.models.callbacks.deregister(name);
    }

    /// Invoke callback `name`, running `body` as its implementation
    pub fn ldv_invoke_callback(
        &mut self,
        name: &'static str,
        body: impl FnOnce(&mut Self) -> PathResult<()>,
    ) -> PathResult<Intercepted<()>> {
        self.intercept("ldv_invoke_callback", |k| {
            k.models.callbacks.invoke(
                &mut k.log,
                name,
                INVOKED_OUTSIDE_REGISTRATION,
                "ldv_invoke_callback",
            );
            body(k)
        })
    }

    /// Marks that the body of callback `name` executed
    pub fn ldv_invoke_reached(&mut self, name: &'static str) {
        tracing::debug!(callback = name, "callback reached");
        self.models.callbacks.mark_reached(name);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_in_window_marks_reached() {
        let mut kernel = Kernel::scripted([]);
        kernel.ldv_register("ldv_handler");
        let out = kernel
            .ldv_invoke_callback("ldv_handler", |k| {
                k.ldv_invoke_reached("ldv_handler");
                Ok(())
            })
            .unwrap();
        kernel.ldv_deregister("ldv_handler");
        assert!(out.is_clean());
        assert!(kernel.models().callbacks.reached("ldv_handler"));
    }

    #[test]
    fn test_invoke_after_deregister() {
        let mut kernel = Kernel::scripted([]);
        kernel.ldv_register("timer_fn");
        kernel.ldv_deregister("timer_fn");
        let out = kernel.ldv_invoke_callback("timer_fn", |_| Ok(())).unwrap();
        assert!(out.raised(INVOKED_OUTSIDE_REGISTRATION));
    }

    #[test]
    fn test_body_violations_are_attributed_to_invocation() {
        let mut kernel = Kernel::scripted([]);
        kernel.ldv_register("release");
        let out = kernel
            .ldv_invoke_callback("release", |k| {
                let module = Some(k.fresh_handle());
                k.module_put(module)?;
                Ok(())
            })
            .unwrap();
        assert!(out.raised(crate::models::module::LESS_DECREMENT));
    }
}
