//! Built-in driver scenarios.
//!
//! Small drivers exercising the catalog the way real modules use it, each
//! tagged with the verdict exploration must reach. They double as the
//! harness's regression suite and as the CLI's runnable examples.

use serde::Serialize;

use crate::assume::PathResult;
use crate::explorer::{Driver, ExplorationReport};
use crate::kernel::Kernel;
use crate::models::{bitops, clk, emg, gendisk, module, queue, sysfs, usb};
use crate::result::{ContractError, ContractResult};
use crate::violation::ViolationId;

/// Verdict exploration must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Expected {
    /// No path violates any contract
    Safe,
    /// Some path raises this violation
    Unsafe(ViolationId),
}

/// A named driver with its expected verdict
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    /// Unique name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Expected verdict
    pub expected: Expected,
    /// Callbacks that must run on some path
    pub reaches: &'static [&'static str],
    driver: fn(&mut Kernel) -> PathResult<()>,
}

impl Driver for Scenario {
    fn run(&self, kernel: &mut Kernel) -> PathResult<()> {
        (self.driver)(kernel)
    }
}

impl Scenario {
    /// Whether an exploration of this scenario reached its expected verdict.
    ///
    /// A truncated exploration never proves `Safe`.
    #[must_use]
    pub fn verdict_holds(&self, report: &ExplorationReport) -> bool {
        let reached = report.reached();
        let verdict = match self.expected {
            Expected::Safe => !report.truncated && report.is_safe(),
            Expected::Unsafe(id) => report.counterexample(id).is_some(),
        };
        verdict && self.reaches.iter().all(|name| reached.contains(name))
    }
}

/// Every built-in scenario
#[must_use]
pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}

/// Look up a scenario by name
///
/// # Errors
///
/// Returns [`ContractError::UnknownScenario`] if no scenario has that name.
pub fn find(name: &str) -> ContractResult<&'static Scenario> {
    SCENARIOS
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ContractError::unknown_scenario(name))
}

const SCENARIOS: [Scenario; 16] = [
    Scenario {
        name: "gendisk_safe",
        description: "allocate, add, delete, add, delete, free",
        expected: Expected::Safe,
        reaches: &[],
        driver: gendisk_safe,
    },
    Scenario {
        name: "gendisk_double_add",
        description: "add a disk twice without deleting it",
        expected: Expected::Unsafe(gendisk::USE_BEFORE_ALLOCATION),
        reaches: &[],
        driver: gendisk_double_add,
    },
    Scenario {
        name: "gendisk_free_added",
        description: "free a disk that is still added",
        expected: Expected::Unsafe(gendisk::FREE_BEFORE_DELETE),
        reaches: &[],
        driver: gendisk_free_added,
    },
    Scenario {
        name: "queue_leak",
        description: "create a request queue and never clean it up",
        expected: Expected::Unsafe(queue::MORE_AT_EXIT),
        reaches: &[],
        driver: queue_leak,
    },
    Scenario {
        name: "sysfs_safe",
        description: "remove the sysfs group only if creation succeeded",
        expected: Expected::Safe,
        reaches: &[],
        driver: sysfs_safe,
    },
    Scenario {
        name: "sysfs_leak",
        description: "create a sysfs group and never remove it",
        expected: Expected::Unsafe(sysfs::MORE_AT_EXIT),
        reaches: &[],
        driver: sysfs_leak,
    },
    Scenario {
        name: "module_safe",
        description: "balanced module references, leaving through module_put_and_exit",
        expected: Expected::Safe,
        reaches: &[],
        driver: module_safe,
    },
    Scenario {
        name: "module_refcount",
        description: "drop references only when module_refcount reports two",
        expected: Expected::Unsafe(module::MORE_AT_EXIT),
        reaches: &[],
        driver: module_refcount,
    },
    Scenario {
        name: "module_over_put",
        description: "two gets, three puts",
        expected: Expected::Unsafe(module::LESS_DECREMENT),
        reaches: &[],
        driver: module_over_put,
    },
    Scenario {
        name: "usb_probe_swallows_error",
        description: "probe ignores a failed usb_register and returns 0",
        expected: Expected::Unsafe(usb::WRONG_RETURN_VALUE),
        reaches: &["ldv_usb_probe"],
        driver: usb_probe_swallows_error,
    },
    Scenario {
        name: "usb_coherent_leak",
        description: "allocate a coherent buffer and never free it",
        expected: Expected::Unsafe(usb::COHERENT_MORE_AT_EXIT),
        reaches: &[],
        driver: usb_coherent_leak,
    },
    Scenario {
        name: "clk_unbalanced_disable",
        description: "disable a clock that was never enabled",
        expected: Expected::Unsafe(clk::LESS_DECREMENT),
        reaches: &[],
        driver: clk_unbalanced_disable,
    },
    Scenario {
        name: "bitops_safe",
        description: "walk a cpumask staying below nr_cpu_ids",
        expected: Expected::Safe,
        reaches: &[],
        driver: bitops_safe,
    },
    Scenario {
        name: "bitops_offset_overrun",
        description: "search past the last bit",
        expected: Expected::Unsafe(bitops::OFFSET_OUT_OF_RANGE),
        reaches: &[],
        driver: bitops_offset_overrun,
    },
    Scenario {
        name: "workqueue_flush",
        description: "queue work and flush it before exit",
        expected: Expected::Safe,
        reaches: &["ldv_handler"],
        driver: workqueue_flush,
    },
    Scenario {
        name: "timer_after_delete",
        description: "timer fires after del_timer_sync",
        expected: Expected::Unsafe(emg::INVOKED_OUTSIDE_REGISTRATION),
        reaches: &["ldv_timer"],
        driver: timer_after_delete,
    },
];

fn gendisk_safe(k: &mut Kernel) -> PathResult<()> {
    let Some(disk) = k.alloc_disk(1)?.value else {
        return Ok(());
    };
    k.add_disk(disk)?;
    k.del_gendisk(disk)?;
    k.add_disk(disk)?;
    k.del_gendisk(disk)?;
    k.put_disk(Some(disk))?;
    Ok(())
}

fn gendisk_double_add(k: &mut Kernel) -> PathResult<()> {
    let Some(disk) = k.alloc_disk(1)?.value else {
        return Ok(());
    };
    k.add_disk(disk)?;
    k.add_disk(disk)?;
    k.del_gendisk(disk)?;
    k.put_disk(Some(disk))?;
    Ok(())
}

fn gendisk_free_added(k: &mut Kernel) -> PathResult<()> {
    let disk = k.alloc_disk(1)?.value;
    if let Some(added) = disk {
        k.add_disk(added)?;
    }
    k.put_disk(disk)?;
    Ok(())
}

fn queue_leak(k: &mut Kernel) -> PathResult<()> {
    let lock = k.fresh_handle();
    let rfn = k.fresh_handle();
    k.spin_lock(lock);
    k.blk_init_queue(rfn, lock)?;
    k.spin_unlock(lock);
    Ok(())
}

fn sysfs_safe(k: &mut Kernel) -> PathResult<()> {
    let kobj = k.fresh_handle();
    let group = k.fresh_handle();
    if k.sysfs_create_group(kobj, group)?.value == 0 {
        k.sysfs_remove_group(kobj, group)?;
    }
    Ok(())
}

fn sysfs_leak(k: &mut Kernel) -> PathResult<()> {
    let kobj = k.fresh_handle();
    let group = k.fresh_handle();
    k.sysfs_create_group(kobj, group)?;
    Ok(())
}

fn module_safe(k: &mut Kernel) -> PathResult<()> {
    let module1 = k.any_ptr();
    let module2 = k.any_ptr();

    if k.try_module_get(module1)?.value {
        if k.try_module_get(module2)?.value {
            k.module_put(module2)?;
        }
        k.module_put(module1)?;
    }

    k.module_get(module1)?;
    k.module_put(module1)?;

    if module2.is_some() {
        k.module_get(module2)?;
        k.module_get(module2)?;
        k.module_put_and_exit(0)?;
        k.module_put(module2)?;
        k.module_put(module2)?;
        k.module_put(module2)?;
    }

    if module1.is_some() {
        k.module_get(module1)?;
        k.module_get(module1)?;
        if k.module_refcount(module1)?.value == 2 {
            k.module_put(module1)?;
            k.module_put(module1)?;
        }
    }
    Ok(())
}

fn module_refcount(k: &mut Kernel) -> PathResult<()> {
    let module1 = k.any_ptr();
    let module2 = k.any_ptr();

    k.module_get(module1)?;
    k.module_get(module2)?;
    if k.module_refcount(module1)?.value == 2 {
        k.module_put(module1)?;
        k.module_put(module2)?;
    }
    Ok(())
}

fn module_over_put(k: &mut Kernel) -> PathResult<()> {
    let module = Some(k.fresh_handle());
    k.module_get(module)?;
    k.module_get(module)?;
    k.module_put(module)?;
    k.module_put(module)?;
    k.module_put(module)?;
    Ok(())
}

fn ldv_usb_probe(k: &mut Kernel) -> PathResult<i64> {
    k.ldv_invoke_reached("ldv_usb_probe");
    let driver2 = k.fresh_handle();
    let _err = k.usb_register(driver2)?.value;
    Ok(0)
}

fn usb_probe_swallows_error(k: &mut Kernel) -> PathResult<()> {
    let driver = k.fresh_handle();
    if k.usb_register(driver)?.value != 0 {
        return Ok(());
    }

    k.ldv_register("ldv_usb_probe");
    let mut probe_ret = 0;
    k.ldv_invoke_callback("ldv_usb_probe", |k| {
        probe_ret = ldv_usb_probe(k)?;
        Ok(())
    })?;
    k.check_return_value_probe(probe_ret)?;
    k.ldv_deregister("ldv_usb_probe");

    k.usb_deregister(driver)?;
    Ok(())
}

fn usb_coherent_leak(k: &mut Kernel) -> PathResult<()> {
    let dev = k.fresh_handle();
    k.usb_alloc_coherent(dev, 4096)?;
    Ok(())
}

fn clk_unbalanced_disable(k: &mut Kernel) -> PathResult<()> {
    let dev = k.fresh_handle();
    let clk = k.clk_get(dev, "ldv")?.value;
    k.clk_disable(clk)?;
    Ok(())
}

/// Walks at most this many set bits
const BIT_WALK: usize = 3;

fn bitops_safe(k: &mut Kernel) -> PathResult<()> {
    let nr = k.nr_cpu_ids().unwrap_or(1);
    let mut cpu = k.find_first_bit(nr)?.value;
    for _ in 0..BIT_WALK {
        if cpu >= nr {
            break;
        }
        cpu = k.find_next_bit(nr, cpu + 1)?.value;
    }
    Ok(())
}

fn bitops_offset_overrun(k: &mut Kernel) -> PathResult<()> {
    let nr = k.nr_cpu_ids().unwrap_or(1);
    let cpu = k.find_first_bit(nr)?.value;
    k.find_next_bit(nr, cpu.saturating_add(1))?;
    Ok(())
}

fn workqueue_flush(k: &mut Kernel) -> PathResult<()> {
    let Some(_queue) = k.any_ptr() else {
        return Ok(());
    };
    k.ldv_register("ldv_handler");
    k.ldv_invoke_callback("ldv_handler", |k| {
        k.ldv_invoke_reached("ldv_handler");
        Ok(())
    })?;
    k.ldv_deregister("ldv_handler");
    Ok(())
}

fn timer_after_delete(k: &mut Kernel) -> PathResult<()> {
    let timer_fn = |k: &mut Kernel| -> PathResult<()> {
        k.ldv_invoke_reached("ldv_timer");
        Ok(())
    };
    k.ldv_register("ldv_timer");
    k.ldv_invoke_callback("ldv_timer", timer_fn)?;
    k.ldv_deregister("ldv_timer");
    if k.any_bool() {
        k.ldv_invoke_callback("ldv_timer", timer_fn)?;
    }
    Ok(())
}
