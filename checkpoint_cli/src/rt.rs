//! Real-time scheduling helper (Linux SCHED_FIFO).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    // Apply SCHED_FIFO priority, clamped to the system range.
    #[inline]
    fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let has_cap = status.lines().any(|line| {
                if line.starts_with("CapEff:")
                    && let Some(hex) = line.split_whitespace().nth(1)
                    && let Ok(caps) = u64::from_str_radix(hex, 16)
                {
                    // CAP_SYS_NICE
                    return caps & 0x800000 != 0;
                }
                false
            });
            let is_root = unsafe { libc::geteuid() == 0 };
            if !has_cap && !is_root {
                eyre::bail!(
                    "insufficient privileges for SCHED_FIFO: needs CAP_SYS_NICE or root. \
                    Hint: 'sudo setcap cap_sys_nice=ep /path/to/checkpoint'"
                );
            }
        }

        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 {
                (1, 99)
            } else {
                (min, max)
            }
        };
        let prio_val = prio.unwrap_or(max).clamp(min, max);
        let param = sched_param {
            sched_priority: prio_val,
        };
        let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            Err(eyre::eyre!(std::io::Error::last_os_error()))
        } else {
            Ok(prio_val)
        }
    }

    RT_ONCE.get_or_init(|| match try_apply_fifo_priority(prio) {
        Ok(p) => tracing::info!(prio = p, "RT: SCHED_FIFO enabled"),
        Err(err) => {
            let prio_dbg = prio.map_or_else(|| "(max)".into(), |p| p.to_string());
            tracing::warn!(prio = %prio_dbg, error = %err, "RT: sched_setscheduler(SCHED_FIFO) failed");
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("RT: SCHED_FIFO is only supported on Linux; running with normal scheduling");
    }
}
