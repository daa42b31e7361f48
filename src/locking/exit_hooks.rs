// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Process-wide registry of callbacks run once at normal process exit.
//!
//! On Unix the first registration installs a `libc::atexit` trampoline that
//! drains the registry when the process returns from `main` or calls
//! `std::process::exit`. Hosts may also call [`run_exit_hooks`] themselves,
//! which is required on targets without `atexit` support.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

type ExitHook = Box<dyn FnOnce() + Send + 'static>;

/// Handle returned by [`register`], used to withdraw a hook with [`unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitHookId(u64);

#[derive(Default)]
struct RegisteredHooks {
    next_id: u64,
    hooks: BTreeMap<u64, ExitHook>,
}

struct ExitHookRegistry {
    inner: Mutex<RegisteredHooks>,
}

impl ExitHookRegistry {
    fn new() -> Self {
        install_process_exit_trampoline();
        Self {
            inner: Mutex::new(RegisteredHooks::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegisteredHooks> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, hook: ExitHook) -> ExitHookId {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.hooks.insert(id, hook);
        ExitHookId(id)
    }

    fn remove(&self, id: ExitHookId) -> bool {
        self.lock().hooks.remove(&id.0).is_some()
    }

    fn drain(&self) -> BTreeMap<u64, ExitHook> {
        std::mem::take(&mut self.lock().hooks)
    }
}

static GLOBAL_REGISTRY: OnceLock<ExitHookRegistry> = OnceLock::new();

/// Registers `hook` to run once when the process exits.
pub fn register<F>(hook: F) -> ExitHookId
where
    F: FnOnce() + Send + 'static,
{
    GLOBAL_REGISTRY
        .get_or_init(ExitHookRegistry::new)
        .insert(Box::new(hook))
}

/// Withdraws a hook that has not run yet.
///
/// Returns `false` when the hook already ran or was withdrawn before.
pub fn unregister(id: ExitHookId) -> bool {
    GLOBAL_REGISTRY
        .get()
        .is_some_and(|registry| registry.remove(id))
}

/// Number of hooks waiting to run.
pub fn pending_exit_hooks() -> usize {
    GLOBAL_REGISTRY
        .get()
        .map_or(0, |registry| registry.lock().hooks.len())
}

/// Runs and removes every registered hook, most recent first.
///
/// Returns the number of hooks executed. A panicking hook is logged and does
/// not prevent the remaining hooks from running. The registry is not locked
/// while hooks run, so a hook may register or withdraw other hooks.
pub fn run_exit_hooks() -> usize {
    let Some(registry) = GLOBAL_REGISTRY.get() else {
        return 0;
    };

    let hooks = registry.drain();
    let count = hooks.len();
    for (_, hook) in hooks.into_iter().rev() {
        if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
            warn!("Exit hook panicked; continuing with remaining hooks");
        }
    }

    if count > 0 {
        debug!("Ran {count} exit hook(s)");
    }
    count
}

#[cfg(unix)]
fn install_process_exit_trampoline() {
    extern "C" fn trampoline() {
        run_exit_hooks();
    }

    // SAFETY: `trampoline` is a plain `extern "C"` function with no arguments
    // that never unwinds (panics are caught inside `run_exit_hooks`).
    let status = unsafe { libc::atexit(trampoline) };
    if status != 0 {
        warn!("Failed to register process exit handler (status {status})");
    }
}

#[cfg(not(unix))]
fn install_process_exit_trampoline() {
    debug!("No atexit support on this target; call run_exit_hooks() before exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    #[serial]
    fn hooks_run_once() {
        run_exit_hooks();
        let counter = Arc::new(AtomicUsize::new(0));
        let observed = counter.clone();
        register(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(run_exit_hooks(), 1);
        assert_eq!(run_exit_hooks(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn hooks_run_in_reverse_registration_order() {
        run_exit_hooks();
        let order = Arc::new(Mutex::new(Vec::new()));
        for idx in 0..3 {
            let order = order.clone();
            register(move || order.lock().unwrap().push(idx));
        }

        assert_eq!(run_exit_hooks(), 3);
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    #[serial]
    fn panicking_hook_does_not_stop_others() {
        run_exit_hooks();
        let counter = Arc::new(AtomicUsize::new(0));
        let observed = counter.clone();
        register(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        register(|| panic!("hook failure"));

        assert_eq!(run_exit_hooks(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn unregistered_hook_never_runs() {
        run_exit_hooks();
        let counter = Arc::new(AtomicUsize::new(0));
        let observed = counter.clone();
        let id = register(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        let kept = register(|| {});
        assert_eq!(pending_exit_hooks(), 2);

        assert!(unregister(id));
        assert!(!unregister(id));
        assert_eq!(pending_exit_hooks(), 1);

        assert_eq!(run_exit_hooks(), 1);
        assert!(!unregister(kept));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
