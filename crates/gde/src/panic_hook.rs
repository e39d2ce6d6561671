//! Panic logging
//!
//! Input panics are contained by the scheduler, but the hook sees them
//! first, so every panic lands in the configured log destination with a
//! backtrace.

use std::backtrace::Backtrace;
use std::panic::{PanicHookInfo, take_hook};
use std::thread;

/// Install a hook that logs panics via `tracing` before the default hook runs
pub fn install() {
    let previous_hook = take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tracing::error!(target: "gde::panic", "{}", format_panic_record(panic_info));
        }));

        previous_hook(panic_info);
    }));
}

fn format_panic_record(panic_info: &PanicHookInfo<'_>) -> String {
    let location = panic_info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_else(|| "<unknown>".to_string());

    let thread_name = thread::current()
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| "<unnamed>".to_string());

    format!(
        "PANIC thread={} location={} payload={}\nBacktrace:\n{}",
        thread_name,
        location,
        payload(panic_info),
        Backtrace::force_capture()
    )
}

fn payload(panic_info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = panic_info.payload().downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = panic_info.payload().downcast_ref::<String>() {
        return s.clone();
    }
    panic_info.to_string()
}
