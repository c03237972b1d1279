//! Logging support for nos-demand-paging
//!
//! The `vm_*` macros forward to the `log` crate when the `log` feature is
//! enabled. Without it they only type-check their arguments, so call sites
//! need no `#[cfg]` of their own.

#[cfg(feature = "log")]
macro_rules! vm_trace {
    ($($arg:tt)*) => {
        log::trace!($($arg)*)
    };
}

#[cfg(feature = "log")]
macro_rules! vm_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[cfg(feature = "log")]
macro_rules! vm_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[cfg(feature = "log")]
macro_rules! vm_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[cfg(feature = "log")]
macro_rules! vm_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! vm_silent {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(not(feature = "log"))]
macro_rules! vm_trace {
    ($($arg:tt)*) => {
        vm_silent!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! vm_debug {
    ($($arg:tt)*) => {
        vm_silent!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! vm_info {
    ($($arg:tt)*) => {
        vm_silent!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! vm_warn {
    ($($arg:tt)*) => {
        vm_silent!($($arg)*)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! vm_error {
    ($($arg:tt)*) => {
        vm_silent!($($arg)*)
    };
}
