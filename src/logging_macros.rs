#![warn(clippy::all, rust_2018_idioms)]

/// Shared body for the context macros below: `[file:module:line] message`.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_context {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_with_context!(debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_with_context!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_with_context!(warn, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_with_context!(error, $($arg)*) };
}

/*
Log level guidelines:

DEBUG: per-page and per-batch progress inside one account's harvest
- page counts, continuation tokens seen, lookup batch sizes

INFO: run milestones
- accounts enumerated, account harvest finished, report written

WARN: recoverable per-account problems
- role assumption denied (account skipped)
- account name lookup fell back to the account id

ERROR: data that will be missing from the report
- an account's harvest failed validation or an API call failed
*/
