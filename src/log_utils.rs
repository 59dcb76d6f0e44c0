pub use log::debug;

/// Print a debug message for either of two scenarios:
/// (1) The global debug log level has been activated
/// (2) A local verbose flag has been enabled
///
/// The local flag is given as the first argument. When it is set the message is printed directly
/// to stderr regardless of the log level.
///
/// # Examples
///
/// ```ignore
/// debug_msg!(false, "Skipped read {}", x); // logs at debug level, shown only with --debug
/// debug_msg!(true, "Skipped read {}", x); // prints directly to stderr
/// ```
macro_rules! debug_msg {
    ($flag:expr, $($arg:tt)+) => {
        if $flag {
            eprintln!($($arg)+);
        } else {
            $crate::log_utils::debug!($($arg)+);
        }
    }
}

pub(crate) use debug_msg;
