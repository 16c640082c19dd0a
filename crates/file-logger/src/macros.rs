//! Call-site macros capturing `file!()` and `line!()`

/// Log at an explicit level through a [`FileLogger`](crate::FileLogger).
///
/// ```ignore
/// log_at!(logger, Level::Info, "Hello, {} count({})", "world", 7);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log(file!(), line!(), $level, format_args!($($arg)+))
    };
}

/// Log an [`Error`](crate::Level::Error) entry
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a [`Warning`](crate::Level::Warning) entry
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Warning, $($arg)+)
    };
}

/// Log an [`Info`](crate::Level::Info) entry
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a [`Debug`](crate::Level::Debug) entry
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Debug, $($arg)+)
    };
}
