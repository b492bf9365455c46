#![no_std]

//! Logging shim. Every macro forwards to `defmt` and/or `log`, depending on
//! which feature the calling crate enables, and compiles to nothing otherwise.

#[doc(hidden)]
#[macro_export]
macro_rules! __forward {
    ($level:ident, $($args:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::$level!($($args)*);
        #[cfg(feature = "log")]
        log::$level!($($args)*);
    };
}

#[macro_export]
macro_rules! trace {
    ($($args:tt)*) => {
        $crate::__forward!(trace, $($args)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)*) => {
        $crate::__forward!(debug, $($args)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)*) => {
        $crate::__forward!(info, $($args)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)*) => {
        $crate::__forward!(warn, $($args)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($args:tt)*) => {
        $crate::__forward!(error, $($args)*)
    };
}
