/*
 * Support Utilities
 *
 * Infrastructure shared by the rest of the thread core. Currently just the
 * logger that routes the `log` facade to the host's standard error.
 */

pub mod logger;
