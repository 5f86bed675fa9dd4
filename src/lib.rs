#![cfg_attr(target_os = "none", no_std)]

pub mod dispatch;
pub mod hmi;
pub mod signal_source;

#[cfg(target_os = "none")]
pub mod hardware;

/// Build-time information (from `built`).
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
