//! Closed-loop drive, heading and line-follow controllers for the Two-Wheel Bot
//! on no-std embedded platforms.
//!
//! All hardware access goes through the [`utils::hub::Hub`] trait; see the
//! `twb-app/mock-hub` binary for a runnable host-side setup against the
//! simulated hub.
#![cfg_attr(not(test), no_std)]

pub mod utils;
