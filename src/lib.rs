//! # S.Port Telemetry Library
//!
//! A FrSky S.Port (SmartPort) telemetry device that also serves MSP.
//!
//! The device reports sensor values in its own bus slot and answers MSP
//! requests tunnelled over S.Port by the flight controller, which lets the
//! flight controller read and change VTX settings held by this device.

pub mod config;
pub mod error;
pub mod exchange;
pub mod msp;
pub mod serial;
pub mod sport;
pub mod telemetry;
pub mod vtx;
