//! # S.Port Protocol Module
//!
//! Implementation of the FrSky S.Port (SmartPort) bus protocol.
//!
//! This module handles:
//! - Frame encoding with START/ESCAPE byte stuffing
//! - Byte-by-byte frame decoding and checksum validation
//! - Slot arbitration (start marker, physical ID, transmit opportunities)

pub mod protocol;
pub mod checksum;
pub mod encoder;
pub mod decoder;
pub mod arbiter;
