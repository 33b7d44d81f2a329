//! # MSP Module
//!
//! MultiWii Serial Protocol (MSP) tunnelled through S.Port frames.
//!
//! This module handles:
//! - Reassembling requests spread across several 6-byte frame payloads
//! - Fragmenting responses into 6-byte frame payloads
//! - Dispatching requests to registered command handlers

pub mod protocol;
pub mod request;
pub mod response;
pub mod command;
