//! # MSP Commands
//!
//! Maps MSP command IDs to handlers and runs completed requests through them.
//!
//! Handlers read the request with [`bytes::Buf`] and write the response with
//! [`bytes::BufMut`], little-endian throughout. A request may be shorter than
//! the full structure a handler understands: handlers check what remains
//! before each optional field and stop at the first one that is missing.

pub mod vtx;

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::protocol::{MspError, MspRequest, MspResponse};
use crate::vtx::{Persist, VtxConfig};
pub use vtx::{SetVtxConfigCommand, VtxConfigCommand, VtxTableBandCommand, VtxTablePowerLevelCommand};

/// MSP_API_VERSION
pub const MSP_API_VERSION: u8 = 1;

/// MSP_VTX_CONFIG
pub const MSP_VTX_CONFIG: u8 = 88;

/// MSP_SET_VTX_CONFIG
pub const MSP_SET_VTX_CONFIG: u8 = 89;

/// MSP_VTXTABLE_BAND
pub const MSP_VTXTABLE_BAND: u8 = 137;

/// MSP_VTXTABLE_POWERLEVEL
pub const MSP_VTXTABLE_POWERLEVEL: u8 = 138;

/// MSP_EEPROM_WRITE, i.e. save all settings
pub const MSP_EEPROM_WRITE: u8 = 250;

/// Initial response buffer capacity
const RESPONSE_CAPACITY: usize = 64;

/// Failures inside a command handler
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required request field was absent
    #[error("request is missing {0}")]
    MissingField(&'static str),

    /// Band index outside the VTX table
    #[error("no VTX band {0}")]
    UnknownBand(u8),

    /// Power level index outside the VTX table
    #[error("no VTX power level {0}")]
    UnknownPowerLevel(u8),
}

/// State the command handlers operate on
///
/// Built once at startup and owned by the exchange.
#[derive(Debug)]
pub struct CommandContext {
    pub vtx: VtxConfig,
}

impl CommandContext {
    pub fn new(vtx: VtxConfig) -> Self {
        Self { vtx }
    }

    /// Every configuration the save-all command writes out
    pub fn configs(&self) -> [&dyn Persist; 1] {
        [&self.vtx]
    }
}

/// An MSP command handler
pub trait MspCommand {
    /// Command ID this handler answers
    fn id(&self) -> u8;

    /// Handle one request
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared configuration
    /// * `request` - Request payload, consumed as it is read
    /// * `response` - Response payload to fill in
    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        request: &mut &[u8],
        response: &mut BytesMut,
    ) -> Result<(), CommandError>;
}

/// Write a length-prefixed byte string
pub(crate) fn write_with_length(response: &mut BytesMut, bytes: &[u8]) {
    response.put_u8(bytes.len() as u8);
    response.put_slice(bytes);
}

/// Reports the MSP API version
#[derive(Debug, Default)]
pub struct ApiVersionCommand;

impl ApiVersionCommand {
    /// Distinct from the version in the MSP frame header
    pub const PROTOCOL_VERSION: u8 = 0;

    /// Betaflight API version this device claims to speak
    pub const VERSION_MAJOR: u8 = 1;
    pub const VERSION_MINOR: u8 = 43;
}

impl MspCommand for ApiVersionCommand {
    fn id(&self) -> u8 {
        MSP_API_VERSION
    }

    fn handle_request(
        &self,
        _ctx: &mut CommandContext,
        _request: &mut &[u8],
        response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        response.put_u8(Self::PROTOCOL_VERSION);
        response.put_u8(Self::VERSION_MAJOR);
        response.put_u8(Self::VERSION_MINOR);
        Ok(())
    }
}

/// Saves every registered configuration
#[derive(Debug, Default)]
pub struct SaveAllCommand;

impl MspCommand for SaveAllCommand {
    fn id(&self) -> u8 {
        MSP_EEPROM_WRITE
    }

    fn handle_request(
        &self,
        ctx: &mut CommandContext,
        _request: &mut &[u8],
        _response: &mut BytesMut,
    ) -> Result<(), CommandError> {
        for config in ctx.configs() {
            match config.save() {
                Ok(()) => debug!("Saved {} config", config.name()),
                // Usually a read-only filesystem; the exchange still succeeds
                Err(e) => error!("Failed to save {} config: {}", config.name(), e),
            }
        }
        Ok(())
    }
}

/// Registered MSP command handlers, keyed by command ID
pub struct CommandRegistry {
    commands: HashMap<u8, Box<dyn MspCommand>>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Create a registry with the API version, VTX and save-all commands
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ApiVersionCommand));
        registry.register(Box::new(VtxConfigCommand));
        registry.register(Box::new(SetVtxConfigCommand));
        registry.register(Box::new(VtxTableBandCommand));
        registry.register(Box::new(VtxTablePowerLevelCommand));
        registry.register(Box::new(SaveAllCommand));
        registry
    }

    /// Add a handler, replacing any existing handler for the same ID
    pub fn register(&mut self, command: Box<dyn MspCommand>) {
        let id = command.id();
        if self.commands.insert(id, command).is_some() {
            warn!("Replaced handler for MSP command {}", id);
        }
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a request through its handler
    ///
    /// Never fails: unknown commands and handler failures become error
    /// responses with the generic error code.
    pub fn dispatch(&self, ctx: &mut CommandContext, request: &MspRequest) -> MspResponse {
        let command_id = request.command_id;

        let Some(command) = self.commands.get(&command_id) else {
            let err = MspError::UnknownCommand { command_id };
            error!("{}", err);
            return MspResponse::from_error(&err);
        };

        let mut reader = &request.payload[..];
        let mut response = BytesMut::with_capacity(RESPONSE_CAPACITY);

        match command.handle_request(ctx, &mut reader, &mut response) {
            Ok(()) => MspResponse::new(command_id, response.to_vec()),
            Err(e) => {
                let err = MspError::Handler {
                    command_id,
                    reason: e.to_string(),
                };
                error!("{}", err);
                MspResponse::from_error(&err)
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msp::protocol::MSP_ERROR_GENERIC;
    use crate::vtx::tests::{accepting_store, sample_table};
    use crate::vtx::MockConfigStore;
    use std::io;

    fn context() -> CommandContext {
        CommandContext::new(VtxConfig::new(sample_table(), accepting_store()))
    }

    fn request(command_id: u8, payload: &[u8]) -> MspRequest {
        MspRequest {
            command_id,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = CommandRegistry::with_defaults();
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_api_version() {
        let registry = CommandRegistry::with_defaults();
        let response = registry.dispatch(&mut context(), &request(MSP_API_VERSION, &[]));

        assert_eq!(response, MspResponse::new(1, vec![0, 1, 43]));
    }

    #[test]
    fn test_unknown_command() {
        let registry = CommandRegistry::with_defaults();
        let response = registry.dispatch(&mut context(), &request(42, &[1, 2, 3]));

        assert!(response.is_error);
        assert_eq!(response.command_id, 42);
        assert_eq!(response.payload, vec![MSP_ERROR_GENERIC]);
    }

    #[test]
    fn test_handler_error_becomes_error_response() {
        let registry = CommandRegistry::with_defaults();
        let response = registry.dispatch(&mut context(), &request(MSP_VTXTABLE_BAND, &[9]));

        assert!(response.is_error);
        assert_eq!(response.command_id, MSP_VTXTABLE_BAND);
        assert_eq!(response.payload, vec![MSP_ERROR_GENERIC]);
    }

    #[test]
    fn test_identical_requests_identical_responses() {
        let registry = CommandRegistry::with_defaults();
        let mut ctx = context();

        for req in [
            request(MSP_API_VERSION, &[]),
            request(MSP_VTX_CONFIG, &[]),
            request(MSP_VTXTABLE_BAND, &[2]),
            request(MSP_SET_VTX_CONFIG, &[0x0A, 0x00, 0x02, 0x00]),
        ] {
            let first = registry.dispatch(&mut ctx, &req);
            let second = registry.dispatch(&mut ctx, &req);
            assert_eq!(first, second, "responses differ for command {}", req.command_id);
        }
    }

    #[test]
    fn test_save_all_saves_each_config() {
        let mut store = MockConfigStore::new();
        store.expect_save().times(1).returning(|_| Ok(()));
        let mut ctx = CommandContext::new(VtxConfig::new(sample_table(), Box::new(store)));

        let registry = CommandRegistry::with_defaults();
        let response = registry.dispatch(&mut ctx, &request(MSP_EEPROM_WRITE, &[]));

        assert_eq!(response, MspResponse::new(MSP_EEPROM_WRITE, vec![]));
    }

    #[test]
    fn test_save_all_io_failure_is_not_fatal() {
        let mut store = MockConfigStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only filesystem")));
        let mut ctx = CommandContext::new(VtxConfig::new(sample_table(), Box::new(store)));

        let registry = CommandRegistry::with_defaults();
        let response = registry.dispatch(&mut ctx, &request(MSP_EEPROM_WRITE, &[]));

        assert!(!response.is_error);
        assert!(response.payload.is_empty());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(ApiVersionCommand));
        registry.register(Box::new(ApiVersionCommand));
        assert_eq!(registry.len(), 1);
    }
}
