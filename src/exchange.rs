//! # S.Port Exchange
//!
//! Connects the slot arbiter to MSP and to the sensors.
//!
//! Requests arrive as MSP client frames in the receive slot. Responses and
//! sensor values leave in the transmit slot, with a pending response taking
//! priority over sensor values.

use tracing::{debug, warn};

use crate::msp::command::{CommandContext, CommandRegistry};
use crate::msp::protocol::MspResponse;
use crate::msp::request::MspRequestReassembler;
use crate::msp::response::MspResponseFragmenter;
use crate::sport::arbiter::{BusArbiter, SlotListener};
use crate::sport::protocol::*;
use crate::telemetry::Sensor;

/// MSP server and sensor publisher for one pair of physical IDs
pub struct SportExchange {
    transmit_id: PhysicalId,
    receive_id: PhysicalId,
    reassembler: MspRequestReassembler,
    fragmenter: MspResponseFragmenter,
    sensors: Vec<Box<dyn Sensor>>,
    sensor_index: usize,
    registry: CommandRegistry,
    ctx: CommandContext,
}

impl std::fmt::Debug for SportExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportExchange")
            .field("transmit_id", &self.transmit_id)
            .field("receive_id", &self.receive_id)
            .field("sensors", &self.sensors.len())
            .field("response_pending", &self.fragmenter.is_pending())
            .finish_non_exhaustive()
    }
}

impl SportExchange {
    /// Create an exchange
    ///
    /// # Arguments
    ///
    /// * `transmit_id` - Slot used for responses and sensor values
    /// * `receive_id` - Slot the flight controller sends requests in
    /// * `registry` - MSP command handlers
    /// * `ctx` - Configuration the handlers operate on
    pub fn new(
        transmit_id: PhysicalId,
        receive_id: PhysicalId,
        registry: CommandRegistry,
        ctx: CommandContext,
    ) -> Self {
        Self {
            transmit_id,
            receive_id,
            reassembler: MspRequestReassembler::new(),
            fragmenter: MspResponseFragmenter::new(),
            sensors: Vec::new(),
            sensor_index: 0,
            registry,
            ctx,
        }
    }

    /// Set the sensors reported when no response is pending
    pub fn set_sensors(&mut self, sensors: Vec<Box<dyn Sensor>>) {
        self.sensors = sensors;
        self.sensor_index = 0;
    }

    /// Subscribe and publish this exchange's slots on an arbiter
    pub fn register(&self, arbiter: &mut BusArbiter) {
        arbiter.add_publisher(self.transmit_id);
        arbiter.add_subscriber(self.receive_id);
    }

    pub fn transmit_id(&self) -> PhysicalId {
        self.transmit_id
    }

    pub fn receive_id(&self) -> PhysicalId {
        self.receive_id
    }

    /// Configuration the command handlers operate on
    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    fn set_response(&mut self, response: MspResponse) {
        self.fragmenter.set_response(response);
    }

    fn next_sensor_frame(&mut self) -> Option<Frame> {
        if self.sensors.is_empty() {
            return None;
        }

        let sensor = &mut self.sensors[self.sensor_index];
        let frame = Frame::sensor(sensor.id(), sensor.value());
        self.sensor_index = (self.sensor_index + 1) % self.sensors.len();
        Some(frame)
    }
}

impl SlotListener for SportExchange {
    fn on_frame(&mut self, physical_id: PhysicalId, frame: &Frame) {
        if physical_id != self.receive_id {
            return;
        }

        if frame.id != SPORT_FRAMEID_MSP_CLIENT {
            warn!("Ignoring frame with ID 0x{:02X} from {}", frame.id, physical_id);
            return;
        }

        match self.reassembler.consume(&frame.payload) {
            Ok(Some(request)) => {
                let response = self.registry.dispatch(&mut self.ctx, &request);
                self.set_response(response);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Rejecting MSP request: {}", e);
                self.set_response(MspResponse::from_error(&e));
            }
        }
    }

    fn on_transmit(&mut self, physical_id: PhysicalId) -> Option<Frame> {
        if physical_id != self.transmit_id {
            return None;
        }

        if self.fragmenter.is_pending() {
            let mut frame = Frame::new(SPORT_FRAMEID_MSP_SERVER, [0u8; SPORT_PAYLOAD_SIZE]);
            let fragment = self.fragmenter.fragment(&mut frame.payload);
            debug!("MSP response fragment {:02X?} ({:?})", frame.payload, fragment);
            return Some(frame);
        }

        self.next_sensor_frame()
    }
}
