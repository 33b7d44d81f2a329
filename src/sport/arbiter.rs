//! # S.Port Slot Arbiter
//!
//! The S.Port bus is managed by the FrSky receiver. It cycles through the
//! physical IDs, sending a START marker and then the ID byte for each in turn,
//! and pauses after each one so the device owning that ID can transmit.
//!
//! Simple sensors only transmit in their own slot. A device can also listen to
//! what other devices transmit, which is how the flight controller and this
//! device exchange MSP traffic.

use super::decoder::{DecodeStatus, FrameDecoder};
use super::protocol::*;
use tracing::{error, trace};

/// Receives the outcome of slots the arbiter is interested in
pub trait SlotListener {
    /// A frame was received in a subscribed slot
    fn on_frame(&mut self, physical_id: PhysicalId, frame: &Frame);

    /// A published slot is empty and a frame may be written into it
    ///
    /// Return `None` to stay silent for this slot.
    fn on_transmit(&mut self, physical_id: PhysicalId) -> Option<Frame>;
}

/// Arbiter state within the slot cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    /// Waiting for a START marker; other bytes are ignored
    WaitStart,

    /// START seen, the next byte is the slot's physical ID
    WaitId,

    /// Decoding a frame sent by another device in a subscribed slot
    Listening(PhysicalId),
}

/// Tracks slot boundaries and routes bytes for subscribed and published IDs
#[derive(Debug)]
pub struct BusArbiter {
    state: ArbiterState,
    decoder: FrameDecoder,
    subscribe_ids: Vec<PhysicalId>,
    publish_ids: Vec<PhysicalId>,
}

impl BusArbiter {
    /// Create an arbiter with no subscriptions or publications
    pub fn new() -> Self {
        Self {
            state: ArbiterState::WaitStart,
            decoder: FrameDecoder::new(),
            subscribe_ids: Vec::new(),
            publish_ids: Vec::new(),
        }
    }

    /// Listen for frames sent by another device in this slot
    pub fn add_subscriber(&mut self, physical_id: PhysicalId) {
        if !self.subscribe_ids.contains(&physical_id) {
            self.subscribe_ids.push(physical_id);
        }
    }

    /// Transmit in this slot when it is free
    pub fn add_publisher(&mut self, physical_id: PhysicalId) {
        if !self.publish_ids.contains(&physical_id) {
            self.publish_ids.push(physical_id);
        }
    }

    /// Current state
    pub fn state(&self) -> ArbiterState {
        self.state
    }

    /// Feed one received byte
    ///
    /// # Arguments
    ///
    /// * `byte` - Byte read from the bus
    /// * `is_clear` - Whether the slot is currently empty: this byte is the last
    ///   one received and nothing else is buffered. Only evaluated for published IDs.
    /// * `listener` - Receives frames and transmit opportunities
    ///
    /// # Returns
    ///
    /// * `Option<Frame>` - A frame to write immediately, at most one per slot
    pub fn consume<F, L>(&mut self, byte: u8, is_clear: F, listener: &mut L) -> Option<Frame>
    where
        F: FnOnce() -> bool,
        L: SlotListener + ?Sized,
    {
        if byte == SPORT_START {
            self.state = ArbiterState::WaitId;
            return None;
        }

        match self.state {
            ArbiterState::WaitStart => {
                trace!("Ignoring 0x{:02X}", byte);
                None
            }
            ArbiterState::WaitId => self.handle_id(byte, is_clear, listener),
            ArbiterState::Listening(physical_id) => {
                match self.decoder.consume(byte) {
                    DecodeStatus::NeedMore => {}
                    DecodeStatus::Frame(frame) => {
                        self.state = ArbiterState::WaitStart;
                        listener.on_frame(physical_id, &frame);
                    }
                    DecodeStatus::Invalid => {
                        self.state = ArbiterState::WaitStart;
                    }
                }
                None
            }
        }
    }

    fn handle_id<F, L>(&mut self, byte: u8, is_clear: F, listener: &mut L) -> Option<Frame>
    where
        F: FnOnce() -> bool,
        L: SlotListener + ?Sized,
    {
        self.state = ArbiterState::WaitStart;

        let Some(physical_id) = PhysicalId::from_byte(byte) else {
            trace!("Ignoring invalid physical ID 0x{:02X}", byte);
            return None;
        };

        if self.subscribe_ids.contains(&physical_id) {
            self.decoder.reset();
            self.state = ArbiterState::Listening(physical_id);
            return None;
        }

        if !self.publish_ids.contains(&physical_id) {
            return None;
        }

        if !is_clear() {
            // Reading too slowly, or another device has taken this slot
            error!("{} slot already contains data", physical_id);
            return None;
        }

        let frame = listener.on_transmit(physical_id);
        if frame.is_none() {
            trace!("Nothing to transmit in {} slot", physical_id);
        }
        frame
    }
}

impl Default for BusArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sport::encoder::encode_frame;

    #[derive(Default)]
    struct RecordingListener {
        frames: Vec<(PhysicalId, Frame)>,
        transmits: Vec<PhysicalId>,
        reply: Option<Frame>,
    }

    impl SlotListener for RecordingListener {
        fn on_frame(&mut self, physical_id: PhysicalId, frame: &Frame) {
            self.frames.push((physical_id, *frame));
        }

        fn on_transmit(&mut self, physical_id: PhysicalId) -> Option<Frame> {
            self.transmits.push(physical_id);
            self.reply
        }
    }

    fn arbiter() -> BusArbiter {
        let mut arbiter = BusArbiter::new();
        arbiter.add_subscriber(PhysicalId::ID13);
        arbiter.add_publisher(PhysicalId::ID27);
        arbiter
    }

    fn feed(arbiter: &mut BusArbiter, bytes: &[u8], listener: &mut RecordingListener) -> Vec<Frame> {
        let last = bytes.len() - 1;
        bytes
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| arbiter.consume(b, || i == last, listener))
            .collect()
    }

    #[test]
    fn test_subscribed_slot_delivers_frame() {
        let frame = Frame::new(SPORT_FRAMEID_MSP_CLIENT, [0x30, 0x00, 0x01, 0x01, 0x00, 0x00]);
        let mut bytes = vec![SPORT_START, PhysicalId::ID13.as_byte()];
        bytes.extend(encode_frame(&frame));

        let mut listener = RecordingListener::default();
        let mut arbiter = arbiter();
        let written = feed(&mut arbiter, &bytes, &mut listener);

        assert!(written.is_empty());
        assert_eq!(listener.frames, vec![(PhysicalId::ID13, frame)]);
        assert_eq!(arbiter.state(), ArbiterState::WaitStart);
    }

    #[test]
    fn test_published_slot_clear_transmits() {
        let reply = Frame::sensor(0x0400, 5);
        let mut listener = RecordingListener {
            reply: Some(reply),
            ..Default::default()
        };
        let mut arbiter = arbiter();

        let written = feed(&mut arbiter, &[SPORT_START, PhysicalId::ID27.as_byte()], &mut listener);

        assert_eq!(written, vec![reply]);
        assert_eq!(listener.transmits, vec![PhysicalId::ID27]);
    }

    #[test]
    fn test_published_slot_not_clear_is_skipped() {
        let mut listener = RecordingListener {
            reply: Some(Frame::sensor(0x0400, 5)),
            ..Default::default()
        };
        let mut arbiter = arbiter();

        // Another device is already answering in our slot
        let bytes = [SPORT_START, PhysicalId::ID27.as_byte(), 0x10, 0x00];
        let written = feed(&mut arbiter, &bytes, &mut listener);

        assert!(written.is_empty());
        assert!(listener.transmits.is_empty());
    }

    #[test]
    fn test_unclaimed_slot_is_ignored() {
        let mut listener = RecordingListener::default();
        let mut arbiter = arbiter();

        let mut bytes = vec![SPORT_START, PhysicalId::from_index(5).unwrap().as_byte()];
        bytes.extend(encode_frame(&Frame::sensor(0x0100, 1)));
        feed(&mut arbiter, &bytes, &mut listener);

        assert!(listener.frames.is_empty());
        assert!(listener.transmits.is_empty());
    }

    #[test]
    fn test_start_marker_resets_partial_frame() {
        let frame = Frame::sensor(0x0400, 42);
        let encoded = encode_frame(&frame);

        let mut bytes = vec![SPORT_START, PhysicalId::ID13.as_byte()];
        bytes.extend(&encoded[..3]);
        bytes.extend([SPORT_START, PhysicalId::ID13.as_byte()]);
        bytes.extend(&encoded);

        let mut listener = RecordingListener::default();
        let mut arbiter = arbiter();
        feed(&mut arbiter, &bytes, &mut listener);

        assert_eq!(listener.frames, vec![(PhysicalId::ID13, frame)]);
    }

    #[test]
    fn test_invalid_frame_not_delivered() {
        let mut encoded = encode_frame(&Frame::sensor(0x0400, 42));
        let last = encoded.len() - 1;
        encoded[last] ^= 0x01;

        let mut bytes = vec![SPORT_START, PhysicalId::ID13.as_byte()];
        bytes.extend(encoded);

        let mut listener = RecordingListener::default();
        let mut arbiter = arbiter();
        feed(&mut arbiter, &bytes, &mut listener);

        assert!(listener.frames.is_empty());
        assert_eq!(arbiter.state(), ArbiterState::WaitStart);
    }

    #[test]
    fn test_bytes_before_first_start_ignored() {
        let mut listener = RecordingListener {
            reply: Some(Frame::sensor(0x0400, 5)),
            ..Default::default()
        };
        let mut arbiter = arbiter();

        let written = feed(&mut arbiter, &[PhysicalId::ID27.as_byte()], &mut listener);
        assert!(written.is_empty());
        assert_eq!(arbiter.state(), ArbiterState::WaitStart);
    }
}
