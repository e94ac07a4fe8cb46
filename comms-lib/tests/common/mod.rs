#![allow(dead_code)]

use std::sync::Arc;

use comms::coding::{self, Block};
use comms::config::{tc::TRANSFER_FRAME_DATA_LENGTH, BLOCK_LENGTH, MESSAGE_LENGTH};
use comms::framing::{tc, TcFrameBuilder, TcFrameCounters};
use comms::spacepacket::{add_telecommand_packet_to, tc as pus, SequenceCounters};
use comms::{DataField, Payload, Vcid, NORMAL_APID};
use rand::seq::index::sample;
use rand::Rng;

/// XOR `n` distinct bytes of `block` with random non-zero values.
pub fn corrupt(block: &mut Block, n: usize) {
    let mut rng = rand::thread_rng();
    for index in sample(&mut rng, block.len(), n) {
        block[index] ^= rng.gen_range(1..=u8::MAX);
    }
}

/// The transfer frame at the start of a block.
pub fn frame_of(block: &Block) -> &[u8; MESSAGE_LENGTH] {
    block[..MESSAGE_LENGTH]
        .try_into()
        .expect("blocks start with a frame")
}

/// Channel code a frame the way the radio receives it.
pub fn uplink(frame: &tc::Frame) -> Block {
    let mut block = [0u8; BLOCK_LENGTH];
    block[..MESSAGE_LENGTH].copy_from_slice(frame);
    coding::tc::encode(&mut block);
    block
}

/// Ground station state for sending requests.
pub struct Ground {
    pub frames: TcFrameBuilder,
    pub packets: SequenceCounters,
}

impl Ground {
    pub fn new() -> Self {
        Self {
            frames: TcFrameBuilder::new(Arc::new(TcFrameCounters::new())),
            packets: SequenceCounters::new(),
        }
    }

    /// A TC frame carrying one space packet per request.
    pub fn requests(&self, vcid: Vcid, requests: &[pus::Request<'_>]) -> tc::Frame {
        let mut storage = [0u8; TRANSFER_FRAME_DATA_LENGTH];
        let mut field = DataField::new(&mut storage);
        for request in requests {
            add_telecommand_packet_to(&mut field, &self.packets, true, NORMAL_APID, request)
                .expect("requests fit into one frame");
        }
        self.frames
            .build(vcid, field.as_slice())
            .expect("data field fits")
    }

    /// A TC frame carrying `payload` as is.
    pub fn raw<P: Payload + ?Sized>(&self, vcid: Vcid, payload: &P) -> tc::Frame {
        self.frames.build(vcid, payload).expect("payload fits")
    }
}
