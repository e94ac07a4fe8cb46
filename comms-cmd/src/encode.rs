use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use comms::coding::{self, attach_sync_marker};
use comms::config::{tc::TRANSFER_FRAME_DATA_LENGTH, BLOCK_LENGTH};
use comms::framing::{TcFrameBuilder, TcFrameCounters, TmFrameCounters, TmTransferFrame};
use comms::spacepacket::{add_space_packet_to, add_telecommand_packet_to, SequenceCounters};
use comms::{Apid, DataField, Vcid, NORMAL_APID};
use tracing::debug;

/// A channel coded TM block carrying `payload` in one space packet.
pub fn tm_block(vcid: Vcid, apid: Apid, payload: &[u8], cadu: bool) -> Result<Vec<u8>> {
    let mut frame = TmTransferFrame::new(Arc::new(TmFrameCounters::new()));
    let packets = SequenceCounters::new();

    let mut building = frame.start_new(vcid).context("starting frame")?;
    add_space_packet_to(building.data_field(), &packets, apid == NORMAL_APID, apid, payload)
        .with_context(|| format!("payload of {} bytes does not fit a frame", payload.len()))?;
    building.finish();

    let mut block = frame
        .to_block()
        .ok_or_else(|| anyhow!("frame was not finished"))?;
    coding::tm::encode(&mut block);
    debug!(vcid = vcid.raw(), apid = apid.raw(), "encoded tm block");

    Ok(if cadu {
        attach_sync_marker(&block).to_vec()
    } else {
        block.to_vec()
    })
}

/// A channel coded TC block carrying `data`, either as a space packet or as
/// the raw frame data field.
pub fn tc_block(
    vcid: Vcid,
    apid: Option<Apid>,
    sequence_number: u8,
    data: &[u8],
) -> Result<Vec<u8>> {
    let counters = Arc::new(TcFrameCounters::new());
    for _ in 0..sequence_number {
        counters.post_increment(vcid);
    }
    let builder = TcFrameBuilder::new(counters);

    let frame = match apid {
        Some(apid) => {
            let mut storage = [0u8; TRANSFER_FRAME_DATA_LENGTH];
            let mut field = DataField::new(&mut storage);
            add_telecommand_packet_to(
                &mut field,
                &SequenceCounters::new(),
                apid == NORMAL_APID,
                apid,
                data,
            )
            .with_context(|| format!("data of {} bytes does not fit a packet", data.len()))?;
            builder.build(vcid, field.as_slice())
        }
        None => builder.build(vcid, data),
    }
    .context("building tc frame")?;

    let mut block = [0u8; BLOCK_LENGTH];
    block[..frame.len()].copy_from_slice(&frame);
    coding::tc::encode(&mut block);
    debug!(vcid = vcid.raw(), sequence_number, "encoded tc block");
    Ok(block.to_vec())
}

#[cfg(test)]
mod tests {
    use comms::config::{CADU_LENGTH, MESSAGE_LENGTH};
    use comms::framing::parse_as_transfer_frame;
    use comms::spacepacket::space_packets;
    use comms::PUS_VCID;

    use super::*;

    #[test]
    fn tm_block_length() {
        let block = tm_block(PUS_VCID, NORMAL_APID, &[0u8; 20], false).unwrap();
        assert_eq!(block.len(), BLOCK_LENGTH);
        let cadu = tm_block(PUS_VCID, NORMAL_APID, &[0u8; 20], true).unwrap();
        assert_eq!(cadu.len(), CADU_LENGTH);
    }

    #[test]
    fn tm_payload_too_large() {
        assert!(tm_block(PUS_VCID, NORMAL_APID, &[0u8; 300], false).is_err());
    }

    #[test]
    fn tc_block_decodes() {
        let request = [0x20, 23, 2, 0xAA, 0x33, 1];
        let mut block: coding::Block = tc_block(PUS_VCID, Some(NORMAL_APID), 7, &request)
            .unwrap()
            .try_into()
            .unwrap();
        coding::tc::decode(&mut block).unwrap();

        let frame = parse_as_transfer_frame(block[..MESSAGE_LENGTH].try_into().unwrap()).unwrap();
        assert_eq!(frame.header.frame_sequence_number, 7);
        let packets: Vec<_> = space_packets(frame.data_field).collect();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].as_ref().unwrap().data, request);
    }
}
