use std::io::{stdout, Write};

use anyhow::{anyhow, Context, Result};
use comms::cfdp::{
    parse_as_file_data_pdu, parse_as_file_directive, parse_as_protocol_data_unit, FileDirective,
    PduType, ProtocolDataUnitHeader,
};
use comms::coding::{self, Block};
use comms::config::{BLOCK_LENGTH, MESSAGE_LENGTH};
use comms::framing::{parse_as_transfer_frame, TcPrimaryHeader};
use comms::spacepacket::{space_packets, tc, PrimaryHeader, SpacePacket};
use comms::{CFDP_VCID, PUS_VCID};
use handlebars::handlebars_helper;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Serialize)]
struct Request {
    header: tc::SecondaryHeader,
    service: u8,
    subtype: u8,
    application_data: String,
}

#[derive(Debug, Serialize)]
struct Packet {
    header: PrimaryHeader,
    request: Option<Request>,
    data: String,
    error: Option<String>,
}

impl From<SpacePacket<'_>> for Packet {
    fn from(packet: SpacePacket<'_>) -> Self {
        let mut summary = Packet {
            header: packet.header,
            request: None,
            data: hex::encode(packet.data),
            error: None,
        };
        if !packet.header.has_secondary_header {
            return summary;
        }
        match tc::parse_as_request(packet.data) {
            Ok(request) => {
                summary.request = Some(Request {
                    header: request.header,
                    service: request.header.message_type_id.service_type(),
                    subtype: request.header.message_type_id.subtype(),
                    application_data: hex::encode(request.application_data),
                });
            }
            Err(err) => summary.error = Some(err.to_string()),
        }
        summary
    }
}

#[derive(Debug, Serialize)]
struct FileData {
    offset: u32,
    length: usize,
}

#[derive(Debug, Serialize)]
struct Pdu<'a> {
    header: Option<ProtocolDataUnitHeader>,
    directive: Option<FileDirective<'a>>,
    file_data: Option<FileData>,
    error: Option<String>,
}

impl<'a> Pdu<'a> {
    fn parse(data_field: &'a [u8]) -> Self {
        let mut summary = Pdu {
            header: None,
            directive: None,
            file_data: None,
            error: None,
        };
        let pdu = match parse_as_protocol_data_unit(data_field) {
            Ok(pdu) => pdu,
            Err(err) => {
                summary.error = Some(err.to_string());
                return summary;
            }
        };
        summary.header = Some(pdu.header);
        let result = match pdu.header.pdu_type {
            PduType::FileData => parse_as_file_data_pdu(pdu.data_field).map(|data| {
                summary.file_data = Some(FileData {
                    offset: data.offset,
                    length: data.file_data.len(),
                });
            }),
            PduType::FileDirective => parse_as_file_directive(pdu.data_field).map(|directive| {
                summary.directive = Some(directive);
            }),
        };
        if let Err(err) = result {
            summary.error = Some(err.to_string());
        }
        summary
    }
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    corrected_symbols: usize,
    header: TcPrimaryHeader,
    packets: Vec<Packet>,
    pdu: Option<Pdu<'a>>,
}

fn summarize(frame: &[u8; MESSAGE_LENGTH], corrected_symbols: usize) -> Result<Summary<'_>> {
    let frame = parse_as_transfer_frame(frame).context("invalid tc transfer frame")?;
    let mut summary = Summary {
        corrected_symbols,
        header: frame.header,
        packets: Vec::default(),
        pdu: None,
    };

    if frame.header.vcid == PUS_VCID {
        for packet in space_packets(frame.data_field) {
            match packet {
                Ok(packet) => summary.packets.push(packet.into()),
                Err(err) => {
                    debug!(error = %err, "stopped at invalid space packet");
                    break;
                }
            }
        }
    } else if frame.header.vcid == CFDP_VCID {
        summary.pdu = Some(Pdu::parse(frame.data_field));
    }
    Ok(summary)
}

/// Channel decode a TC block, parse it down to its packets or PDU and print
/// the result.
pub fn decode(data: &[u8], format: &Format) -> Result<()> {
    let mut block: Block = data
        .try_into()
        .map_err(|_| anyhow!("expected a block of {BLOCK_LENGTH} bytes, got {}", data.len()))?;
    let corrected = coding::tc::decode(&mut block).context("failed to decode block")?;
    let frame: &[u8; MESSAGE_LENGTH] = block[..MESSAGE_LENGTH]
        .try_into()
        .context("block shorter than a frame")?;
    let summary = summarize(frame, corrected)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &summary).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&summary)?;
            stdout()
                .write_all(data.as_bytes())
                .context("writing to stdout")
        }
    }
}

fn render_text(summary: &Summary<'_>) -> Result<String> {
    handlebars_helper!(json: |v: Json| v.to_string());
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("json", Box::new(json));
    hb.register_template_string("summary", TEXT_TEMPLATE)
        .context("parsing template")?;
    hb.render("summary", summary).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"TC transfer frame
===============================================================================================
VCID:      {{ header.vcid }}
Sequence:  {{ header.frame_sequence_number }}
Corrected: {{ corrected_symbols }}
{{ #if packets }}-----------------------------------------------------------------------------------------------
APID   Seq    Service  Subtype  Data
-----------------------------------------------------------------------------------------------
{{ #each packets }}{{ header.apid }}    {{ header.sequence_count }}      {{ #if request }}{{ request.service }}        {{ request.subtype }}        {{ request.application_data }}{{ else }}-        -        {{ data }}{{ /if }}{{ #if error }}  ({{ error }}){{ /if }}
{{ /each }}{{ /if }}{{ #if pdu }}-----------------------------------------------------------------------------------------------
{{ #if pdu.header }}PDU:       {{ pdu.header.pdu_type }} from {{ pdu.header.source_entity_id }}, transaction {{ pdu.header.transaction_sequence_number }}
{{ /if }}{{ #if pdu.file_data }}File data: {{ pdu.file_data.length }} bytes at offset {{ pdu.file_data.offset }}
{{ /if }}{{ #if pdu.directive }}Directive: {{ json pdu.directive }}
{{ /if }}{{ #if pdu.error }}Error:     {{ pdu.error }}
{{ /if }}{{ /if }}";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::tc_block;
    use comms::NORMAL_APID;

    fn frame_of(data: &[u8]) -> [u8; MESSAGE_LENGTH] {
        let mut block: Block = data.try_into().unwrap();
        coding::tc::decode(&mut block).unwrap();
        block[..MESSAGE_LENGTH].try_into().unwrap()
    }

    #[test]
    fn summarize_request() {
        let request = [0x20, 23, 2, 0xAA, 0x33, 0x01];
        let block = tc_block(PUS_VCID, Some(NORMAL_APID), 3, &request).unwrap();
        let frame = frame_of(&block);
        let summary = summarize(&frame, 0).unwrap();

        assert_eq!(summary.header.frame_sequence_number, 3);
        assert_eq!(summary.packets.len(), 1);
        let request = summary.packets[0].request.as_ref().unwrap();
        assert_eq!((request.service, request.subtype), (23, 2));
        assert_eq!(request.application_data, "01");
        assert!(summary.pdu.is_none());

        let text = render_text(&summary).unwrap();
        assert!(text.contains("Sequence:  3"), "{text}");
    }

    #[test]
    fn summarize_invalid_pdu() {
        let block = tc_block(CFDP_VCID, None, 0, &[0xFF; 8]).unwrap();
        let frame = frame_of(&block);
        let summary = summarize(&frame, 0).unwrap();

        let pdu = summary.pdu.as_ref().unwrap();
        assert!(pdu.header.is_none());
        assert!(pdu.error.is_some());
        assert!(serde_json::to_string(&summary).is_ok());
    }

    #[test]
    fn wrong_block_length() {
        assert!(decode(&[0u8; 10], &Format::Json).is_err());
    }
}
