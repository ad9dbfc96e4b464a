use serde_json::Value as Json;
use tabstream_api::{DecodeError, DecodePolicy, FrameKind};

use crate::frame::Frame;
use crate::parse;
use crate::wire::{json_kind, FRAME_TYPE};

/// Read the discriminator of a decoded element.
pub fn frame_kind(element: &Json) -> Result<FrameKind, DecodeError> {
    let obj = element.as_object().ok_or_else(|| {
        DecodeError::MalformedFrame(format!("frame must be an object, got {}", json_kind(element)))
    })?;
    let tag = match obj.get(FRAME_TYPE) {
        None => return Err(DecodeError::MalformedFrame(format!("missing {FRAME_TYPE}"))),
        Some(Json::String(tag)) => tag,
        Some(other) => {
            return Err(DecodeError::MalformedFrame(format!(
                "{FRAME_TYPE} must be a string, got {}",
                json_kind(other)
            )));
        }
    };
    FrameKind::from_wire(tag).ok_or_else(|| DecodeError::UnknownFrameType(tag.clone()))
}

/// Classify `element` and run the matching parser.
pub fn classify(element: &Json, policy: &DecodePolicy) -> Result<Frame, DecodeError> {
    let kind = frame_kind(element)?;
    let frame = match kind {
        FrameKind::DataSetHeader => Frame::DataSetHeader(parse::parse_data_set_header(element)?),
        FrameKind::DataTable => Frame::DataTable(parse::parse_data_table(element, policy)?),
        FrameKind::TableHeader => Frame::TableHeader(parse::parse_table_header(element, policy)?),
        FrameKind::TableFragment => Frame::TableFragment(parse::parse_table_fragment(element)?),
        FrameKind::TableCompletion => {
            Frame::TableCompletion(parse::parse_table_completion(element)?)
        }
        FrameKind::DataSetCompletion => {
            Frame::DataSetCompletion(parse::parse_data_set_completion(element)?)
        }
        FrameKind::TableProgress => Frame::TableProgress(parse::parse_table_progress(element)?),
    };
    tracing::debug!(frame = %kind, table = ?frame.table_id(), "classified frame");
    Ok(frame)
}
