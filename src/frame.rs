/* src/frame.rs */

use crate::error::Error;
use crate::uint::{byte_len, read_uint_le, write_uint_le};

const STREAM_TYPE: u8 = 0x80;
const STREAM_FIN: u8 = 0x40;
const STREAM_DATA_LEN: u8 = 0x20;
const STREAM_OFFSET_MASK: u8 = 0x1c;
const STREAM_ID_MASK: u8 = 0x03;

const ACK_TYPE_MASK: u8 = 0xc0;
const ACK_TYPE: u8 = 0x40;
const ACK_HAS_NACKS: u8 = 0x20;
const ACK_LARGEST_MASK: u8 = 0x0c;

const PADDING_TYPE: u8 = 0x00;

/// A STREAM frame carrying application or handshake data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFrame {
	/// Stream the data belongs to.
	pub stream_id: u32,
	/// Whether this frame ends the stream.
	pub fin: bool,
	/// Byte offset of `data` within the stream.
	pub offset: u64,
	/// The raw data carried by this frame.
	pub data: Vec<u8>,
}

/// An ACK frame without missing-packet ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AckFrame {
	/// Whether the entropy hash of the acknowledged packets is non-zero.
	pub entropy: bool,
	/// Largest packet number received so far.
	pub largest_observed: u64,
	/// Time since `largest_observed` was received, as a ufloat16.
	pub ack_delay: u16,
}

/// One frame decoded from a packet payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	/// A STREAM frame.
	Stream(StreamFrame),
	/// An ACK frame.
	Ack(AckFrame),
	/// Padding running to the end of the payload; holds its length.
	Padding(usize),
}

/// Parse every frame in a decrypted payload, in order.
///
/// Frames carry no count prefix: parsing continues until the payload is
/// exhausted.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] for truncated or inconsistent frames and
/// [`Error::UnknownFrameType`] for frame types other than STREAM, ACK and
/// PADDING.
pub fn parse_frames(payload: &[u8]) -> Result<Vec<Frame>, Error> {
	let mut cursor = 0;
	let mut frames = Vec::new();

	while cursor < payload.len() {
		let frame_type = payload[cursor];
		let rest = &payload[cursor..];
		let (frame, len) = if frame_type & STREAM_TYPE != 0 {
			let (frame, len) = parse_stream_frame(rest).map_err(|e| rebase(e, cursor))?;
			(Frame::Stream(frame), len)
		} else if frame_type & ACK_TYPE_MASK == ACK_TYPE {
			let (frame, len) = parse_ack_frame(rest).map_err(|e| rebase(e, cursor))?;
			(Frame::Ack(frame), len)
		} else if frame_type == PADDING_TYPE {
			(Frame::Padding(rest.len()), rest.len())
		} else {
			return Err(Error::UnknownFrameType(frame_type));
		};
		frames.push(frame);
		cursor += len;
	}

	Ok(frames)
}

/// Parse a STREAM frame from the start of `buf`.
///
/// Type byte layout `1FDOOOSS`: FIN bit, explicit data length bit, offset
/// width code (0 for no offset, otherwise `code + 1` bytes) and stream ID
/// width code (`code + 1` bytes). Without an explicit length the data runs
/// to the end of `buf`.
///
/// Returns the frame and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] if the type byte is not a STREAM frame
/// or any field extends beyond `buf`.
pub fn parse_stream_frame(buf: &[u8]) -> Result<(StreamFrame, usize), Error> {
	let &type_byte = buf.first().ok_or(truncated(0))?;
	if type_byte & STREAM_TYPE == 0 {
		return Err(Error::MalformedFrame {
			offset: 0,
			reason: "not a STREAM frame",
		});
	}

	let fin = type_byte & STREAM_FIN != 0;
	let has_data_len = type_byte & STREAM_DATA_LEN != 0;
	let offset_len = match (type_byte & STREAM_OFFSET_MASK) >> 2 {
		0 => 0,
		code => usize::from(code) + 1,
	};
	let stream_id_len = usize::from(type_byte & STREAM_ID_MASK) + 1;

	let mut cursor = 1;
	let stream_id = read_uint_le(&buf[cursor..], stream_id_len).ok_or(truncated(cursor))?;
	cursor += stream_id_len;

	let offset = read_uint_le(&buf[cursor..], offset_len).ok_or(truncated(cursor))?;
	cursor += offset_len;

	let data_len = if has_data_len {
		let len = read_u16_le(buf, cursor).ok_or(truncated(cursor))?;
		cursor += 2;
		usize::from(len)
	} else {
		buf.len() - cursor
	};

	let end = cursor + data_len;
	if end > buf.len() {
		return Err(Error::MalformedFrame {
			offset: cursor,
			reason: "STREAM data length exceeds payload",
		});
	}
	if data_len == 0 && !fin {
		return Err(Error::MalformedFrame {
			offset: cursor,
			reason: "empty STREAM frame without FIN",
		});
	}

	let frame = StreamFrame {
		stream_id: u32::try_from(stream_id).map_err(|_| truncated(1))?,
		fin,
		offset,
		data: buf[cursor..end].to_vec(),
	};
	Ok((frame, end))
}

/// Parse an ACK frame from the start of `buf`.
///
/// Type byte layout `01NTLLMM`. Only the low bit of the entropy byte is
/// kept. Timestamps are consumed and discarded.
///
/// Returns the frame and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] if the type byte is not an ACK frame,
/// announces missing-packet ranges, or any field extends beyond `buf`.
pub fn parse_ack_frame(buf: &[u8]) -> Result<(AckFrame, usize), Error> {
	let &type_byte = buf.first().ok_or(truncated(0))?;
	if type_byte & ACK_TYPE_MASK != ACK_TYPE {
		return Err(Error::MalformedFrame {
			offset: 0,
			reason: "not an ACK frame",
		});
	}
	if type_byte & ACK_HAS_NACKS != 0 {
		return Err(Error::MalformedFrame {
			offset: 0,
			reason: "ACK missing-packet ranges are not supported",
		});
	}
	let largest_len = largest_observed_len((type_byte & ACK_LARGEST_MASK) >> 2);

	let mut cursor = 1;
	let &entropy = buf.get(cursor).ok_or(truncated(cursor))?;
	cursor += 1;

	let largest_observed = read_uint_le(&buf[cursor..], largest_len).ok_or(truncated(cursor))?;
	cursor += largest_len;

	let ack_delay = read_u16_le(buf, cursor).ok_or(truncated(cursor))?;
	cursor += 2;

	let &timestamps = buf.get(cursor).ok_or(truncated(cursor))?;
	cursor += 1;
	if timestamps > 0 {
		// Delta from largest observed (1) + first timestamp (4), then
		// delta (1) + time since previous (2) for each further timestamp.
		cursor += 5 + 3 * (usize::from(timestamps) - 1);
		if cursor > buf.len() {
			return Err(truncated(buf.len()));
		}
	}

	let frame = AckFrame {
		entropy: entropy & 0x01 != 0,
		largest_observed,
		ack_delay,
	};
	Ok((frame, cursor))
}

/// Append a STREAM frame to `out`.
///
/// Uses the smallest stream ID and offset widths that hold the values and
/// always writes an explicit data length, so further frames may follow.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] when the data is longer than the
/// 16-bit length field allows. Nothing is written in that case.
pub fn write_stream_frame(frame: &StreamFrame, out: &mut Vec<u8>) -> Result<(), Error> {
	let data_len = u16::try_from(frame.data.len()).map_err(|_| Error::MalformedFrame {
		offset: out.len(),
		reason: "STREAM data longer than 65535 bytes",
	})?;

	let stream_id_len = byte_len(u64::from(frame.stream_id));
	let offset_len = match frame.offset {
		0 => 0,
		offset => byte_len(offset).max(2),
	};

	let mut type_byte = STREAM_TYPE | STREAM_DATA_LEN | width_code(stream_id_len);
	if frame.fin {
		type_byte |= STREAM_FIN;
	}
	if offset_len > 0 {
		type_byte |= width_code(offset_len) << 2;
	}

	out.reserve(1 + stream_id_len + offset_len + 2 + frame.data.len());
	out.push(type_byte);
	write_uint_le(out, u64::from(frame.stream_id), stream_id_len);
	write_uint_le(out, frame.offset, offset_len);
	out.extend_from_slice(&data_len.to_le_bytes());
	out.extend_from_slice(&frame.data);
	Ok(())
}

/// Append an ACK frame without missing-packet ranges or timestamps to `out`.
///
/// `largest_observed` must fit the widest 6-byte field.
pub fn write_ack_frame(frame: &AckFrame, out: &mut Vec<u8>) {
	debug_assert!(
		frame.largest_observed < 1 << 48,
		"largest observed {:#x} does not fit in 6 bytes",
		frame.largest_observed
	);
	let (code, largest_len) = match byte_len(frame.largest_observed) {
		1 => (0u8, 1),
		2 => (1, 2),
		3 | 4 => (2, 4),
		_ => (3, 6),
	};
	out.push(ACK_TYPE | (code << 2));
	out.push(u8::from(frame.entropy));
	write_uint_le(out, frame.largest_observed, largest_len);
	out.extend_from_slice(&frame.ack_delay.to_le_bytes());
	out.push(0);
}

fn largest_observed_len(code: u8) -> usize {
	match code {
		0 => 1,
		1 => 2,
		2 => 4,
		_ => 6,
	}
}

/// Field width `len` (1 to 8) as the `len - 1` code stored in type bytes.
fn width_code(len: usize) -> u8 {
	u8::try_from(len.saturating_sub(1)).unwrap_or(0) & 0x07
}

fn read_u16_le(buf: &[u8], at: usize) -> Option<u16> {
	let bytes = buf.get(at..at + 2)?;
	Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn truncated(offset: usize) -> Error {
	Error::MalformedFrame {
		offset,
		reason: "frame truncated",
	}
}

fn rebase(err: Error, base: usize) -> Error {
	match err {
		Error::MalformedFrame { offset, reason } => Error::MalformedFrame {
			offset: base + offset,
			reason,
		},
		other => other,
	}
}
