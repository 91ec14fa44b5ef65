/* src/header.rs */

use crate::error::Error;
use crate::tag::Tag;
use crate::uint::{read_uint_le, write_uint_le};

const FLAG_VERSION: u8 = 0x01;
const FLAG_CONNECTION_ID_8: u8 = 0x0c;
const MASK_CONNECTION_ID: u8 = 0x0c;
const MASK_PACKET_NUMBER: u8 = 0x30;

/// Private flag bit carrying the packet's entropy bit.
pub const PRIVATE_FLAG_ENTROPY: u8 = 0x01;
/// Private flag bit marking membership in an FEC group.
pub const PRIVATE_FLAG_FEC_GROUP: u8 = 0x02;
/// Private flag bit marking an FEC packet.
pub const PRIVATE_FLAG_FEC: u8 = 0x04;

/// Width of the packet number field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PacketNumberLen {
	/// One byte.
	#[default]
	One,
	/// Two bytes.
	Two,
	/// Four bytes.
	Four,
	/// Six bytes.
	Six,
}

impl PacketNumberLen {
	/// Number of bytes occupied on the wire.
	#[must_use]
	pub const fn len(self) -> usize {
		match self {
			Self::One => 1,
			Self::Two => 2,
			Self::Four => 4,
			Self::Six => 6,
		}
	}

	/// Smallest width that holds `packet_number` without truncation.
	#[must_use]
	pub const fn smallest_for(packet_number: u64) -> Self {
		if packet_number < 1 << 8 {
			Self::One
		} else if packet_number < 1 << 16 {
			Self::Two
		} else if packet_number < 1 << 32 {
			Self::Four
		} else {
			Self::Six
		}
	}

	const fn from_flags(flags: u8) -> Self {
		match (flags & MASK_PACKET_NUMBER) >> 4 {
			0 => Self::One,
			1 => Self::Two,
			2 => Self::Four,
			_ => Self::Six,
		}
	}

	const fn flag_bits(self) -> u8 {
		match self {
			Self::One => 0x00,
			Self::Two => 0x10,
			Self::Four => 0x20,
			Self::Six => 0x30,
		}
	}
}

/// Unencrypted header at the front of every gQUIC packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicHeader {
	/// Connection ID chosen by the client.
	pub connection_id: u64,
	/// Protocol version. Present exactly when the version flag is set,
	/// which only happens on the first packets of a connection.
	pub version: Option<Tag>,
	/// Packet number, truncated to `packet_number_len` bytes on the wire.
	pub packet_number: u64,
	/// Wire width of the packet number.
	///
	/// Writers truncate `packet_number` to this width, as gQUIC does on the
	/// wire; callers choosing a width narrower than
	/// [`PacketNumberLen::smallest_for`] accept that the peer reconstructs
	/// the full number from context.
	pub packet_number_len: PacketNumberLen,
}

impl PublicHeader {
	/// Header without a version, using the smallest packet number width.
	#[must_use]
	pub const fn new(connection_id: u64, packet_number: u64) -> Self {
		Self {
			connection_id,
			version: None,
			packet_number,
			packet_number_len: PacketNumberLen::smallest_for(packet_number),
		}
	}

	/// Whether the version flag is set.
	#[must_use]
	pub const fn version_flag(&self) -> bool {
		self.version.is_some()
	}

	/// Number of bytes [`write_public_header`] produces for this header.
	#[must_use]
	pub const fn encoded_len(&self) -> usize {
		let version_len = if self.version.is_some() { 4 } else { 0 };
		1 + 8 + version_len + self.packet_number_len.len()
	}
}

/// Parse the public header at the start of a datagram.
///
/// Returns the header and the number of bytes it occupies. Those bytes are
/// the associated data of the packet's AEAD.
///
/// # Errors
///
/// Returns [`Error::MalformedHeader`] when the datagram ends before the
/// fields announced by the flags byte.
pub fn parse_public_header(packet: &[u8]) -> Result<(PublicHeader, usize), Error> {
	let &flags = packet.first().ok_or(Error::MalformedHeader {
		need: 1,
		have: packet.len(),
	})?;

	let connection_id_len = match flags & MASK_CONNECTION_ID {
		0x0c => 8,
		0x08 => 4,
		0x04 => 1,
		_ => 0,
	};
	let version_len = if flags & FLAG_VERSION != 0 { 4 } else { 0 };
	let packet_number_len = PacketNumberLen::from_flags(flags);

	let need = 1 + connection_id_len + version_len + packet_number_len.len();
	if packet.len() < need {
		return Err(Error::MalformedHeader {
			need,
			have: packet.len(),
		});
	}

	let mut cursor = 1;
	let connection_id =
		read_uint_le(&packet[cursor..], connection_id_len).ok_or(Error::MalformedHeader {
			need,
			have: packet.len(),
		})?;
	cursor += connection_id_len;

	let version = if version_len > 0 {
		let bytes = [
			packet[cursor],
			packet[cursor + 1],
			packet[cursor + 2],
			packet[cursor + 3],
		];
		cursor += 4;
		Some(Tag::new(bytes))
	} else {
		None
	};

	let packet_number = read_uint_le(&packet[cursor..], packet_number_len.len()).ok_or(
		Error::MalformedHeader {
			need,
			have: packet.len(),
		},
	)?;
	cursor += packet_number_len.len();

	Ok((
		PublicHeader {
			connection_id,
			version,
			packet_number,
			packet_number_len,
		},
		cursor,
	))
}

/// Serialize `header` onto `out`.
///
/// The connection ID is always written in full (8 bytes). The packet number
/// is written in `header.packet_number_len` bytes, dropping higher bytes;
/// see [`PublicHeader::packet_number_len`] for that contract.
pub fn write_public_header(header: &PublicHeader, out: &mut Vec<u8>) {
	let mut flags = FLAG_CONNECTION_ID_8 | header.packet_number_len.flag_bits();
	if header.version.is_some() {
		flags |= FLAG_VERSION;
	}
	out.reserve(header.encoded_len());
	out.push(flags);
	write_uint_le(out, header.connection_id, 8);
	if let Some(version) = header.version {
		out.extend_from_slice(&version.to_bytes());
	}
	write_uint_le(out, header.packet_number, header.packet_number_len.len());
}

/// Build a Version Negotiation Packet answering `connection_id`.
///
/// The packet is a public header with the version flag set, packet number 1,
/// carrying the first supported version, followed by any further supported
/// versions as raw tags. An empty `versions` list yields a header without
/// the version flag.
#[must_use]
pub fn write_version_negotiation(connection_id: u64, versions: &[Tag]) -> Vec<u8> {
	let header = PublicHeader {
		version: versions.first().copied(),
		..PublicHeader::new(connection_id, 1)
	};
	let mut out = Vec::with_capacity(header.encoded_len() + 4 * versions.len());
	write_public_header(&header, &mut out);
	for version in versions.iter().skip(1) {
		out.extend_from_slice(&version.to_bytes());
	}
	out
}
