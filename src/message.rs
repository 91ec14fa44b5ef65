/* src/message.rs */

use std::collections::BTreeMap;

use crate::error::Error;
use crate::tag::Tag;

/// Upper bound on the number of entries in one message.
pub const MAX_ENTRIES: usize = 128;

const HEADER_LEN: usize = 8;
const INDEX_ENTRY_LEN: usize = 8;

/// A tag-keyed handshake message such as a CHLO, SCFG or REJ.
///
/// Entries live in a [`BTreeMap`] keyed by [`Tag`], so iteration, and
/// therefore the wire encoding, is always in ascending tag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValueMessage {
	/// The message tag.
	pub tag: Tag,
	/// Entry values keyed by tag.
	pub entries: BTreeMap<Tag, Vec<u8>>,
}

impl TagValueMessage {
	/// Empty message with the given tag.
	#[must_use]
	pub fn new(tag: Tag) -> Self {
		Self {
			tag,
			entries: BTreeMap::new(),
		}
	}

	/// Builder-style insert.
	#[must_use]
	pub fn with(mut self, tag: Tag, value: impl Into<Vec<u8>>) -> Self {
		self.entries.insert(tag, value.into());
		self
	}

	/// Value stored under `tag`, if any.
	#[must_use]
	pub fn get(&self, tag: Tag) -> Option<&[u8]> {
		self.entries.get(&tag).map(Vec::as_slice)
	}

	/// Serialized length of this message.
	#[must_use]
	pub fn encoded_len(&self) -> usize {
		HEADER_LEN
			+ INDEX_ENTRY_LEN * self.entries.len()
			+ self.entries.values().map(Vec::len).sum::<usize>()
	}

	/// Serialize into a fresh buffer.
	///
	/// # Errors
	///
	/// See [`write_message`].
	pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
		let mut out = Vec::with_capacity(self.encoded_len());
		write_message(self, &mut out)?;
		Ok(out)
	}
}

/// Parse a tag-value message.
///
/// Layout: message tag (4), entry count (u32 LE), an index of
/// `(tag, cumulative end offset u32 LE)` pairs in strictly ascending tag
/// order, then the concatenated values.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] when the buffer is shorter than the
/// header or index table, the entry count exceeds [`MAX_ENTRIES`], the tags
/// are not strictly ascending, an end offset goes backwards, or the last end
/// offset does not match the length of the value section.
pub fn parse_message(buf: &[u8]) -> Result<TagValueMessage, Error> {
	if buf.len() < HEADER_LEN {
		return Err(malformed(
			0,
			format!("need {HEADER_LEN} header bytes, have {}", buf.len()),
		));
	}

	let tag = Tag::new(read_array(buf, 0));
	let count = u32::from_le_bytes(read_array(buf, 4)) as usize;
	if count > MAX_ENTRIES {
		return Err(malformed(
			4,
			format!("{count} entries exceed the limit of {MAX_ENTRIES}"),
		));
	}

	let values_start = HEADER_LEN + count * INDEX_ENTRY_LEN;
	if buf.len() < values_start {
		return Err(malformed(
			HEADER_LEN,
			format!(
				"index of {count} entries needs {values_start} bytes, have {}",
				buf.len()
			),
		));
	}
	let values = &buf[values_start..];

	let mut entries = BTreeMap::new();
	let mut prev_tag: Option<Tag> = None;
	let mut prev_end = 0usize;

	for i in 0..count {
		let at = HEADER_LEN + i * INDEX_ENTRY_LEN;
		let entry_tag = Tag::new(read_array(buf, at));
		let end = u32::from_le_bytes(read_array(buf, at + 4)) as usize;

		if let Some(prev) = prev_tag {
			if entry_tag <= prev {
				return Err(malformed(
					at,
					format!("tag {entry_tag} does not follow {prev} in ascending order"),
				));
			}
		}
		if end < prev_end {
			return Err(malformed(
				at + 4,
				format!("end offset {end} of {entry_tag} precedes {prev_end}"),
			));
		}
		if end > values.len() {
			return Err(malformed(
				at + 4,
				format!(
					"end offset {end} of {entry_tag} exceeds {} value bytes",
					values.len()
				),
			));
		}

		entries.insert(entry_tag, values[prev_end..end].to_vec());
		prev_tag = Some(entry_tag);
		prev_end = end;
	}

	if prev_end != values.len() {
		return Err(malformed(
			values_start + prev_end,
			format!(
				"entries cover {prev_end} value bytes but {} are present",
				values.len()
			),
		));
	}

	Ok(TagValueMessage { tag, entries })
}

/// Serialize `message` onto `out` in canonical (ascending tag) order.
///
/// This encoding is the exact byte string the server proof signs, so it
/// must stay deterministic. Nothing is written to `out` on failure.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`] when the message has more than
/// [`MAX_ENTRIES`] entries or its values exceed the 32-bit offset range.
pub fn write_message(message: &TagValueMessage, out: &mut Vec<u8>) -> Result<(), Error> {
	let count = message.entries.len();
	if count > MAX_ENTRIES {
		return Err(malformed(
			4,
			format!("{count} entries exceed the limit of {MAX_ENTRIES}"),
		));
	}

	let mut index = Vec::with_capacity(count * INDEX_ENTRY_LEN);
	let mut end = 0u32;
	for (tag, value) in &message.entries {
		end = u32::try_from(value.len())
			.ok()
			.and_then(|len| end.checked_add(len))
			.ok_or_else(|| {
				malformed(
					HEADER_LEN + index.len(),
					format!("value of {tag} overflows the 32-bit offset range"),
				)
			})?;
		index.extend_from_slice(&tag.to_bytes());
		index.extend_from_slice(&end.to_le_bytes());
	}

	out.reserve(message.encoded_len());
	out.extend_from_slice(&message.tag.to_bytes());
	#[allow(clippy::cast_possible_truncation)]
	out.extend_from_slice(&(count as u32).to_le_bytes());
	out.extend_from_slice(&index);
	for value in message.entries.values() {
		out.extend_from_slice(value);
	}
	Ok(())
}

fn read_array(buf: &[u8], at: usize) -> [u8; 4] {
	[buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

fn malformed(offset: usize, reason: String) -> Error {
	Error::MalformedMessage { offset, reason }
}
