/* src/aead.rs */

use crate::error::Error;

/// Length of the integrity tag produced by [`NullAead`].
pub const NULL_AEAD_TAG_LEN: usize = 12;

const FNV_OFFSET_BASIS: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
const FNV_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013b;

/// Packet payload protection.
///
/// The associated data is always the serialized public header of the packet
/// being sealed or opened. Implementations are selected per connection
/// phase: [`NullAead`] before the key exchange completes, a real cipher
/// afterwards.
pub trait PacketAead {
	/// Seal `plaintext` onto the end of `packet`.
	///
	/// `packet[..header_len]` holds the public header and is authenticated
	/// as associated data.
	///
	/// # Errors
	///
	/// Returns an error if the underlying cipher refuses the input; `packet`
	/// is left unchanged in that case.
	fn seal(
		&self,
		packet_number: u64,
		packet: &mut Vec<u8>,
		header_len: usize,
		plaintext: &[u8],
	) -> Result<(), Error>;

	/// Authenticate and decrypt `body` in place, returning the plaintext.
	///
	/// # Errors
	///
	/// Returns [`Error::AuthenticationFailure`] when the integrity check
	/// fails.
	fn open<'a>(
		&self,
		packet_number: u64,
		associated_data: &[u8],
		body: &'a mut [u8],
	) -> Result<&'a [u8], Error>;
}

/// Unencrypted packet protection used before any keys are agreed.
///
/// The tag is the FNV-1a 128-bit hash of the associated data followed by the
/// plaintext, truncated to 12 bytes and placed in front of the plaintext.
/// It detects corruption only; anyone can compute it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAead;

impl NullAead {
	/// Compute the 12-byte tag for `associated_data || plaintext`.
	#[must_use]
	pub fn tag(associated_data: &[u8], plaintext: &[u8]) -> [u8; NULL_AEAD_TAG_LEN] {
		let hash = fnv1a_128(FNV_OFFSET_BASIS, associated_data);
		let hash = fnv1a_128(hash, plaintext);

		#[allow(clippy::cast_possible_truncation)]
		let (low, high) = (hash as u64, (hash >> 64) as u32);
		let mut tag = [0u8; NULL_AEAD_TAG_LEN];
		tag[..8].copy_from_slice(&low.to_le_bytes());
		tag[8..].copy_from_slice(&high.to_le_bytes());
		tag
	}
}

impl PacketAead for NullAead {
	fn seal(
		&self,
		_packet_number: u64,
		packet: &mut Vec<u8>,
		header_len: usize,
		plaintext: &[u8],
	) -> Result<(), Error> {
		let associated_data = packet.get(..header_len).ok_or(Error::MalformedHeader {
			need: header_len,
			have: packet.len(),
		})?;
		let tag = Self::tag(associated_data, plaintext);
		packet.reserve(NULL_AEAD_TAG_LEN + plaintext.len());
		packet.extend_from_slice(&tag);
		packet.extend_from_slice(plaintext);
		Ok(())
	}

	fn open<'a>(
		&self,
		_packet_number: u64,
		associated_data: &[u8],
		body: &'a mut [u8],
	) -> Result<&'a [u8], Error> {
		if body.len() < NULL_AEAD_TAG_LEN {
			return Err(Error::AuthenticationFailure);
		}
		let (tag, plaintext) = body.split_at(NULL_AEAD_TAG_LEN);
		if Self::tag(associated_data, plaintext) != tag {
			return Err(Error::AuthenticationFailure);
		}
		Ok(&body[NULL_AEAD_TAG_LEN..])
	}
}

fn fnv1a_128(mut hash: u128, data: &[u8]) -> u128 {
	for &b in data {
		hash ^= u128::from(b);
		hash = hash.wrapping_mul(FNV_PRIME);
	}
	hash
}
