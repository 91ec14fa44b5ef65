/* src/uint.rs */

/// Decode a little-endian unsigned integer of `len` bytes from the start of
/// `buf`.
///
/// gQUIC encodes connection IDs, packet numbers, stream IDs and offsets as
/// truncated little-endian integers whose width is announced by a flags
/// byte, so `len` ranges over 0 to 8. A width of zero decodes to zero.
///
/// Returns `None` when `buf` is shorter than `len` or `len` exceeds 8.
#[must_use = "returns the decoded value without modifying the buffer"]
pub fn read_uint_le(buf: &[u8], len: usize) -> Option<u64> {
	if len > 8 {
		return None;
	}
	let bytes = buf.get(..len)?;
	let mut val = 0u64;
	for &b in bytes.iter().rev() {
		val = (val << 8) | u64::from(b);
	}
	Some(val)
}

/// Append the low `len` bytes of `value` to `out`, least significant first.
///
/// Higher bytes that do not fit are dropped, which is how packet numbers are
/// truncated on the wire.
pub fn write_uint_le(out: &mut Vec<u8>, value: u64, len: usize) {
	out.extend_from_slice(&value.to_le_bytes()[..len.min(8)]);
}

/// Number of bytes needed to hold `value`, never less than one.
pub(crate) fn byte_len(value: u64) -> usize {
	let bits = 64 - value.leading_zeros() as usize;
	bits.div_ceil(8).max(1)
}
