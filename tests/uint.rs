/* tests/uint.rs */

#![allow(missing_docs)]

use gquic_handshake::{read_uint_le, write_uint_le};

#[test]
fn zero_width_reads_zero() {
	assert_eq!(read_uint_le(&[], 0), Some(0));
	assert_eq!(read_uint_le(&[0xff], 0), Some(0));
}

#[test]
fn one_byte() {
	assert_eq!(read_uint_le(&[0x2a, 0xff], 1), Some(0x2a));
}

#[test]
fn six_byte_little_endian() {
	let buf = [0x06, 0x05, 0x04, 0x03, 0x02, 0x01];
	assert_eq!(read_uint_le(&buf, 6), Some(0x0102_0304_0506));
}

#[test]
fn eight_byte_max() {
	assert_eq!(read_uint_le(&[0xff; 8], 8), Some(u64::MAX));
}

#[test]
fn short_buffer_fails() {
	assert_eq!(read_uint_le(&[0x01, 0x02], 4), None);
	assert_eq!(read_uint_le(&[], 1), None);
}

#[test]
fn width_above_eight_fails() {
	assert_eq!(read_uint_le(&[0; 16], 9), None);
}

#[test]
fn write_truncates_to_width() {
	let mut out = Vec::new();
	write_uint_le(&mut out, 0x0102_0304, 2);
	assert_eq!(out, [0x04, 0x03]);
}

#[test]
fn write_then_read() {
	for (value, len) in [(0u64, 1), (0xbeef, 2), (0xdead_beef, 4), (0x1234_5678_9abc, 6)] {
		let mut out = Vec::new();
		write_uint_le(&mut out, value, len);
		assert_eq!(out.len(), len);
		assert_eq!(read_uint_le(&out, len), Some(value));
	}
}
