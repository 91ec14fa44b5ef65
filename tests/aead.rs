/* tests/aead.rs */

#![allow(missing_docs)]

use gquic_handshake::{
	Error, NULL_AEAD_TAG_LEN, NullAead, PacketAead, PublicHeader, write_public_header,
};

fn header_bytes() -> Vec<u8> {
	let mut out = Vec::new();
	write_public_header(&PublicHeader::new(0x0102_0304_0506_0708, 1), &mut out);
	out
}

fn seal(aead: &impl PacketAead, packet_number: u64, plaintext: &[u8]) -> (Vec<u8>, usize) {
	let mut packet = header_bytes();
	let header_len = packet.len();
	aead.seal(packet_number, &mut packet, header_len, plaintext)
		.unwrap();
	(packet, header_len)
}

fn open(aead: &impl PacketAead, packet_number: u64, packet: &mut [u8], header_len: usize) -> Result<Vec<u8>, Error> {
	let (associated_data, body) = packet.split_at_mut(header_len);
	aead.open(packet_number, associated_data, body)
		.map(<[u8]>::to_vec)
}

// =====================================================================
// Null AEAD
// =====================================================================

#[test]
fn null_seal_layout() {
	let (packet, header_len) = seal(&NullAead, 1, b"hello");
	assert_eq!(packet.len(), header_len + NULL_AEAD_TAG_LEN + 5);
	assert_eq!(&packet[..header_len], header_bytes().as_slice());
	assert_eq!(
		&packet[header_len..header_len + NULL_AEAD_TAG_LEN],
		NullAead::tag(&header_bytes(), b"hello")
	);
	assert_eq!(&packet[header_len + NULL_AEAD_TAG_LEN..], b"hello");
}

#[test]
fn null_tag_of_empty_input() {
	// FNV-1a 128 offset basis 0x6c62272e07bb014262b821756295c58d:
	// low 64 bits LE, then the low 32 bits of the high half LE.
	assert_eq!(
		NullAead::tag(&[], &[]),
		[
			0x8d, 0xc5, 0x95, 0x62, 0x75, 0x21, 0xb8, 0x62, 0x42, 0x01, 0xbb, 0x07
		]
	);
}

#[test]
fn null_roundtrip() {
	for plaintext in [&b""[..], b"\x00", b"CHLO payload", &[0xff; 1200]] {
		let (mut packet, header_len) = seal(&NullAead, 7, plaintext);
		assert_eq!(open(&NullAead, 7, &mut packet, header_len).unwrap(), plaintext);
	}
}

#[test]
fn null_detects_any_modified_byte() {
	let (packet, header_len) = seal(&NullAead, 1, b"client hello bytes");
	for i in 0..packet.len() {
		let mut tampered = packet.clone();
		tampered[i] ^= 0x01;
		assert!(
			matches!(
				open(&NullAead, 1, &mut tampered, header_len),
				Err(Error::AuthenticationFailure)
			),
			"flipping byte {i} went unnoticed"
		);
	}
}

#[test]
fn null_rejects_mismatched_associated_data() {
	let (mut packet, header_len) = seal(&NullAead, 1, b"data");
	let mut other_header = Vec::new();
	write_public_header(&PublicHeader::new(99, 1), &mut other_header);
	let body = &mut packet[header_len..];
	assert!(matches!(
		NullAead.open(1, &other_header, body),
		Err(Error::AuthenticationFailure)
	));
}

#[test]
fn null_rejects_short_body() {
	let mut body = [0u8; NULL_AEAD_TAG_LEN - 1];
	assert!(matches!(
		NullAead.open(1, &header_bytes(), &mut body),
		Err(Error::AuthenticationFailure)
	));
}

#[test]
fn null_seal_rejects_header_len_past_end() {
	let mut packet = vec![0u8; 4];
	assert!(NullAead.seal(1, &mut packet, 10, b"x").is_err());
	assert_eq!(packet.len(), 4);
}

// =====================================================================
// AES-128-GCM
// =====================================================================

#[cfg(any(feature = "ring", feature = "aws-lc-rs"))]
mod aes_gcm {
	use super::{open, seal};
	use gquic_handshake::{Aes128GcmAead, Error};

	fn cipher() -> Aes128GcmAead {
		Aes128GcmAead::new(&[0x11; 16], &[0x22; 12]).unwrap()
	}

	#[test]
	fn roundtrip() {
		let (mut packet, header_len) = seal(&cipher(), 3, b"secret frames");
		assert_eq!(packet.len(), header_len + 13 + 16);
		assert_ne!(&packet[header_len..header_len + 13], b"secret frames");
		assert_eq!(open(&cipher(), 3, &mut packet, header_len).unwrap(), b"secret frames");
	}

	#[test]
	fn wrong_packet_number_fails() {
		let (mut packet, header_len) = seal(&cipher(), 3, b"secret frames");
		assert!(matches!(
			open(&cipher(), 4, &mut packet, header_len),
			Err(Error::AuthenticationFailure)
		));
	}

	#[test]
	fn tampered_header_fails() {
		let (mut packet, header_len) = seal(&cipher(), 3, b"secret frames");
		packet[1] ^= 0x80;
		assert!(matches!(
			open(&cipher(), 3, &mut packet, header_len),
			Err(Error::AuthenticationFailure)
		));
	}

	#[test]
	fn bad_key_lengths() {
		assert!(matches!(
			Aes128GcmAead::new(&[0; 15], &[0; 12]),
			Err(Error::Crypto(_))
		));
		assert!(matches!(
			Aes128GcmAead::new(&[0; 16], &[0; 8]),
			Err(Error::Crypto(_))
		));
	}
}
