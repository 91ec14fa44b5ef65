/* tests/message.rs */

#![allow(missing_docs)]

use gquic_handshake::{Error, MAX_ENTRIES, Tag, TagValueMessage, parse_message, tag, write_message};

/// Build a message by hand so index tables can be made invalid on purpose.
fn build_raw(message_tag: &[u8; 4], index: &[(&[u8; 4], u32)], values: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	out.extend_from_slice(message_tag);
	out.extend_from_slice(&(index.len() as u32).to_le_bytes());
	for (t, end) in index {
		out.extend_from_slice(*t);
		out.extend_from_slice(&end.to_le_bytes());
	}
	out.extend_from_slice(values);
	out
}

fn sample_chlo() -> TagValueMessage {
	TagValueMessage::new(tag::CHLO)
		.with(tag::UAID, b"test-client".to_vec())
		.with(tag::SNI, b"example.org".to_vec())
		.with(tag::VER, b"Q032".to_vec())
}

// =====================================================================
// Writing
// =====================================================================

#[test]
fn write_exact_layout() {
	let msg = TagValueMessage::new(tag::CHLO).with(tag::UAID, b"ab".to_vec());
	let mut out = Vec::new();
	write_message(&msg, &mut out).unwrap();
	assert_eq!(
		out,
		[
			b'C', b'H', b'L', b'O', 1, 0, 0, 0, b'U', b'A', b'I', b'D', 2, 0, 0, 0, b'a', b'b'
		]
	);
	assert_eq!(out.len(), msg.encoded_len());
}

#[test]
fn write_sorts_by_little_endian_value() {
	// SNI = 0x00494e53 < VER = 0x00524556 < UAID = 0x44494155, although
	// "UAID" sorts first as text.
	let out = sample_chlo().to_bytes().unwrap();
	let tags: Vec<&[u8]> = (0..3).map(|i| &out[8 + i * 8..12 + i * 8]).collect();
	assert_eq!(tags, [&b"SNI\0"[..], b"VER\0", b"UAID"]);
}

#[test]
fn write_uses_cumulative_offsets() {
	let out = sample_chlo().to_bytes().unwrap();
	let offsets: Vec<u32> = (0..3)
		.map(|i| {
			let at = 12 + i * 8;
			u32::from_le_bytes(out[at..at + 4].try_into().unwrap())
		})
		.collect();
	// SNI (11) → VER (4) → UAID (11)
	assert_eq!(offsets, [11, 15, 26]);
}

#[test]
fn write_empty_message() {
	let out = TagValueMessage::new(tag::REJ).to_bytes().unwrap();
	assert_eq!(out, [b'R', b'E', b'J', 0, 0, 0, 0, 0]);
}

#[test]
fn write_too_many_entries_fails() {
	let mut msg = TagValueMessage::new(tag::CHLO);
	for i in 0..=MAX_ENTRIES as u32 {
		msg.entries.insert(Tag::from_u32(i), vec![0]);
	}
	let mut out = Vec::new();
	assert!(matches!(
		write_message(&msg, &mut out),
		Err(Error::MalformedMessage { .. })
	));
	assert!(out.is_empty());
}

// =====================================================================
// Parsing
// =====================================================================

#[test]
fn roundtrip_messages() {
	let messages = [
		TagValueMessage::new(tag::CHLO),
		sample_chlo(),
		TagValueMessage::new(tag::SCFG)
			.with(tag::KEXS, tag::C255.to_bytes())
			.with(tag::EXPY, [0xff; 8])
			.with(tag::PAD, Vec::new()),
	];
	for msg in messages {
		let bytes = msg.to_bytes().unwrap();
		assert_eq!(parse_message(&bytes).unwrap(), msg);
	}
}

#[test]
fn parse_empty_value_entries() {
	let raw = build_raw(b"CHLO", &[(b"PAD\0", 0), (b"UAID", 2)], b"hi");
	let msg = parse_message(&raw).unwrap();
	assert_eq!(msg.get(tag::PAD), Some(&b""[..]));
	assert_eq!(msg.get(tag::UAID), Some(&b"hi"[..]));
}

#[test]
fn parse_nested_message() {
	let scfg = TagValueMessage::new(tag::SCFG).with(tag::VER, b"Q032".to_vec());
	let rej = TagValueMessage::new(tag::REJ).with(tag::SCFG, scfg.to_bytes().unwrap());
	let parsed = parse_message(&rej.to_bytes().unwrap()).unwrap();
	assert_eq!(parsed.tag, tag::REJ);
	let inner = parse_message(parsed.get(tag::SCFG).unwrap()).unwrap();
	assert_eq!(inner, scfg);
}

#[test]
fn parse_short_header_fails() {
	assert!(matches!(
		parse_message(b"CHLO\x01\x00"),
		Err(Error::MalformedMessage { offset: 0, .. })
	));
}

#[test]
fn parse_truncated_index_fails() {
	let mut raw = build_raw(b"CHLO", &[(b"UAID", 2)], b"");
	raw[4] = 2;
	assert!(matches!(
		parse_message(&raw),
		Err(Error::MalformedMessage { offset: 8, .. })
	));
}

#[test]
fn parse_entry_limit() {
	let mut raw = b"CHLO".to_vec();
	raw.extend_from_slice(&(MAX_ENTRIES as u32 + 1).to_le_bytes());
	assert!(matches!(
		parse_message(&raw),
		Err(Error::MalformedMessage { offset: 4, .. })
	));
}

#[test]
fn parse_rejects_descending_tags() {
	let raw = build_raw(b"CHLO", &[(b"UAID", 1), (b"SNI\0", 2)], b"ab");
	let err = parse_message(&raw).unwrap_err();
	assert!(matches!(err, Error::MalformedMessage { offset: 16, .. }));
	assert!(err.to_string().contains("SNI"));
}

#[test]
fn parse_rejects_duplicate_tags() {
	let raw = build_raw(b"CHLO", &[(b"UAID", 1), (b"UAID", 2)], b"ab");
	assert!(matches!(
		parse_message(&raw),
		Err(Error::MalformedMessage { offset: 16, .. })
	));
}

#[test]
fn parse_rejects_decreasing_offsets() {
	let raw = build_raw(b"CHLO", &[(b"SNI\0", 2), (b"UAID", 1)], b"ab");
	assert!(matches!(
		parse_message(&raw),
		Err(Error::MalformedMessage { offset: 20, .. })
	));
}

#[test]
fn parse_rejects_offset_past_end() {
	let raw = build_raw(b"CHLO", &[(b"UAID", 5)], b"ab");
	assert!(matches!(
		parse_message(&raw),
		Err(Error::MalformedMessage { offset: 12, .. })
	));
}

#[test]
fn parse_rejects_trailing_value_bytes() {
	let raw = build_raw(b"CHLO", &[(b"UAID", 1)], b"ab");
	let err = parse_message(&raw).unwrap_err();
	assert!(matches!(err, Error::MalformedMessage { offset: 17, .. }));
}

#[test]
fn parse_does_not_check_semantics() {
	// A CHLO without any of the usual entries is still well formed.
	let raw = build_raw(b"CHLO", &[], b"");
	let msg = parse_message(&raw).unwrap();
	assert_eq!(msg.tag, tag::CHLO);
	assert!(msg.entries.is_empty());
}

// =====================================================================
// Tags
// =====================================================================

#[test]
fn tag_numeric_value_is_little_endian() {
	assert_eq!(tag::CHLO.as_u32(), 0x4f4c_4843);
	assert_eq!(tag::CHLO.to_bytes(), *b"CHLO");
	assert!(tag::SNI < tag::UAID);
}

#[test]
fn tag_display() {
	assert_eq!(tag::CHLO.to_string(), "CHLO");
	assert_eq!(tag::REJ.to_string(), "REJ");
	assert_eq!(Tag::new([0x01, 0x02, 0x03, 0x04]).to_string(), "0x04030201");
	assert_eq!(format!("{:?}", tag::SCFG), "Tag(SCFG)");
}
