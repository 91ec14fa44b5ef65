/* demos/parse_header.rs */

#![allow(missing_docs)]

// Parses the public header of a client's first gQUIC packet and opens its
// payload with the null AEAD. Works with `--no-default-features`.

use gquic_handshake::{
	Frame, NullAead, PRIVATE_FLAG_ENTROPY, PacketAead, PublicHeader, StreamFrame, TagValueMessage,
	parse_frames, parse_message, parse_public_header, tag, write_public_header, write_stream_frame,
};

fn main() {
	let mut packet = match build_sample_hello() {
		Ok(p) => p,
		Err(e) => {
			eprintln!("could not build sample packet: {e}");
			return;
		}
	};

	let (header, header_len) = match parse_public_header(&packet) {
		Ok(h) => h,
		Err(e) => {
			eprintln!("header parse error: {e}");
			return;
		}
	};

	println!("gQUIC public header parsed successfully");
	println!("  connection id: {:#018x}", header.connection_id);
	match header.version {
		Some(v) => println!("  version:       {v}"),
		None => println!("  version:       (absent)"),
	}
	println!(
		"  packet number: {} ({} byte(s))",
		header.packet_number,
		header.packet_number_len.len()
	);
	println!("  header size:   {header_len} bytes");

	let (associated_data, body) = packet.split_at_mut(header_len);
	let plaintext = match NullAead.open(header.packet_number, associated_data, body) {
		Ok(p) => p,
		Err(e) => {
			eprintln!("payload rejected: {e}");
			return;
		}
	};

	let Some((&private_flags, payload)) = plaintext.split_first() else {
		eprintln!("payload is empty");
		return;
	};
	println!("  private flags: {private_flags:#04x}");

	let frames = match parse_frames(payload) {
		Ok(f) => f,
		Err(e) => {
			eprintln!("frame parse error: {e}");
			return;
		}
	};

	for frame in &frames {
		match frame {
			Frame::Stream(s) => {
				println!("  STREAM id={} offset={} len={}", s.stream_id, s.offset, s.data.len());
				if let Ok(msg) = parse_message(&s.data) {
					println!("    message {}", msg.tag);
					for (t, v) in &msg.entries {
						println!("      {t}: {}", String::from_utf8_lossy(v));
					}
				}
			}
			Frame::Ack(a) => println!("  ACK largest_observed={}", a.largest_observed),
			Frame::Padding(n) => println!("  PADDING {n} bytes"),
		}
	}
}

fn build_sample_hello() -> Result<Vec<u8>, gquic_handshake::Error> {
	let chlo = TagValueMessage::new(tag::CHLO)
		.with(tag::UAID, b"demo-client".to_vec())
		.with(tag::SNI, b"localhost".to_vec());

	let mut payload = vec![PRIVATE_FLAG_ENTROPY];
	write_stream_frame(
		&StreamFrame {
			stream_id: 1,
			fin: false,
			offset: 0,
			data: chlo.to_bytes()?,
		},
		&mut payload,
	)?;
	payload.resize(payload.len() + 32, 0);

	let header = PublicHeader {
		version: Some(tag::Q032),
		..PublicHeader::new(0x0102_0304_0506_0708, 1)
	};
	let mut packet = Vec::new();
	write_public_header(&header, &mut packet);
	let header_len = packet.len();
	NullAead.seal(header.packet_number, &mut packet, header_len, &payload)?;
	Ok(packet)
}
