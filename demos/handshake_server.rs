/* demos/handshake_server.rs */

#![allow(missing_docs)]

// Answers gQUIC client hellos on 127.0.0.1:6121 with a signed rejection.
//
//   cargo run --example handshake_server [CERT_FILE KEY_PKCS8_DER]
//
// Without arguments an ephemeral P-256 key and a placeholder certificate
// are used. Each failed attempt is reported and the next one starts fresh.

#[cfg(any(feature = "ring", feature = "aws-lc-rs"))]
fn main() {
	use std::net::UdpSocket;

	use gquic_handshake::{
		Curve25519Kex, EcdsaProofSource, Error, Handshake, HandshakeConfig, HandshakeOutcome,
	};

	fn load_proof_source() -> Result<EcdsaProofSource, Error> {
		let args: Vec<String> = std::env::args().skip(1).collect();
		match args.as_slice() {
			[cert, key] => {
				let certificate = std::fs::read(cert)?;
				let pkcs8 = std::fs::read(key)?;
				EcdsaProofSource::from_pkcs8(&pkcs8, certificate)
			}
			_ => {
				let pkcs8 = EcdsaProofSource::generate_pkcs8()?;
				EcdsaProofSource::from_pkcs8(&pkcs8, b"placeholder certificate".to_vec())
			}
		}
	}

	let proof = match load_proof_source() {
		Ok(p) => p,
		Err(e) => {
			eprintln!("could not load signing key: {e}");
			return;
		}
	};
	let kex = match Curve25519Kex::generate() {
		Ok(k) => k,
		Err(e) => {
			eprintln!("key exchange setup failed: {e}");
			return;
		}
	};
	let mut socket = match UdpSocket::bind("127.0.0.1:6121") {
		Ok(s) => s,
		Err(e) => {
			eprintln!("bind failed: {e}");
			return;
		}
	};

	let config = HandshakeConfig::default();
	println!("listening on 127.0.0.1:6121 ({})", config.version);

	loop {
		let mut handshake = Handshake::new(&config, &proof, &kex);
		match handshake.run(&mut socket) {
			Ok(HandshakeOutcome::VersionNegotiated {
				connection_id,
				client_version,
			}) => {
				println!("{connection_id:#018x}: client asked for {client_version}, sent version negotiation");
			}
			Ok(HandshakeOutcome::Rejected {
				client_hello,
				next_header,
			}) => {
				let uaid = client_hello
					.get(gquic_handshake::tag::UAID)
					.map(String::from_utf8_lossy)
					.unwrap_or_default();
				println!(
					"{:#018x}: rejected hello from {uaid:?}, client continued with packet {}",
					next_header.connection_id, next_header.packet_number
				);
			}
			Err(e) => eprintln!("attempt failed in {:?}: {e}", handshake.state()),
		}
	}
}

#[cfg(not(any(feature = "ring", feature = "aws-lc-rs")))]
fn main() {
	eprintln!("this example needs the `ring` or `aws-lc-rs` feature");
}
