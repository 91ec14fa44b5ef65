/* src/handshake.rs */

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::aead::{NullAead, PacketAead};
use crate::entropy::EntropyAccumulator;
use crate::error::Error;
use crate::frame::{AckFrame, Frame, StreamFrame, parse_frames, write_ack_frame, write_stream_frame};
use crate::header::{
	PRIVATE_FLAG_ENTROPY, PublicHeader, parse_public_header, write_public_header,
	write_version_negotiation,
};
use crate::message::{TagValueMessage, parse_message, write_message};
use crate::tag::{self, Tag};

/// Size of the receive buffer handed to the transport.
pub const RECV_BUFFER_LEN: usize = 0x10000;

/// Packet number of the server's first packet, also acknowledged as the
/// largest observed client packet in the rejection.
const FIRST_PACKET_NUMBER: u64 = 1;

/// Signing key and certificate chain of the server.
pub trait ProofSource {
	/// Sign the client hello and serialized server config.
	///
	/// # Errors
	///
	/// Returns [`Error::SigningFailure`] when the key cannot produce a
	/// signature.
	fn sign_server_proof(&self, client_hello: &[u8], server_config: &[u8]) -> Result<Vec<u8>, Error>;

	/// Certificate data sent in the `CERT` entry of the rejection.
	fn certificate_data(&self) -> &[u8];
}

/// Key exchange offered in the server config.
pub trait KeyExchange {
	/// Public value placed in the `PUBS` entry.
	fn public_key(&self) -> &[u8];
}

/// Datagram I/O used by [`Handshake::run`].
pub trait DatagramTransport {
	/// Receive one datagram into `buf`, returning its length and sender.
	///
	/// # Errors
	///
	/// Returns the underlying I/O error.
	fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

	/// Send `buf` as one datagram to `addr`, returning the bytes sent.
	///
	/// # Errors
	///
	/// Returns the underlying I/O error.
	fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
}

impl DatagramTransport for UdpSocket {
	fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
		UdpSocket::recv_from(self, buf)
	}

	fn send_to(&mut self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
		UdpSocket::send_to(self, buf, addr)
	}
}

/// Server parameters advertised in the server config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
	/// The one protocol version this server speaks.
	pub version: Tag,
	/// Server config id (`SCID`).
	pub server_config_id: [u8; 16],
	/// Server orbit (`OBIT`).
	pub orbit: [u8; 8],
	/// Server config expiry in seconds since the epoch (`EXPY`).
	pub expiry: u64,
	/// Stream the rejection is sent on.
	pub crypto_stream_id: u32,
}

impl Default for HandshakeConfig {
	fn default() -> Self {
		Self {
			version: tag::Q032,
			server_config_id: [
				0xc5, 0x1c, 0x73, 0x6b, 0x8f, 0x48, 0x49, 0xae, 0xb3, 0x00, 0xa2, 0xd4, 0x4b, 0xa0,
				0xcf, 0xdf,
			],
			orbit: [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07],
			expiry: u64::MAX,
			crypto_stream_id: 1,
		}
	}
}

/// Progress of one handshake attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
	/// Waiting for the first client packet.
	AwaitingHello,
	/// The client spoke another version and was sent a negotiation packet.
	VersionMismatch,
	/// A valid CHLO was decoded.
	HelloReceived,
	/// The rejection packet was built.
	RejectSent,
	/// Waiting for the client's follow-up packet.
	AwaitingSecondPacket,
	/// The follow-up packet's header was read.
	Complete,
}

/// Packet to send in answer to the client's first packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
	/// The client's version is unsupported; the attempt ends after sending.
	VersionNegotiation {
		/// The negotiation packet.
		packet: Vec<u8>,
		/// Connection ID of the client's packet.
		connection_id: u64,
		/// Version the client asked for.
		client_version: Tag,
	},
	/// A sealed packet carrying an ACK and the REJ message.
	Rejection {
		/// The sealed packet.
		packet: Vec<u8>,
		/// The decoded client hello.
		client_hello: TagValueMessage,
	},
}

/// Result of a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
	/// A version negotiation packet was sent to the client.
	VersionNegotiated {
		/// Connection ID echoed in the negotiation packet.
		connection_id: u64,
		/// Version the client asked for.
		client_version: Tag,
	},
	/// The CHLO was answered with a REJ and the client sent another packet.
	Rejected {
		/// The decoded client hello.
		client_hello: TagValueMessage,
		/// Public header of the client's follow-up packet.
		next_header: PublicHeader,
	},
}

/// One server-side handshake attempt: the first CHLO → REJ round.
///
/// Each attempt owns its entropy accumulator and buffers. The proof source
/// and key exchange are only borrowed and may be shared between attempts.
pub struct Handshake<'a, P, K, A = NullAead> {
	config: &'a HandshakeConfig,
	proof: &'a P,
	kex: &'a K,
	aead: A,
	entropy: EntropyAccumulator,
	state: HandshakeState,
}

impl<'a, P, K> Handshake<'a, P, K, NullAead>
where
	P: ProofSource,
	K: KeyExchange,
{
	/// New attempt protected by the [`NullAead`].
	#[must_use]
	pub fn new(config: &'a HandshakeConfig, proof: &'a P, kex: &'a K) -> Self {
		Self::with_aead(config, proof, kex, NullAead)
	}
}

impl<'a, P, K, A> Handshake<'a, P, K, A>
where
	P: ProofSource,
	K: KeyExchange,
	A: PacketAead,
{
	/// New attempt using `aead` for packet protection.
	#[must_use]
	pub fn with_aead(config: &'a HandshakeConfig, proof: &'a P, kex: &'a K, aead: A) -> Self {
		Self {
			config,
			proof,
			kex,
			aead,
			entropy: EntropyAccumulator::new(),
			state: HandshakeState::AwaitingHello,
		}
	}

	/// Current state.
	#[must_use]
	pub const fn state(&self) -> HandshakeState {
		self.state
	}

	/// Entropy accumulated from the client's packets.
	#[must_use]
	pub const fn entropy(&self) -> &EntropyAccumulator {
		&self.entropy
	}

	/// Drive the attempt over `transport`: read the hello, send the reply,
	/// then read the header of the client's next packet.
	///
	/// A version mismatch ends the attempt right after the negotiation
	/// packet is sent.
	///
	/// # Errors
	///
	/// Any codec, authentication, signing or transport failure aborts the
	/// attempt and is returned.
	pub fn run<T: DatagramTransport>(&mut self, transport: &mut T) -> Result<HandshakeOutcome, Error> {
		let mut buf = vec![0u8; RECV_BUFFER_LEN];
		let (len, peer) = transport.recv_from(&mut buf)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(%peer, len, "received first packet");

		match self.process_hello(&mut buf[..len])? {
			Reply::VersionNegotiation {
				packet,
				connection_id,
				client_version,
			} => {
				send_all(transport, &packet, peer)?;
				Ok(HandshakeOutcome::VersionNegotiated {
					connection_id,
					client_version,
				})
			}
			Reply::Rejection {
				packet,
				client_hello,
			} => {
				send_all(transport, &packet, peer)?;
				self.state = HandshakeState::AwaitingSecondPacket;

				let (len, _) = transport.recv_from(&mut buf)?;
				let (next_header, _) = parse_public_header(&buf[..len])?;
				self.state = HandshakeState::Complete;

				#[cfg(feature = "tracing")]
				tracing::debug!(
					connection_id = next_header.connection_id,
					packet_number = next_header.packet_number,
					"received follow-up packet"
				);

				Ok(HandshakeOutcome::Rejected {
					client_hello,
					next_header,
				})
			}
		}
	}

	/// Process the client's first packet and build the reply.
	///
	/// `packet` is decrypted in place.
	///
	/// # Errors
	///
	/// Returns [`Error::UnexpectedMessageTag`] when the message is not a
	/// CHLO, [`Error::MalformedFrame`] when the payload has no STREAM frame,
	/// and propagates header, AEAD, message and signing failures.
	pub fn process_hello(&mut self, packet: &mut [u8]) -> Result<Reply, Error> {
		let (header, header_len) = parse_public_header(packet)?;

		if let Some(client_version) = header.version.filter(|v| *v != self.config.version) {
			#[cfg(feature = "tracing")]
			tracing::info!(
				connection_id = header.connection_id,
				%client_version,
				server_version = %self.config.version,
				"sending version negotiation packet"
			);

			self.state = HandshakeState::VersionMismatch;
			return Ok(Reply::VersionNegotiation {
				packet: write_version_negotiation(header.connection_id, &[self.config.version]),
				connection_id: header.connection_id,
				client_version,
			});
		}

		let (associated_data, body) = packet.split_at_mut(header_len);
		let plaintext = self.aead.open(header.packet_number, associated_data, body)?;

		let (&private_flags, payload) = plaintext.split_first().ok_or(Error::MalformedFrame {
			offset: 0,
			reason: "payload has no private flags",
		})?;
		self.entropy.add(
			header.packet_number,
			private_flags & PRIVATE_FLAG_ENTROPY != 0,
		);

		let frame = parse_frames(payload)?
			.into_iter()
			.find_map(|frame| match frame {
				Frame::Stream(stream) => Some(stream),
				_ => None,
			})
			.ok_or(Error::MalformedFrame {
				offset: 1,
				reason: "payload has no STREAM frame",
			})?;

		let client_hello = parse_message(&frame.data)?;
		if client_hello.tag != tag::CHLO {
			return Err(Error::UnexpectedMessageTag {
				expected: tag::CHLO,
				actual: client_hello.tag,
			});
		}
		self.state = HandshakeState::HelloReceived;

		#[cfg(feature = "tracing")]
		tracing::info!(
			connection_id = header.connection_id,
			user_agent = %String::from_utf8_lossy(client_hello.get(tag::UAID).unwrap_or_default()),
			entries = client_hello.entries.len(),
			"received client hello"
		);

		let packet = self.build_rejection(header.connection_id, &frame.data)?;
		self.state = HandshakeState::RejectSent;

		Ok(Reply::Rejection {
			packet,
			client_hello,
		})
	}

	/// Serialized SCFG message for this server.
	///
	/// # Errors
	///
	/// Returns [`Error::MalformedMessage`] if the public key is too long for
	/// its length prefix or the message cannot be encoded.
	pub fn server_config(&self) -> Result<Vec<u8>, Error> {
		let public_key = self.kex.public_key();
		let key_len = u32::try_from(public_key.len())
			.ok()
			.filter(|len| *len < 1 << 24)
			.ok_or_else(|| Error::MalformedMessage {
				offset: 0,
				reason: format!("{}-byte public key overflows the PUBS length", public_key.len()),
			})?;
		// Each public value carries a 24-bit little-endian length prefix.
		let mut pubs = Vec::with_capacity(3 + public_key.len());
		pubs.extend_from_slice(&key_len.to_le_bytes()[..3]);
		pubs.extend_from_slice(public_key);

		let scfg = TagValueMessage::new(tag::SCFG)
			.with(tag::SCID, self.config.server_config_id)
			.with(tag::KEXS, tag::C255.to_bytes())
			.with(tag::AEAD, tag::AESG.to_bytes())
			.with(tag::PUBS, pubs)
			.with(tag::OBIT, self.config.orbit)
			.with(tag::EXPY, self.config.expiry.to_le_bytes())
			.with(tag::VER, self.config.version.to_bytes());
		scfg.to_bytes()
	}

	fn build_rejection(&self, connection_id: u64, client_hello: &[u8]) -> Result<Vec<u8>, Error> {
		let server_config = self.server_config()?;
		let proof = self
			.proof
			.sign_server_proof(client_hello, &server_config)?;

		let rej = TagValueMessage::new(tag::REJ)
			.with(tag::SCFG, server_config)
			.with(tag::CERT, self.proof.certificate_data())
			.with(tag::PROF, proof);
		let mut rej_bytes = Vec::with_capacity(rej.encoded_len());
		write_message(&rej, &mut rej_bytes)?;

		let ack = AckFrame {
			entropy: self.entropy.get(),
			largest_observed: FIRST_PACKET_NUMBER,
			ack_delay: 0,
		};
		let stream = StreamFrame {
			stream_id: self.config.crypto_stream_id,
			fin: false,
			offset: 0,
			data: rej_bytes,
		};

		let mut payload = Vec::with_capacity(stream.data.len() + 32);
		payload.push(0);
		write_ack_frame(&ack, &mut payload);
		write_stream_frame(&stream, &mut payload)?;

		let header = PublicHeader::new(connection_id, FIRST_PACKET_NUMBER);
		let mut packet = Vec::with_capacity(header.encoded_len() + payload.len() + 16);
		write_public_header(&header, &mut packet);
		let header_len = packet.len();
		self.aead
			.seal(header.packet_number, &mut packet, header_len, &payload)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(
			connection_id,
			entropy = ack.entropy,
			largest_observed = ack.largest_observed,
			packet_len = packet.len(),
			"built rejection packet"
		);

		Ok(packet)
	}
}

fn send_all<T: DatagramTransport>(transport: &mut T, packet: &[u8], peer: SocketAddr) -> Result<(), Error> {
	let sent = transport.send_to(packet, peer)?;
	if sent != packet.len() {
		return Err(Error::Transport(io::Error::new(
			io::ErrorKind::WriteZero,
			format!("sent {sent} of {} bytes", packet.len()),
		)));
	}
	Ok(())
}
