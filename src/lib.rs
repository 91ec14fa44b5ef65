/* src/lib.rs */

//! Server side of the first gQUIC crypto handshake round (CHLO → REJ).
//!
//! This crate provides three layers of functionality:
//!
//! **Layer 1: wire codecs** (always available, no dependencies beyond
//! `thiserror`): public headers and version negotiation packets, tag-value
//! handshake messages, STREAM and ACK frames, the entropy accumulator and
//! the null AEAD used before keys are agreed.
//!
//! **Layer 2: handshake orchestration** (always available): drives one
//! attempt from the client's first packet to the sealed rejection, against
//! pluggable [`ProofSource`], [`KeyExchange`], [`PacketAead`] and
//! [`DatagramTransport`] implementations.
//!
//! **Layer 3: key material** (requires `ring` or `aws-lc-rs` feature): an
//! ECDSA P-256 proof source, an ephemeral Curve25519 key exchange and an
//! AES-128-GCM packet protection.

#[cfg(all(feature = "ring", feature = "aws-lc-rs"))]
compile_error!(
	"features `ring` and `aws-lc-rs` are mutually exclusive; enable only one crypto backend"
);

mod aead;
mod entropy;
mod error;
mod frame;
mod handshake;
mod header;
mod message;
mod uint;

pub mod tag;

#[cfg(any(feature = "ring", feature = "aws-lc-rs"))]
mod crypto;

pub use aead::{NULL_AEAD_TAG_LEN, NullAead, PacketAead};
pub use entropy::EntropyAccumulator;
pub use error::Error;
pub use frame::{
	AckFrame, Frame, StreamFrame, parse_ack_frame, parse_frames, parse_stream_frame,
	write_ack_frame, write_stream_frame,
};
pub use handshake::{
	DatagramTransport, Handshake, HandshakeConfig, HandshakeOutcome, HandshakeState, KeyExchange,
	ProofSource, RECV_BUFFER_LEN, Reply,
};
pub use header::{
	PRIVATE_FLAG_ENTROPY, PRIVATE_FLAG_FEC, PRIVATE_FLAG_FEC_GROUP, PacketNumberLen, PublicHeader,
	parse_public_header, write_public_header, write_version_negotiation,
};
pub use message::{MAX_ENTRIES, TagValueMessage, parse_message, write_message};
pub use tag::Tag;
pub use uint::{read_uint_le, write_uint_le};

#[cfg(any(feature = "ring", feature = "aws-lc-rs"))]
pub use crypto::{
	AES_128_GCM_KEY_LEN, AES_128_GCM_NONCE_LEN, Aes128GcmAead, Curve25519Kex, EcdsaProofSource,
	PROOF_SIGNATURE_LABEL, server_proof_message,
};
