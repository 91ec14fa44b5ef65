use crate::tag::Tag;

/// Errors that can occur while processing a handshake attempt.
///
/// Every variant aborts the current attempt only; none of them leave state
/// behind that would affect the next one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The public header is shorter than its flags byte promises.
	#[error("malformed public header: need at least {need} bytes, have {have}")]
	MalformedHeader {
		/// Minimum number of bytes required.
		need: usize,
		/// Actual number of bytes available.
		have: usize,
	},

	/// A tag-value handshake message violates its framing rules.
	#[error("malformed handshake message at offset {offset}: {reason}")]
	MalformedMessage {
		/// Byte offset within the message where the defect was found.
		offset: usize,
		/// What was wrong, including the offending tag or lengths.
		reason: String,
	},

	/// A frame inside a decrypted payload is truncated or inconsistent.
	#[error("malformed frame at offset {offset}: {reason}")]
	MalformedFrame {
		/// Byte offset within the decrypted payload.
		offset: usize,
		/// What was wrong.
		reason: &'static str,
	},

	/// The frame type byte selects a frame this crate does not handle.
	#[error("unknown frame type {0:#04x}")]
	UnknownFrameType(u8),

	/// The packet integrity tag did not verify.
	#[error("packet authentication failed")]
	AuthenticationFailure,

	/// A handshake message carried a different tag than the state expects.
	#[error("unexpected handshake message {actual}, expected {expected}")]
	UnexpectedMessageTag {
		/// Tag the orchestrator was waiting for.
		expected: Tag,
		/// Tag actually received.
		actual: Tag,
	},

	/// The proof source could not sign the server config.
	#[error("server proof signing failed: {0}")]
	SigningFailure(String),

	/// Key material was rejected or a cipher operation failed.
	#[error("crypto backend failure: {0}")]
	Crypto(String),

	/// Reading or writing a datagram failed.
	#[error("transport failure: {0}")]
	Transport(#[from] std::io::Error),
}
