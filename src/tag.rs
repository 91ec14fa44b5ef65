/* src/tag.rs */

use core::fmt;

/// A 4-byte handshake tag such as `CHLO` or `SCFG`.
///
/// The numeric value is the four wire bytes read as a little-endian `u32`.
/// Ordering and equality use that value only, which is what the canonical
/// entry order of a tag-value message is defined on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u32);

impl Tag {
	/// Build a tag from its four wire bytes.
	#[must_use]
	pub const fn new(bytes: [u8; 4]) -> Self {
		Self(u32::from_le_bytes(bytes))
	}

	/// Build a tag from its numeric value.
	#[must_use]
	pub const fn from_u32(value: u32) -> Self {
		Self(value)
	}

	/// Numeric value used for ordering.
	#[must_use]
	pub const fn as_u32(self) -> u32 {
		self.0
	}

	/// The four bytes as they appear on the wire.
	#[must_use]
	pub const fn to_bytes(self) -> [u8; 4] {
		self.0.to_le_bytes()
	}
}

impl From<[u8; 4]> for Tag {
	fn from(bytes: [u8; 4]) -> Self {
		Self::new(bytes)
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bytes = self.to_bytes();
		let printable = bytes.iter().all(|&b| b == 0 || b.is_ascii_graphic());
		if !printable {
			return write!(f, "{:#010x}", self.0);
		}
		for &b in bytes.iter().filter(|&&b| b != 0) {
			write!(f, "{}", char::from(b))?;
		}
		Ok(())
	}
}

impl fmt::Debug for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Tag({self})")
	}
}

/// Client hello.
pub const CHLO: Tag = Tag::new(*b"CHLO");
/// Server rejection carrying the server config.
pub const REJ: Tag = Tag::new(*b"REJ\0");
/// Server config message, and the REJ entry that embeds it.
pub const SCFG: Tag = Tag::new(*b"SCFG");

/// User agent id sent by the client.
pub const UAID: Tag = Tag::new(*b"UAID");
/// Server name indication.
pub const SNI: Tag = Tag::new(*b"SNI\0");
/// Padding entry used by clients to reach the minimum hello size.
pub const PAD: Tag = Tag::new(*b"PAD\0");

/// Server config id.
pub const SCID: Tag = Tag::new(*b"SCID");
/// Key exchange algorithms.
pub const KEXS: Tag = Tag::new(*b"KEXS");
/// Authenticated encryption algorithms.
pub const AEAD: Tag = Tag::new(*b"AEAD");
/// Public values for each key exchange algorithm.
pub const PUBS: Tag = Tag::new(*b"PUBS");
/// Server orbit.
pub const OBIT: Tag = Tag::new(*b"OBIT");
/// Server config expiry, seconds since the epoch.
pub const EXPY: Tag = Tag::new(*b"EXPY");
/// Supported protocol versions.
pub const VER: Tag = Tag::new(*b"VER\0");

/// Certificate chain.
pub const CERT: Tag = Tag::new(*b"CERT");
/// Signature over the client hello and server config.
pub const PROF: Tag = Tag::new(*b"PROF");

/// Curve25519 key exchange.
pub const C255: Tag = Tag::new(*b"C255");
/// AES-128-GCM with a 12-byte tag.
pub const AESG: Tag = Tag::new(*b"AESG");

/// Protocol version Q032.
pub const Q032: Tag = Tag::new(*b"Q032");
