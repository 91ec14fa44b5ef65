/* src/crypto.rs */

use crate::aead::PacketAead;
use crate::error::Error;
use crate::handshake::{KeyExchange, ProofSource};

use backend::{aead, agreement, digest, rand, signature};

/// Prefix of the message signed by the server proof.
pub const PROOF_SIGNATURE_LABEL: &[u8] = b"QUIC CHLO and server config signature\0";

/// AES-128-GCM key length.
pub const AES_128_GCM_KEY_LEN: usize = 16;
/// AES-128-GCM nonce (IV) length.
pub const AES_128_GCM_NONCE_LEN: usize = 12;

#[cfg(feature = "ring")]
mod backend {
	pub(super) use ring::{aead, agreement, digest, rand, signature};

	use crate::error::Error;

	pub(super) fn ecdsa_from_pkcs8(
		pkcs8: &[u8],
		rng: &rand::SystemRandom,
	) -> Result<signature::EcdsaKeyPair, Error> {
		signature::EcdsaKeyPair::from_pkcs8(
			&signature::ECDSA_P256_SHA256_ASN1_SIGNING,
			pkcs8,
			rng,
		)
		.map_err(|e| Error::Crypto(format!("ECDSA key rejected: {e}")))
	}
}

#[cfg(feature = "aws-lc-rs")]
mod backend {
	pub(super) use aws_lc_rs::{aead, agreement, digest, rand, signature};

	use crate::error::Error;

	pub(super) fn ecdsa_from_pkcs8(
		pkcs8: &[u8],
		_rng: &rand::SystemRandom,
	) -> Result<signature::EcdsaKeyPair, Error> {
		signature::EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8)
			.map_err(|e| Error::Crypto(format!("ECDSA key rejected: {e}")))
	}
}

/// Build the byte string covered by the server proof.
///
/// Layout: [`PROOF_SIGNATURE_LABEL`], the SHA-256 length as u32 LE, the
/// SHA-256 of the client hello, then the serialized server config.
#[must_use]
pub fn server_proof_message(client_hello: &[u8], server_config: &[u8]) -> Vec<u8> {
	let chlo_hash = digest::digest(&digest::SHA256, client_hello);
	let hash = chlo_hash.as_ref();
	let mut msg =
		Vec::with_capacity(PROOF_SIGNATURE_LABEL.len() + 4 + hash.len() + server_config.len());
	msg.extend_from_slice(PROOF_SIGNATURE_LABEL);
	#[allow(clippy::cast_possible_truncation)]
	msg.extend_from_slice(&(hash.len() as u32).to_le_bytes());
	msg.extend_from_slice(hash);
	msg.extend_from_slice(server_config);
	msg
}

/// Proof source backed by an ECDSA P-256 key and a certificate blob.
pub struct EcdsaProofSource {
	key_pair: signature::EcdsaKeyPair,
	rng: rand::SystemRandom,
	certificate: Vec<u8>,
}

impl EcdsaProofSource {
	/// Load a PKCS#8 encoded P-256 private key together with the certificate
	/// data sent in the `CERT` entry.
	///
	/// # Errors
	///
	/// Returns [`Error::Crypto`] if the key is not a valid P-256 PKCS#8 key.
	pub fn from_pkcs8(pkcs8: &[u8], certificate: Vec<u8>) -> Result<Self, Error> {
		let rng = rand::SystemRandom::new();
		let key_pair = backend::ecdsa_from_pkcs8(pkcs8, &rng)?;
		Ok(Self {
			key_pair,
			rng,
			certificate,
		})
	}

	/// Generate a fresh PKCS#8 encoded P-256 private key.
	///
	/// # Errors
	///
	/// Returns [`Error::Crypto`] if the system random source fails.
	pub fn generate_pkcs8() -> Result<Vec<u8>, Error> {
		let rng = rand::SystemRandom::new();
		let document = signature::EcdsaKeyPair::generate_pkcs8(
			&signature::ECDSA_P256_SHA256_ASN1_SIGNING,
			&rng,
		)
		.map_err(|_| Error::Crypto("ECDSA key generation failed".into()))?;
		Ok(document.as_ref().to_vec())
	}

	/// Uncompressed SEC1 public key matching the signing key.
	#[must_use]
	pub fn public_key(&self) -> &[u8] {
		use signature::KeyPair;
		self.key_pair.public_key().as_ref()
	}
}

impl ProofSource for EcdsaProofSource {
	fn sign_server_proof(&self, client_hello: &[u8], server_config: &[u8]) -> Result<Vec<u8>, Error> {
		let msg = server_proof_message(client_hello, server_config);
		let sig = self
			.key_pair
			.sign(&self.rng, &msg)
			.map_err(|_| Error::SigningFailure("ECDSA signing failed".into()))?;
		Ok(sig.as_ref().to_vec())
	}

	fn certificate_data(&self) -> &[u8] {
		&self.certificate
	}
}

/// Ephemeral Curve25519 key exchange offered as `C255` in the server config.
///
/// Only the public half is retained.
#[derive(Debug, Clone)]
pub struct Curve25519Kex {
	public_key: Vec<u8>,
}

impl Curve25519Kex {
	/// Generate a fresh key pair.
	///
	/// # Errors
	///
	/// Returns [`Error::Crypto`] if the system random source fails.
	pub fn generate() -> Result<Self, Error> {
		let rng = rand::SystemRandom::new();
		let private_key = agreement::EphemeralPrivateKey::generate(&agreement::X25519, &rng)
			.map_err(|_| Error::Crypto("X25519 key generation failed".into()))?;
		let public_key = private_key
			.compute_public_key()
			.map_err(|_| Error::Crypto("X25519 public key derivation failed".into()))?;
		Ok(Self {
			public_key: public_key.as_ref().to_vec(),
		})
	}
}

impl KeyExchange for Curve25519Kex {
	fn public_key(&self) -> &[u8] {
		&self.public_key
	}
}

/// AES-128-GCM packet protection for use once keys are agreed.
///
/// The nonce is the IV with the packet number XORed, big-endian, into its
/// last eight bytes. The 16-byte authentication tag follows the ciphertext.
pub struct Aes128GcmAead {
	key: aead::LessSafeKey,
	iv: [u8; AES_128_GCM_NONCE_LEN],
}

impl Aes128GcmAead {
	/// Create from a 16-byte key and a 12-byte IV.
	///
	/// # Errors
	///
	/// Returns [`Error::Crypto`] if either length is wrong.
	pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, Error> {
		let unbound = aead::UnboundKey::new(&aead::AES_128_GCM, key)
			.map_err(|_| Error::Crypto("invalid AES-GCM key".into()))?;
		let iv = <[u8; AES_128_GCM_NONCE_LEN]>::try_from(iv)
			.map_err(|_| Error::Crypto("unexpected IV length".into()))?;
		Ok(Self {
			key: aead::LessSafeKey::new(unbound),
			iv,
		})
	}

	fn nonce(&self, packet_number: u64) -> aead::Nonce {
		let mut nonce = self.iv;
		for (n, p) in nonce[4..].iter_mut().zip(packet_number.to_be_bytes()) {
			*n ^= p;
		}
		aead::Nonce::assume_unique_for_key(nonce)
	}
}

impl PacketAead for Aes128GcmAead {
	fn seal(
		&self,
		packet_number: u64,
		packet: &mut Vec<u8>,
		header_len: usize,
		plaintext: &[u8],
	) -> Result<(), Error> {
		if header_len > packet.len() {
			return Err(Error::MalformedHeader {
				need: header_len,
				have: packet.len(),
			});
		}
		let original_len = packet.len();
		packet.extend_from_slice(plaintext);
		let (associated_data, in_out) = packet.split_at_mut(original_len);
		let tag = self.key.seal_in_place_separate_tag(
			self.nonce(packet_number),
			aead::Aad::from(&associated_data[..header_len]),
			in_out,
		);
		match tag {
			Ok(tag) => {
				packet.extend_from_slice(tag.as_ref());
				Ok(())
			}
			Err(_) => {
				packet.truncate(original_len);
				Err(Error::Crypto("AES-GCM seal failed".into()))
			}
		}
	}

	fn open<'a>(
		&self,
		packet_number: u64,
		associated_data: &[u8],
		body: &'a mut [u8],
	) -> Result<&'a [u8], Error> {
		let plaintext = self
			.key
			.open_in_place(
				self.nonce(packet_number),
				aead::Aad::from(associated_data),
				body,
			)
			.map_err(|_| Error::AuthenticationFailure)?;
		Ok(plaintext)
	}
}
