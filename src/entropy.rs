/* src/entropy.rs */

/// Rolling entropy hash of received packets.
///
/// Each packet whose entropy flag is set toggles bit `packet_number % 8` of
/// an 8-bit hash. The result is echoed in outgoing ACK frames so the peer can
/// check that the acknowledged packets are the ones it actually sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntropyAccumulator {
	hash: u8,
	largest: Option<u64>,
}

impl EntropyAccumulator {
	/// Fresh accumulator with no packets seen.
	#[must_use]
	pub const fn new() -> Self {
		Self {
			hash: 0,
			largest: None,
		}
	}

	/// Fold the entropy bit of `packet_number` into the hash.
	///
	/// Packet numbers are expected to increase; a number at or below the
	/// largest one already added has contributed before and is ignored.
	pub fn add(&mut self, packet_number: u64, entropy: bool) {
		if self.largest.is_some_and(|largest| packet_number <= largest) {
			return;
		}
		self.largest = Some(packet_number);
		if entropy {
			self.hash ^= 1 << (packet_number % 8);
		}
	}

	/// Whether the hash is non-zero.
	///
	/// This is a non-zero test on the 8-bit hash, not the XOR parity of the
	/// entropy bits: flagged packets 1 and 2 give `true`.
	#[must_use]
	pub const fn get(&self) -> bool {
		self.hash != 0
	}

	/// The full 8-bit entropy hash.
	#[must_use]
	pub const fn hash(&self) -> u8 {
		self.hash
	}

	/// Largest packet number added so far.
	#[must_use]
	pub const fn largest_observed(&self) -> Option<u64> {
		self.largest
	}
}
