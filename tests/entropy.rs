/* tests/entropy.rs */

#![allow(missing_docs)]

use gquic_handshake::EntropyAccumulator;

#[test]
fn starts_empty() {
	let acc = EntropyAccumulator::new();
	assert!(!acc.get());
	assert_eq!(acc.hash(), 0);
	assert_eq!(acc.largest_observed(), None);
	assert_eq!(acc, EntropyAccumulator::default());
}

#[test]
fn bits_one_zero_one() {
	let mut acc = EntropyAccumulator::new();
	acc.add(1, true);
	acc.add(2, false);
	acc.add(3, true);
	assert!(acc.get());
	assert_eq!(acc.hash(), 0b0000_1010);
	assert_eq!(acc.largest_observed(), Some(3));
}

#[test]
fn bit_position_wraps_every_eight_packets() {
	let mut acc = EntropyAccumulator::new();
	acc.add(1, true);
	acc.add(9, true);
	assert!(!acc.get());
	assert_eq!(acc.hash(), 0);
}

#[test]
fn cleared_flags_do_not_contribute() {
	let mut acc = EntropyAccumulator::new();
	for pn in 1..=5 {
		acc.add(pn, false);
	}
	assert!(!acc.get());
	assert_eq!(acc.largest_observed(), Some(5));
}

#[test]
fn repeated_packet_number_is_ignored() {
	let mut acc = EntropyAccumulator::new();
	acc.add(5, true);
	acc.add(5, true);
	acc.add(4, true);
	assert_eq!(acc.hash(), 0b0010_0000);
	assert_eq!(acc.largest_observed(), Some(5));
}

#[test]
fn get_has_no_side_effects() {
	let mut acc = EntropyAccumulator::new();
	acc.add(1, true);
	assert_eq!(acc.get(), acc.get());
	assert_eq!(acc.hash(), 0b10);
}

#[test]
fn get_is_non_zero_test_not_parity() {
	let mut acc = EntropyAccumulator::new();
	acc.add(1, true);
	acc.add(2, true);
	assert_eq!(acc.hash(), 0b0000_0110);
	assert!(acc.get());
}
