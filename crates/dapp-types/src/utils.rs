//! String formatting utilities.
//!
//! Provides functions for formatting strings for display, including hex
//! prefix management, address truncation, APT amount formatting and address
//! validation.

/// Number of decimal places of the APT coin.
const APT_DECIMALS: u32 = 8;

/// Utility function to truncate a hex string for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Shortens an address to `start…end` form, e.g. `0x1234...abcd`.
///
/// Addresses no longer than `start_len + end_len` are returned unchanged.
pub fn truncate_address(address: &str, start_len: usize, end_len: usize) -> String {
	let chars: Vec<char> = address.chars().collect();
	if chars.len() <= start_len + end_len {
		return address.to_string();
	}

	let start: String = chars[..start_len].iter().collect();
	let end: String = chars[chars.len() - end_len..].iter().collect();
	format!("{}...{}", start, end)
}

/// Shortens a transaction hash for display, keeping 8 characters on each side.
pub fn format_transaction_hash(hash: &str) -> String {
	truncate_address(hash, 8, 8)
}

/// Formats an amount of octas as APT with four decimal places.
///
/// The value is rounded half-up at the fourth decimal.
pub fn format_apt_balance(octas: u64) -> String {
	// 10^(8 - 4) octas per displayed unit
	let unit = 10u128.pow(APT_DECIMALS - 4);
	let scaled = (u128::from(octas) + unit / 2) / unit;
	format!("{}.{:04}", scaled / 10_000, scaled % 10_000)
}

/// Checks that a string looks like an account address.
///
/// Accepts an optional `0x` prefix followed by 1 to 64 hex digits, so both
/// short special addresses (`0x1`) and full 32-byte addresses pass.
pub fn is_valid_address(address: &str) -> bool {
	let clean = address.strip_prefix("0x").unwrap_or(address);
	!clean.is_empty() && clean.len() <= 64 && clean.chars().all(|c| c.is_ascii_hexdigit())
}
