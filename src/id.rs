//! Base58 public-key text used for token mints and holder wallets.
//!
//! Both identifiers are kept as the text the indexer returns. Validation only checks the
//! encoding (Bitcoin base58 alphabet, at most [`MAX_KEY_LEN`] characters), which is enough to
//! reject whitespace, padding, and hex or base64 keys pasted by mistake.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

/// Longest base58 encoding of a 32-byte key.
pub const MAX_KEY_LEN: usize = 44;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Which identifier failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum KeyKind {
	/// Token mint.
	Mint,
	/// Holder wallet.
	Address,
}
impl Display for KeyKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(match self {
			Self::Mint => "mint",
			Self::Address => "address",
		})
	}
}

/// Error returned when a key is not valid base58 text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The key was empty.
	#[error("The {kind} key is empty.")]
	Empty {
		/// Identifier being parsed.
		kind: KeyKind,
	},
	/// The key is longer than any base58 encoded 32-byte key.
	#[error("The {kind} key has {len} characters; base58 keys have at most 44.")]
	TooLong {
		/// Identifier being parsed.
		kind: KeyKind,
		/// Character count of the rejected key.
		len: usize,
	},
	/// The key contains a character outside the base58 alphabet (`0`, `O`, `I`, `l`, symbols,
	/// whitespace).
	#[error("The {kind} key has non-base58 character {found:?} at position {position}.")]
	NotBase58 {
		/// Identifier being parsed.
		kind: KeyKind,
		/// Offending character.
		found: char,
		/// Character index of `found`.
		position: usize,
	},
}

/// Token mint address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mint(String);
impl Mint {
	/// Parses a base58 mint address.
	pub fn new(key: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let key = key.as_ref();

		check_base58(KeyKind::Mint, key)?;

		Ok(Self(key.to_owned()))
	}
}

/// Wallet address owning one or more token accounts.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);
impl Address {
	/// Parses a base58 wallet address.
	pub fn new(key: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let key = key.as_ref();

		check_base58(KeyKind::Address, key)?;

		Ok(Self(key.to_owned()))
	}
}

// Shared string-view plumbing; parsing stays on the concrete `new` constructors above.
macro_rules! key_text {
	($($name:ident => $kind:ident),+) => {$(
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, IdentifierError> {
				Self::new(s)
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, IdentifierError> {
				check_base58(KeyKind::$kind, &value)?;

				Ok(Self(value))
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
	)+};
}
key_text!(Mint => Mint, Address => Address);

fn check_base58(kind: KeyKind, key: &str) -> Result<(), IdentifierError> {
	if key.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if let Some((position, found)) =
		key.chars().enumerate().find(|(_, c)| !BASE58_ALPHABET.contains(*c))
	{
		return Err(IdentifierError::NotBase58 { kind, found, position });
	}
	// Alphabet is ASCII, so the byte length is the character count from here on.
	if key.len() > MAX_KEY_LEN {
		return Err(IdentifierError::TooLong { kind, len: key.len() });
	}

	Ok(())
}
