#[cfg(feature = "io_ext")]
pub mod io_ext;

/// Converts a 4-byte string into a 32-bit little endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! rtag4 {
	($b4: literal) => {
		u32::from_le_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Converts a 4-byte string into a 32-bit big endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! tag4 {
	($b4: literal) => {
		u32::from_be_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Number of bytes needed to bring `len` up to the next multiple of 4
pub const fn padding_for(len: usize) -> usize {
	(4 - (len % 4)) % 4
}

/// Rounds `len` up to the next multiple of 4
pub const fn align4(len: usize) -> usize {
	len + padding_for(len)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_tags() {
		assert_eq!(rtag4!(b"glTF"), 0x46546C67);
		assert_eq!(rtag4!(b"JSON"), 0x4E4F534A);
		assert_eq!(rtag4!(b"BIN\x00"), 0x004E4942);
		assert_eq!(tag4!(b"glTF"), 0x676C5446);
	}

	#[test]
	fn test_align() {
		assert_eq!(padding_for(0), 0);
		assert_eq!(padding_for(5), 3);
		assert_eq!(padding_for(8), 0);
		assert_eq!(align4(13), 16);
		assert_eq!(align4(16), 16);
	}
}
