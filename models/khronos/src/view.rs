use json::JsonValue;
use std::io;
use thiserror::Error;

#[cfg(feature = "export")]
use crate::glb::GLBExportError;
#[cfg(feature = "import")]
use crate::glb::GLBImportError;

/// A validated byte range of the binary chunk
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViewRange {
	pub index: usize,
	pub offset: usize,
	pub length: usize,
	pub stride: Option<usize>,
}

impl ViewRange {
	/// Borrows `length` bytes starting `offset` bytes into the view
	pub fn read<'a>(&self, bin: &'a [u8], offset: usize, length: usize) -> Result<&'a [u8], TranscodeError> {
		let out_of_bounds = || TranscodeError::OutOfBounds {
			view: self.index,
			offset: offset,
			length: length,
			available: self.length,
		};

		let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
		if end > self.length {
			return Err(out_of_bounds());
		}

		bin.get(self.offset + offset..self.offset + end).ok_or_else(out_of_bounds)
	}
}

/// Reads an optional index or byte count. Only an absent key falls back to `None`; a
/// present value that is not a non-negative integer is an error.
pub fn optional_usize(value: &JsonValue, key: &str, error: TranscodeError) -> Result<Option<usize>, TranscodeError> {
	let field = &value[key];
	if field.is_null() {
		return Ok(None);
	}

	field.as_usize().map(Some).ok_or(error)
}

/// Resolves `bufferViews[index]` against a binary chunk of `bin_len` bytes.
///
/// Only views into the container's own buffer can be resolved; a buffer with a `uri`
/// lives outside the container.
pub fn buffer_view(document: &JsonValue, index: usize, bin_len: usize) -> Result<ViewRange, TranscodeError> {
	let view = &document["bufferViews"][index];
	if !view.is_object() {
		return Err(TranscodeError::BufferView(index));
	}

	let buffer_index = view["buffer"].as_usize().ok_or(TranscodeError::BufferView(index))?;
	let buffer = &document["buffers"][buffer_index];
	if !buffer.is_object() {
		return Err(TranscodeError::Buffer(buffer_index));
	}
	if !buffer["uri"].is_null() {
		return Err(TranscodeError::ExternalBuffer(buffer_index));
	}

	let offset = optional_usize(view, "byteOffset", TranscodeError::BufferView(index))?.unwrap_or(0);
	let length = view["byteLength"].as_usize().ok_or(TranscodeError::BufferView(index))?;
	if offset.checked_add(length).map_or(true, |end| end > bin_len) {
		return Err(TranscodeError::OutOfBounds {
			view: index,
			offset: offset,
			length: length,
			available: bin_len,
		});
	}

	let stride = optional_usize(view, "byteStride", TranscodeError::BufferView(index))?;

	Ok(ViewRange {
		index: index,
		offset: offset,
		length: length,
		stride: stride.filter(|&s| s > 0),
	})
}

#[derive(Debug, Error)]
pub enum TranscodeError {
	#[cfg(feature = "import")]
	#[error("Container import error")]
	Import {
		#[from]
		source: GLBImportError,
	},
	#[cfg(feature = "export")]
	#[error("Container export error")]
	Export {
		#[from]
		source: GLBExportError,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Document structure error")]
	Json {
		#[from]
		source: json::Error,
	},
	#[error("Buffer view {0} is missing or malformed")]
	BufferView(usize),
	#[error("Buffer {0} is missing or malformed")]
	Buffer(usize),
	#[error("Buffer {0} is not stored in the binary chunk")]
	ExternalBuffer(usize),
	#[error("Accessor {0} is missing or malformed")]
	Accessor(usize),
	#[error("Image {0} is missing or malformed")]
	Image(usize),
	#[error("Buffer view {view}: {length} bytes at offset {offset} exceed the {available} bytes available")]
	OutOfBounds {
		view: usize,
		offset: usize,
		length: usize,
		available: usize,
	},
	#[error("Unsupported component type: {0}")]
	ComponentType(u64),
	#[error("Unsupported accessor type: {0}")]
	AccessorType(String),
	#[error("Accessor {accessor}: sparse index {index} is outside of its {count} elements")]
	SparseIndex {
		accessor: usize,
		index: usize,
		count: usize,
	},
	#[error("Accessor {accessor}: sparse indices are not strictly increasing at position {position}")]
	UnsortedSparse {
		accessor: usize,
		position: usize,
	},
}
