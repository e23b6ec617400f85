use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use json::JsonValue;
use log::{
	debug,
	trace
};

use std::{
	io::{
		self,
		Read
	},
	str::{
		from_utf8,
		Utf8Error
	}
};

use thiserror::Error;

use mk_core::{
	align4,
	io_ext::WriteBinExt,
	rtag4
};

pub const MAGIC: u32 = rtag4!(b"glTF");
pub const VERSION: u32 = 2;
pub const HEADER_SIZE: usize = 12;
pub const CHUNK_HEADER_SIZE: usize = 8;

const CHUNK_JSON: u32 = rtag4!(b"JSON");
const CHUNK_BIN: u32 = rtag4!(b"BIN\x00");

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	pub magic: u32,
	pub version: u32,
	pub size: u32,
}

impl Header {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, GLBImportError>
	where
		R: ReadBytesExt,
	{
		let magic = buf.read_u32::<LE>()?;
		if magic != MAGIC {
			return Err(GLBImportError::Magic(magic));
		}

		let version = buf.read_u32::<LE>()?;
		if version != VERSION {
			return Err(GLBImportError::Version(version));
		}

		Ok(Header {
			magic: magic,
			version: version,
			size: buf.read_u32::<LE>()?,
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u32::<LE>(self.magic)?;
		buf.write_u32::<LE>(self.version)?;
		buf.write_u32::<LE>(self.size)
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChunkType {
	Binary,
	Json,
	Unknown(u32),
}

impl From<u32> for ChunkType {
	fn from(tag: u32) -> ChunkType {
		match tag {
			CHUNK_BIN => ChunkType::Binary,
			CHUNK_JSON => ChunkType::Json,
			other => ChunkType::Unknown(other),
		}
	}
}

impl From<ChunkType> for u32 {
	fn from(kind: ChunkType) -> u32 {
		match kind {
			ChunkType::Binary => CHUNK_BIN,
			ChunkType::Json => CHUNK_JSON,
			ChunkType::Unknown(tag) => tag,
		}
	}
}

/// A chunk borrowed from a container buffer. `data` excludes the 8-byte chunk header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chunk<'a> {
	pub offset: usize,
	pub size: u32,
	pub kind: ChunkType,
	pub data: &'a [u8],
}

impl<'a> Chunk<'a> {
	#[cfg(feature = "import")]
	fn read(container: &'a [u8], offset: usize) -> Result<Chunk<'a>, GLBImportError> {
		let mut buf = match container.get(offset..) {
			Some(rest) if rest.len() >= CHUNK_HEADER_SIZE => rest,
			_ => return Err(GLBImportError::Truncated {
				offset: offset,
				length: CHUNK_HEADER_SIZE,
			}),
		};

		let size = buf.read_u32::<LE>()?;
		let kind = ChunkType::from(buf.read_u32::<LE>()?);
		let data = buf.get(..size as usize).ok_or(GLBImportError::Truncated {
			offset: offset,
			length: CHUNK_HEADER_SIZE + size as usize,
		})?;

		trace!("chunk {:?} at offset {}, {} bytes", kind, offset, size);

		Ok(Chunk {
			offset: offset,
			size: size,
			kind: kind,
			data: data,
		})
	}
}

/// Sequential walk over the chunk table of a validated container.
///
/// Each chunk advances the cursor by exactly `8 + length`; the length field is trusted
/// to already include whatever padding the producer wrote. The iterator stops after
/// the first malformed chunk.
#[cfg(feature = "import")]
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
	container: &'a [u8],
	offset: usize,
}

#[cfg(feature = "import")]
impl<'a> Iterator for Chunks<'a> {
	type Item = Result<Chunk<'a>, GLBImportError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.offset >= self.container.len() {
			return None;
		}

		match Chunk::read(self.container, self.offset) {
			Ok(chunk) => {
				self.offset += CHUNK_HEADER_SIZE + chunk.data.len();
				Some(Ok(chunk))
			},
			Err(e) => {
				self.offset = self.container.len();
				Some(Err(e))
			},
		}
	}
}

/// Validates the container header and returns an iterator over its chunks
#[cfg(feature = "import")]
pub fn chunks(data: &[u8]) -> Result<Chunks<'_>, GLBImportError> {
	if data.len() < HEADER_SIZE {
		// too short to even hold a header; only report truncation for things that look like GLB
		return Err(if data.starts_with(b"glTF") {
			GLBImportError::Truncated {
				offset: 0,
				length: HEADER_SIZE,
			}
		} else {
			GLBImportError::Magic(0)
		});
	}

	let header = Header::read(&mut &data[..HEADER_SIZE])?;
	if header.size as usize != data.len() {
		return Err(GLBImportError::Length {
			header: header.size,
			actual: data.len(),
		});
	}

	Ok(Chunks {
		container: data,
		offset: HEADER_SIZE,
	})
}

/// A decoded container: the JSON chunk as a document tree plus the optional binary chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct Glb {
	pub document: JsonValue,
	pub bin: Option<Vec<u8>>,
}

impl Glb {
	pub fn new(document: JsonValue, bin: Option<Vec<u8>>) -> Glb {
		Glb {
			document: document,
			bin: bin,
		}
	}

	/// Decodes a container held in memory. The input is never modified.
	#[cfg(feature = "import")]
	pub fn from_slice(data: &[u8]) -> Result<Glb, GLBImportError> {
		let mut chunks = chunks(data)?;

		let first = chunks.next().ok_or(GLBImportError::NoChunks)??;
		if first.kind != ChunkType::Json {
			return Err(GLBImportError::FirstChunk(first.kind.into()));
		}

		let text = from_utf8(first.data)?.trim_end_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
		let document = json::parse(text)?;

		let bin = match chunks.next() {
			Some(Ok(chunk)) if chunk.kind == ChunkType::Binary => Some(chunk.data.to_vec()),
			Some(Ok(chunk)) => {
				debug!("ignoring non-binary second chunk {:?}", chunk.kind);
				None
			},
			Some(Err(e)) => return Err(e),
			None => None,
		};

		Ok(Glb {
			document: document,
			bin: bin,
		})
	}

	#[cfg(feature = "import")]
	pub fn read<R>(buf: &mut R) -> Result<Glb, GLBImportError>
	where
		R: Read,
	{
		let mut data = vec![];
		buf.read_to_end(&mut data)?;
		Glb::from_slice(&data)
	}

	/// Size of the encoded container in bytes, as stored in its header
	#[cfg(feature = "export")]
	fn encoded_size(json_len: usize, bin_len: Option<usize>) -> Result<u32, GLBExportError> {
		let size = HEADER_SIZE + CHUNK_HEADER_SIZE + align4(json_len) +
			bin_len.map_or(0, |len| CHUNK_HEADER_SIZE + align4(len));

		u32::try_from(size).map_err(|_| GLBExportError::TooLarge(size))
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> Result<(), GLBExportError>
	where
		W: WriteBytesExt,
	{
		let text = self.document.dump();
		let bin = self.bin.as_deref();

		let size = Glb::encoded_size(text.len(), bin.map(<[u8]>::len))?;

		Header {
			magic: MAGIC,
			version: VERSION,
			size: size,
		}.write(buf)?;

		buf.write_u32::<LE>(align4(text.len()) as u32)?;
		buf.write_u32::<LE>(CHUNK_JSON)?;
		buf.write_padded(text.as_bytes(), b' ')?;

		if let Some(bin) = bin {
			buf.write_u32::<LE>(align4(bin.len()) as u32)?;
			buf.write_u32::<LE>(CHUNK_BIN)?;
			buf.write_padded(bin, 0)?;
		}

		Ok(())
	}

	#[cfg(feature = "export")]
	pub fn to_vec(&self) -> Result<Vec<u8>, GLBExportError> {
		let mut out = vec![];
		self.write(&mut out)?;

		Ok(out)
	}
}

#[cfg(feature = "import")]
#[derive(Debug, Error)]
pub enum GLBImportError {
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Not a glTF container: {0:X}")]
	Magic(u32),
	#[error("Unsupported glTF container version: {0}")]
	Version(u32),
	#[error("Container length mismatch: header says {header} bytes, buffer holds {actual}")]
	Length {
		header: u32,
		actual: usize,
	},
	#[error("Chunk at offset {offset} needs {length} bytes past the end of the container")]
	Truncated {
		offset: usize,
		length: usize,
	},
	#[error("Container holds no chunks")]
	NoChunks,
	#[error("First chunk is not JSON: {0:X}")]
	FirstChunk(u32),
	#[error("JSON chunk is not valid UTF-8")]
	Utf8 {
		#[from]
		source: Utf8Error,
	},
	#[error("JSON chunk parsing error")]
	Json {
		#[from]
		source: json::Error,
	},
}

#[cfg(feature = "import")]
impl GLBImportError {
	/// Whether the input simply is not a glTF container, as opposed to a broken one.
	/// Speculative callers hand such input back untouched.
	pub fn is_passthrough(&self) -> bool {
		matches!(self, GLBImportError::Magic(_) | GLBImportError::Version(_) |
			GLBImportError::FirstChunk(_))
	}
}

#[cfg(feature = "export")]
#[derive(Debug, Error)]
pub enum GLBExportError {
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Container of {0} bytes does not fit a 32-bit length")]
	TooLarge(usize),
}
