use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use std::io::{
	Read,
	Result,
	Write
};

use ultraviolet::vec::{
	Vec2,
	Vec3,
	Vec4
};

use crate::padding_for;

pub trait ReadBinExt: Read {
	/// Reads exactly `length` bytes into a new vector
	#[inline]
	fn read_vec_u8(&mut self, length: usize) -> Result<Vec<u8>> {
		let mut data = vec![0; length];
		self.read_exact(&mut data)?;

		Ok(data)
	}

	/// Reads a little endian 2D vector
	#[inline]
	fn read_vec2_le(&mut self) -> Result<Vec2> {
		Ok(Vec2::new(self.read_f32::<LE>()?, self.read_f32::<LE>()?))
	}

	/// Reads a little endian 3D vector
	#[inline]
	fn read_vec3_le(&mut self) -> Result<Vec3> {
		Ok(Vec3::new(self.read_f32::<LE>()?, self.read_f32::<LE>()?, self.read_f32::<LE>()?))
	}

	/// Reads a little endian 4D vector
	#[inline]
	fn read_vec4_le(&mut self) -> Result<Vec4> {
		Ok(Vec4::new(self.read_f32::<LE>()?, self.read_f32::<LE>()?, self.read_f32::<LE>()?,
			self.read_f32::<LE>()?))
	}
}

impl<R> ReadBinExt for R
where
	R: Read + ?Sized,
{
}

pub trait WriteBinExt: Write {
	/// Writes `data` followed by `pad` bytes up to the next 4-byte boundary.
	/// Returns the padded length.
	#[inline]
	fn write_padded(&mut self, data: &[u8], pad: u8) -> Result<usize> {
		self.write_all(data)?;

		let padding = padding_for(data.len());
		for _ in 0..padding {
			self.write_u8(pad)?;
		}

		Ok(data.len() + padding)
	}
}

impl<W> WriteBinExt for W
where
	W: Write + ?Sized,
{
}

#[cfg(test)]
mod tests {
	use ultraviolet::vec::{
		Vec2,
		Vec3,
		Vec4
	};

	use super::*;

	#[test]
	fn test_read_vec_u8() {
		let mut data = &b"glTF\x02\x00"[..];
		assert_eq!(b"glTF".to_vec(), data.read_vec_u8(4).unwrap());
		assert_eq!(data, &b"\x02\x00"[..]);
		assert!(data.read_vec_u8(4).is_err());
	}

	#[test]
	fn test_read_vecs() {
		let mut vec2: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d][..];
		let mut vec3: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d, 0xd4, 0xf1, 0xb6, 0x3d][..];
		let mut vec4: &[u8] = &[0x5c, 0x1f, 0x7f, 0x3c, 0xa4, 0xfb, 0xf0, 0x3d, 0xd4, 0xf1, 0xb6, 0x3d,
			0, 0xa0, 0xd9, 0xbd][..];
		assert_eq!(Vec2::new(0.0155714415, 0.117667466), vec2.read_vec2_le().unwrap());
		assert_eq!(Vec3::new(0.0155714415, 0.117667466, 0.089328438), vec3.read_vec3_le().unwrap());
		assert_eq!(Vec4::new(0.0155714415, 0.117667466, 0.089328438, -0.106262207), vec4.read_vec4_le().unwrap());
	}

	#[test]
	fn test_write_padded() {
		let mut out = vec![];
		assert_eq!(out.write_padded(b"{}", b' ').unwrap(), 4);
		assert_eq!(out.write_padded(&[1, 2, 3, 4, 5], 0).unwrap(), 8);
		assert_eq!(out, b"{}  \x01\x02\x03\x04\x05\x00\x00\x00".to_vec());
	}
}
