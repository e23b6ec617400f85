use std::{
	fmt,
	str::FromStr
};

use ultraviolet::vec::{
	Vec2,
	Vec3,
	Vec4
};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AccessorValue {
	Scalar(f32),
	Vector2(Vec2),
	Vector3(Vec3),
	Vector4(Vec4),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ComponentType {
	Int8 = 5120,
	UInt8,
	Int16,
	UInt16,
	UInt32 = 5125,
	Float,
}

impl ComponentType {
	pub fn from_u64(value: u64) -> Option<ComponentType> {
		match value {
			5120 => Some(ComponentType::Int8),
			5121 => Some(ComponentType::UInt8),
			5122 => Some(ComponentType::Int16),
			5123 => Some(ComponentType::UInt16),
			5125 => Some(ComponentType::UInt32),
			5126 => Some(ComponentType::Float),
			_ => None,
		}
	}

	/// Size of a single component in bytes
	pub const fn size(self) -> usize {
		match self {
			ComponentType::Int8 | ComponentType::UInt8 => 1,
			ComponentType::Int16 | ComponentType::UInt16 => 2,
			ComponentType::UInt32 | ComponentType::Float => 4,
		}
	}

	/// Sparse index lists may only use the unsigned integer types
	pub const fn is_index(self) -> bool {
		matches!(self, ComponentType::UInt8 | ComponentType::UInt16 | ComponentType::UInt32)
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccessorType {
	Scalar,
	Vec2,
	Vec3,
	Vec4,
	Mat2,
	Mat3,
	Mat4,
}

impl AccessorType {
	pub const fn components(self) -> usize {
		match self {
			AccessorType::Scalar => 1,
			AccessorType::Vec2 => 2,
			AccessorType::Vec3 => 3,
			AccessorType::Vec4 | AccessorType::Mat2 => 4,
			AccessorType::Mat3 => 9,
			AccessorType::Mat4 => 16,
		}
	}

	/// Byte size of one element, including the column padding glTF requires
	/// for matrices of 1- and 2-byte components.
	pub const fn element_size(self, component: ComponentType) -> usize {
		match (self, component.size()) {
			(AccessorType::Mat2, 1) => 8,
			(AccessorType::Mat3, 1) => 12,
			(AccessorType::Mat3, 2) => 24,
			(kind, size) => kind.components() * size,
		}
	}
}

impl FromStr for AccessorType {
	type Err = ();

	fn from_str(s: &str) -> Result<AccessorType, ()> {
		match s {
			"SCALAR" => Ok(AccessorType::Scalar),
			"VEC2" => Ok(AccessorType::Vec2),
			"VEC3" => Ok(AccessorType::Vec3),
			"VEC4" => Ok(AccessorType::Vec4),
			"MAT2" => Ok(AccessorType::Mat2),
			"MAT3" => Ok(AccessorType::Mat3),
			"MAT4" => Ok(AccessorType::Mat4),
			_ => Err(()),
		}
	}
}

impl fmt::Display for AccessorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			AccessorType::Scalar => "SCALAR",
			AccessorType::Vec2 => "VEC2",
			AccessorType::Vec3 => "VEC3",
			AccessorType::Vec4 => "VEC4",
			AccessorType::Mat2 => "MAT2",
			AccessorType::Mat3 => "MAT3",
			AccessorType::Mat4 => "MAT4",
		})
	}
}
