use byteorder::{
	LE,
	ReadBytesExt
};

use json::JsonValue;
use log::{
	debug,
	trace
};

use mk_core::{
	align4,
	io_ext::ReadBinExt
};

use crate::{
	glb::Glb,
	gltf::{
		AccessorType,
		AccessorValue,
		ComponentType
	},
	view::{
		buffer_view,
		optional_usize,
		TranscodeError
	}
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DensifyCfg {
	/// Reject sparse index lists that are not strictly increasing instead of letting
	/// the last entry for an index win.
	pub strict_indices: bool,
}

/// Element layout of one accessor
#[derive(Clone, Copy, Debug, PartialEq)]
struct Layout {
	kind: AccessorType,
	component: ComponentType,
	count: usize,
	element: usize,
}

impl Layout {
	fn read(accessor: &JsonValue, index: usize) -> Result<Layout, TranscodeError> {
		let component = accessor["componentType"].as_u64().ok_or(TranscodeError::Accessor(index))?;
		let component = ComponentType::from_u64(component).ok_or(TranscodeError::ComponentType(component))?;

		let kind = accessor["type"].as_str().ok_or(TranscodeError::Accessor(index))?;
		let kind: AccessorType = kind.parse().map_err(|_| TranscodeError::AccessorType(kind.to_string()))?;

		Ok(Layout {
			kind: kind,
			component: component,
			count: accessor["count"].as_usize().ok_or(TranscodeError::Accessor(index))?,
			element: kind.element_size(component),
		})
	}

	fn byte_length(&self, index: usize) -> Result<usize, TranscodeError> {
		self.count.checked_mul(self.element).ok_or(TranscodeError::Accessor(index))
	}
}

pub fn has_sparse_accessors(document: &JsonValue) -> bool {
	document["accessors"].members().any(|a| !a["sparse"].is_null())
}

/// Reads `count` sparse indices described by a `sparse.indices` object
fn read_indices(document: &JsonValue, bin: &[u8], indices: &JsonValue, count: usize, accessor: usize)
	-> Result<Vec<usize>, TranscodeError>
{
	let component = indices["componentType"].as_u64().ok_or(TranscodeError::Accessor(accessor))?;
	let kind = ComponentType::from_u64(component)
		.filter(|c| c.is_index())
		.ok_or(TranscodeError::ComponentType(component))?;

	let view_index = indices["bufferView"].as_usize().ok_or(TranscodeError::Accessor(accessor))?;
	let offset = optional_usize(indices, "byteOffset", TranscodeError::Accessor(accessor))?.unwrap_or(0);
	let length = count.checked_mul(kind.size()).ok_or(TranscodeError::Accessor(accessor))?;
	let mut data = buffer_view(document, view_index, bin.len())?.read(bin, offset, length)?;

	let mut out = Vec::with_capacity(count);
	for _ in 0..count {
		out.push(match kind {
			ComponentType::UInt8 => data.read_u8()? as usize,
			ComponentType::UInt16 => data.read_u16::<LE>()? as usize,
			_ => data.read_u32::<LE>()? as usize,
		});
	}

	Ok(out)
}

/// Materializes every element of `accessors[index]` as tightly packed bytes, applying the
/// sparse override if there is one.
fn dense_bytes(document: &JsonValue, bin: &[u8], index: usize, cfg: &DensifyCfg)
	-> Result<(Layout, Vec<u8>), TranscodeError>
{
	let accessor = &document["accessors"][index];
	if !accessor.is_object() {
		return Err(TranscodeError::Accessor(index));
	}

	let layout = Layout::read(accessor, index)?;
	let element = layout.element;
	let length = layout.byte_length(index)?;

	// the densified data has to fit in the container next to what is already there
	if bin.len().checked_add(length).map_or(true, |end| end > u32::MAX as usize) {
		return Err(TranscodeError::Accessor(index));
	}

	let base = match optional_usize(accessor, "bufferView", TranscodeError::Accessor(index))? {
		Some(view_index) => {
			let view = buffer_view(document, view_index, bin.len())?;
			let offset = optional_usize(accessor, "byteOffset", TranscodeError::Accessor(index))?.unwrap_or(0);
			let stride = view.stride.unwrap_or(element);

			// bytes from the first element to the end of the last one
			let span = match layout.count.checked_sub(1) {
				Some(last) => last.checked_mul(stride).and_then(|s| s.checked_add(element)),
				None => Some(0),
			};
			let span = span.ok_or(TranscodeError::Accessor(index))?;

			Some((view.read(bin, offset, span)?, stride))
		},
		None => None,
	};

	// seed with the base view; without one every element starts out zeroed
	let mut dense = vec![0; length];
	match base {
		Some((source, stride)) if stride != element => {
			for (i, out) in dense.chunks_exact_mut(element).enumerate() {
				out.copy_from_slice(&source[i * stride..i * stride + element]);
			}
		},
		Some((source, _)) => dense.copy_from_slice(source),
		None => {},
	}

	let sparse = &accessor["sparse"];
	if sparse.is_null() {
		return Ok((layout, dense));
	}

	let count = sparse["count"].as_usize().ok_or(TranscodeError::Accessor(index))?;
	let indices = read_indices(document, bin, &sparse["indices"], count, index)?;

	let values = &sparse["values"];
	let view_index = values["bufferView"].as_usize().ok_or(TranscodeError::Accessor(index))?;
	let offset = optional_usize(values, "byteOffset", TranscodeError::Accessor(index))?.unwrap_or(0);
	let length = count.checked_mul(element).ok_or(TranscodeError::Accessor(index))?;
	let values = buffer_view(document, view_index, bin.len())?.read(bin, offset, length)?;

	for (position, (&target, value)) in indices.iter().zip(values.chunks_exact(element)).enumerate() {
		if target >= layout.count {
			return Err(TranscodeError::SparseIndex {
				accessor: index,
				index: target,
				count: layout.count,
			});
		}
		if cfg.strict_indices && position > 0 && indices[position - 1] >= target {
			return Err(TranscodeError::UnsortedSparse {
				accessor: index,
				position: position,
			});
		}

		dense[target * element..(target + 1) * element].copy_from_slice(value);
	}

	trace!("accessor {}: {} sparse of {} {} elements", index, count, layout.count, layout.kind);

	Ok((layout, dense))
}

/// Rewrites every sparse accessor as a dense one.
///
/// Dense data is appended to the binary chunk as new buffer views (4-byte aligned);
/// existing views keep their indices. A container without sparse accessors comes back
/// unchanged.
pub fn densify(glb: &Glb, cfg: &DensifyCfg) -> Result<Glb, TranscodeError> {
	if !has_sparse_accessors(&glb.document) {
		debug!("no sparse accessors to densify");
		return Ok(glb.clone());
	}

	let source = glb.bin.as_deref().unwrap_or_default();
	let mut document = glb.document.clone();
	let mut bin = source.to_vec();
	let mut expanded = 0;

	for index in 0..document["accessors"].len() {
		if document["accessors"][index]["sparse"].is_null() {
			continue;
		}

		let (_, dense) = dense_bytes(&document, source, index, cfg)?;

		let offset = align4(bin.len());
		bin.resize(offset, 0);
		bin.extend_from_slice(&dense);

		let mut view = JsonValue::new_object();
		view["buffer"] = 0.into();
		view["byteOffset"] = offset.into();
		view["byteLength"] = dense.len().into();

		if !document["bufferViews"].is_array() {
			document["bufferViews"] = JsonValue::new_array();
		}
		let view_index = document["bufferViews"].len();
		document["bufferViews"].push(view)?;

		let accessor = &mut document["accessors"][index];
		accessor["bufferView"] = view_index.into();
		accessor["byteOffset"] = 0.into();
		accessor.remove("sparse");

		expanded += 1;
	}

	if document["buffers"].is_empty() {
		document["buffers"] = JsonValue::new_array();
		document["buffers"].push(JsonValue::new_object())?;
	}
	document["buffers"][0]["byteLength"] = bin.len().into();

	debug!("densified {} accessors, binary chunk now {} bytes", expanded, bin.len());

	Ok(Glb::new(document, Some(bin)))
}

/// Decodes a float accessor element-wise, applying its sparse override if present
pub fn read_accessor(glb: &Glb, index: usize) -> Result<Vec<AccessorValue>, TranscodeError> {
	let bin = glb.bin.as_deref().unwrap_or_default();
	let (layout, dense) = dense_bytes(&glb.document, bin, index, &DensifyCfg::default())?;
	if layout.component != ComponentType::Float {
		return Err(TranscodeError::ComponentType(layout.component as u64));
	}

	let mut data = &dense[..];
	let mut out = Vec::with_capacity(layout.count);
	for _ in 0..layout.count {
		out.push(match layout.kind {
			AccessorType::Scalar => AccessorValue::Scalar(data.read_f32::<LE>()?),
			AccessorType::Vec2 => AccessorValue::Vector2(data.read_vec2_le()?),
			AccessorType::Vec3 => AccessorValue::Vector3(data.read_vec3_le()?),
			AccessorType::Vec4 => AccessorValue::Vector4(data.read_vec4_le()?),
			kind => return Err(TranscodeError::AccessorType(kind.to_string())),
		});
	}

	Ok(out)
}
