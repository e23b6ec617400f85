use json::JsonValue;
use log::{
	debug,
	trace
};

use mime::Mime;
use std::collections::HashSet;

use crate::{
	glb::Glb,
	gltf2::TextureSlot,
	view::{
		buffer_view,
		TranscodeError
	}
};

/// Largest multiple of 3 that fits in 8 KiB, so no chunk but the last one produces padding
const BASE64_CHUNK: usize = 8190;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelocateMode {
	/// Move embedded image bytes into `data:` URIs
	Inline,
	/// Drop embedded images and detach the material channels that used them
	Strip,
}

/// Indices of images stored in a buffer view rather than behind a URI
pub fn embedded_images(document: &JsonValue) -> Vec<usize> {
	document["images"].members()
		.enumerate()
		.filter(|(_, image)| !image["bufferView"].is_null() && image["uri"].is_null())
		.map(|(i, _)| i)
		.collect()
}

/// Builds a `data:<media type>;base64,<payload>` URI
pub fn data_uri(media_type: &str, data: &[u8]) -> String {
	let mut uri = format!("data:{};base64,", media_type);
	uri.reserve((data.len() + 2) / 3 * 4);

	for chunk in data.chunks(BASE64_CHUNK) {
		base64::encode_config_buf(chunk, base64::STANDARD, &mut uri);
	}

	uri
}

/// Splits a base64 `data:` URI into its media type and decoded payload
pub fn decode_data_uri(uri: &str) -> Option<(Mime, Vec<u8>)> {
	let (mime, payload) = uri.strip_prefix("data:")?.split_once(";base64,")?;

	Some((mime.parse().ok()?, base64::decode(payload).ok()?))
}

/// The image's `mimeType` exactly as written, as long as it is a valid media type
fn image_mime(image: &JsonValue) -> String {
	match image["mimeType"].as_str() {
		Some(text) if text.parse::<Mime>().is_ok() => text.to_string(),
		other => {
			debug!("image mime type {:?} unusable, falling back to octet-stream", other);
			mime::APPLICATION_OCTET_STREAM.to_string()
		},
	}
}

fn inline_images(document: &mut JsonValue, bin: &[u8], embedded: &[usize]) -> Result<(), TranscodeError> {
	for &index in embedded {
		let image = &document["images"][index];
		let view_index = image["bufferView"].as_usize().ok_or(TranscodeError::Image(index))?;
		let view = buffer_view(document, view_index, bin.len())?;
		let uri = data_uri(&image_mime(image), view.read(bin, 0, view.length)?);

		trace!("image {}: inlined {} bytes from view {}", index, view.length, view_index);

		let image = &mut document["images"][index];
		image["uri"] = uri.into();
		image.remove("bufferView");
	}

	Ok(())
}

/// Removes the slot's texture reference if it points at one of `textures`.
/// Returns whether anything was removed.
fn detach_slot(material: &mut JsonValue, slot: TextureSlot, textures: &HashSet<usize>) -> bool {
	let (key, parents) = match slot.path().split_last() {
		Some(split) => split,
		None => return false,
	};

	let mut parent = material;
	for p in parents {
		if !parent[*p].is_object() {
			return false;
		}
		parent = &mut parent[*p];
	}

	match parent[*key]["index"].as_usize() {
		Some(texture) if textures.contains(&texture) => {
			parent.remove(key);
			true
		},
		_ => false,
	}
}

fn strip_images(document: &mut JsonValue, embedded: &[usize]) {
	let embedded: HashSet<usize> = embedded.iter().copied().collect();
	let affected: HashSet<usize> = document["textures"].members()
		.enumerate()
		.filter(|(_, texture)| texture["source"].as_usize().map_or(false, |s| embedded.contains(&s)))
		.map(|(i, _)| i)
		.collect();

	let mut detached = 0;
	for material in document["materials"].members_mut() {
		for slot in TextureSlot::ALL {
			if detach_slot(material, slot, &affected) {
				detached += 1;
			}
		}
	}

	for &index in embedded.iter() {
		// keep the entry so later image indices stay valid
		let mut placeholder = JsonValue::new_object();
		placeholder["name"] = format!("stripped_{}", index).into();
		document["images"][index] = placeholder;
	}

	debug!("stripped {} images, detached {} material slots from {} textures", embedded.len(), detached,
		affected.len());
}

/// Relocates every embedded image according to `mode`.
///
/// Images that already use a URI are left alone, as is the binary chunk. A container
/// without embedded images comes back unchanged.
pub fn relocate(glb: &Glb, mode: RelocateMode) -> Result<Glb, TranscodeError> {
	let embedded = embedded_images(&glb.document);
	if embedded.is_empty() {
		debug!("no embedded images to relocate");
		return Ok(glb.clone());
	}

	let mut document = glb.document.clone();
	match mode {
		RelocateMode::Inline => inline_images(&mut document, glb.bin.as_deref().unwrap_or_default(), &embedded)?,
		RelocateMode::Strip => strip_images(&mut document, &embedded),
	}

	Ok(Glb::new(document, glb.bin.clone()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn glb() -> Glb {
		let document = json::parse(r#"{
			"buffers": [{"byteLength": 12}],
			"bufferViews": [
				{"buffer": 0, "byteOffset": 0, "byteLength": 5},
				{"buffer": 0, "byteOffset": 8, "byteLength": 4}
			],
			"images": [
				{"bufferView": 0, "mimeType": "image/png"},
				{"uri": "skin.jpg"},
				{"bufferView": 1}
			],
			"textures": [{"source": 0}, {"source": 1}, {"source": 2}, {"source": 0}],
			"materials": [
				{
					"name": "body",
					"pbrMetallicRoughness": {
						"baseColorTexture": {"index": 0},
						"metallicRoughnessTexture": {"index": 1},
						"metallicFactor": 0.5
					},
					"normalTexture": {"index": 3, "scale": 1.0},
					"occlusionTexture": {"index": 1},
					"emissiveTexture": {"index": 2}
				},
				{"name": "plain", "pbrMetallicRoughness": {"baseColorFactor": [1, 1, 1, 1]}}
			]
		}"#).unwrap();

		Glb::new(document, Some(vec![0x89, b'P', b'N', b'G', 0x0d, 0, 0, 0, 1, 2, 3, 4]))
	}

	#[test]
	fn test_data_uri() {
		assert_eq!(data_uri("image/png", b"hello"), "data:image/png;base64,aGVsbG8=");
		assert_eq!(data_uri("image/png", b""), "data:image/png;base64,");

		let (mime, data) = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
		assert_eq!(mime, mime::IMAGE_PNG);
		assert_eq!(data, b"hello");
		assert_eq!(decode_data_uri("textures/skin.png"), None);
		assert_eq!(decode_data_uri("data:image/png;base64,!!!"), None);
	}

	#[test]
	fn test_chunked_encoding_matches_whole() {
		let data: Vec<u8> = (0..50_000u32).map(|i| (i * 31 % 251) as u8).collect();
		let uri = data_uri(mime::IMAGE_JPEG.as_ref(), &data);
		assert_eq!(uri, format!("data:image/jpeg;base64,{}", base64::encode(&data)));
	}

	#[test]
	fn test_embedded_images() {
		assert_eq!(embedded_images(&glb().document), vec![0, 2]);
		assert!(embedded_images(&JsonValue::new_object()).is_empty());
	}

	#[test]
	fn test_inline() {
		let source = glb();
		let out = relocate(&source, RelocateMode::Inline).unwrap();
		let images = &out.document["images"];

		assert_eq!(images[0]["uri"], "data:image/png;base64,iVBORw0=");
		assert!(images[0]["bufferView"].is_null());
		assert_eq!(images[1], source.document["images"][1]);
		assert_eq!(images[2]["uri"], "data:application/octet-stream;base64,AQIDBA==");

		assert_eq!(out.document["materials"], source.document["materials"]);
		assert_eq!(out.bin, source.bin);
	}

	#[test]
	fn test_inline_keeps_mime_type_text() {
		let mut source = glb();
		source.document["images"][0]["mimeType"] = "image/PNG".into();
		source.document["images"][2]["mimeType"] = "not a type".into();
		let out = relocate(&source, RelocateMode::Inline).unwrap();

		assert_eq!(out.document["images"][0]["uri"], "data:image/PNG;base64,iVBORw0=");
		assert_eq!(out.document["images"][2]["uri"], "data:application/octet-stream;base64,AQIDBA==");
	}

	#[test]
	fn test_strip() {
		let source = glb();
		let out = relocate(&source, RelocateMode::Strip).unwrap();
		let images = &out.document["images"];

		assert_eq!(images.len(), 3);
		assert_eq!(images[0].dump(), r#"{"name":"stripped_0"}"#);
		assert_eq!(images[1], source.document["images"][1]);
		assert_eq!(images[2].dump(), r#"{"name":"stripped_2"}"#);

		let body = &out.document["materials"][0];
		assert!(!body["pbrMetallicRoughness"].has_key("baseColorTexture"));
		assert_eq!(body["pbrMetallicRoughness"]["metallicRoughnessTexture"]["index"], 1);
		assert_eq!(body["pbrMetallicRoughness"]["metallicFactor"].dump(), "0.5");
		assert!(!body.has_key("normalTexture"));
		assert_eq!(body["occlusionTexture"]["index"], 1);
		assert!(!body.has_key("emissiveTexture"));

		assert_eq!(out.document["materials"][1], source.document["materials"][1]);
		assert_eq!(out.document["textures"], source.document["textures"]);
	}

	#[test]
	fn test_inline_bad_view() {
		let mut source = glb();
		source.document["bufferViews"][1]["byteLength"] = 40.into();
		assert!(matches!(relocate(&source, RelocateMode::Inline),
			Err(TranscodeError::OutOfBounds { view: 1, .. })));

		// strip never reads image bytes
		assert!(relocate(&source, RelocateMode::Strip).is_ok());
	}

	#[test]
	fn test_no_embedded_images() {
		let mut source = glb();
		source.document["images"] = json::parse(r#"[{"uri": "a.png"}]"#).unwrap();
		assert_eq!(relocate(&source, RelocateMode::Strip).unwrap(), source);
		assert_eq!(relocate(&source, RelocateMode::Inline).unwrap(), source);
	}
}
