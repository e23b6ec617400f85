/// Material channels that can hold a texture reference.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextureSlot {
	BaseColor,
	MetallicRoughness,
	Normal,
	Occlusion,
	Emissive,
}

impl TextureSlot {
	pub const ALL: [TextureSlot; 5] = [
		TextureSlot::BaseColor,
		TextureSlot::MetallicRoughness,
		TextureSlot::Normal,
		TextureSlot::Occlusion,
		TextureSlot::Emissive,
	];

	/// Object keys leading from a material to the slot's `textureInfo`
	pub const fn path(self) -> &'static [&'static str] {
		match self {
			TextureSlot::BaseColor => &["pbrMetallicRoughness", "baseColorTexture"],
			TextureSlot::MetallicRoughness => &["pbrMetallicRoughness", "metallicRoughnessTexture"],
			TextureSlot::Normal => &["normalTexture"],
			TextureSlot::Occlusion => &["occlusionTexture"],
			TextureSlot::Emissive => &["emissiveTexture"],
		}
	}
}
