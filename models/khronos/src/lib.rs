//! Binary glTF (GLB) transcoding.
//!
//! Every pass takes a decoded [`Glb`] and returns a new one; the input is never touched.
//! [`transcode`] strings the passes together over raw container bytes.

pub mod glb;
pub mod gltf;
pub mod gltf2;
pub mod image;
pub mod sparse;
pub mod view;

pub use glb::Glb;
pub use image::{
	RelocateMode,
	relocate
};
pub use sparse::{
	DensifyCfg,
	densify
};
pub use view::TranscodeError;

#[cfg(all(feature = "import", feature = "export"))]
use log::debug;

#[cfg(all(feature = "import", feature = "export"))]
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TranscodeCfg {
	/// What to do with images embedded in the binary chunk, if anything
	pub images: Option<RelocateMode>,
	pub densify: bool,
	pub densify_cfg: DensifyCfg,
}

impl Default for TranscodeCfg {
	fn default() -> Self {
		TranscodeCfg {
			images: None,
			densify: true,
			densify_cfg: DensifyCfg::default(),
		}
	}
}

/// Runs the configured passes over a container: image relocation first, then densification.
///
/// Input that is not a glTF container, or a container none of the passes would change,
/// is handed back as-is.
#[cfg(all(feature = "import", feature = "export"))]
pub fn transcode<'a>(input: &'a [u8], cfg: &TranscodeCfg) -> Result<Cow<'a, [u8]>, TranscodeError> {
	let mut glb = match Glb::from_slice(input) {
		Ok(glb) => glb,
		Err(e) if e.is_passthrough() => {
			debug!("passing {} bytes through: {}", input.len(), e);
			return Ok(Cow::Borrowed(input));
		},
		Err(e) => return Err(e.into()),
	};

	let relocating = cfg.images.is_some() && !image::embedded_images(&glb.document).is_empty();
	let densifying = cfg.densify && sparse::has_sparse_accessors(&glb.document);
	if !relocating && !densifying {
		debug!("nothing to transcode");
		return Ok(Cow::Borrowed(input));
	}

	if let Some(mode) = cfg.images {
		glb = relocate(&glb, mode)?;
	}
	if cfg.densify {
		glb = densify(&glb, &cfg.densify_cfg)?;
	}

	Ok(Cow::Owned(glb.to_vec()?))
}
