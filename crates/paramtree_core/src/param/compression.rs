use std::io::Read;

use crate::param::{ParamError, Result};

/// zstd frame magic.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Encoding detected for an image stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Plain JSON text.
	None,
	/// zstd-compressed JSON.
	Zstd,
}

impl Compression {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Detect the encoding of `raw` and return `(mode, json_bytes)`.
pub fn decode_bytes(raw: Vec<u8>, limit: usize) -> Result<(Compression, Vec<u8>)> {
	if looks_like_json(&raw) {
		return Ok((Compression::None, raw));
	}
	if raw.starts_with(&ZSTD_MAGIC) {
		return Ok((Compression::Zstd, decode_zstd(&raw, limit)?));
	}
	Err(ParamError::UnknownImageMagic { magic: first4(&raw) })
}

/// Encode JSON bytes with `mode`.
pub fn encode_bytes(json: Vec<u8>, mode: Compression, level: i32) -> Result<Vec<u8>> {
	match mode {
		Compression::None => Ok(json),
		Compression::Zstd => Ok(zstd::stream::encode_all(json.as_slice(), level)?),
	}
}

fn looks_like_json(raw: &[u8]) -> bool {
	raw.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'{')
}

fn decode_zstd(raw: &[u8], limit: usize) -> Result<Vec<u8>> {
	let mut decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	let mut chunk = [0_u8; 8192];
	loop {
		let read = decoder.read(&mut chunk)?;
		if read == 0 {
			break;
		}
		if out.len() + read > limit {
			return Err(ParamError::DecompressedTooLarge { limit });
		}
		out.extend_from_slice(&chunk[..read]);
	}

	if !looks_like_json(&out) {
		return Err(ParamError::UnknownImageMagic { magic: first4(&out) });
	}
	Ok(out)
}

fn first4(bytes: &[u8]) -> [u8; 4] {
	let mut magic = [0_u8; 4];
	let take = bytes.len().min(4);
	magic[..take].copy_from_slice(&bytes[..take]);
	magic
}
