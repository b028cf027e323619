//! Storage names for generated artifacts.
//!
//! The hash strategy shards names the way content-addressed stores do:
//! `{cache_dir}/{hex[0..2]}/{hex[2..4]}/{hex}{ext}`.

use serde::{Deserialize, Serialize};

const SHORT_HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Namer {
    /// `{cache_dir}/{source path without extension}/{hash32}{ext}`
    #[default]
    SourceNameAsPath,
    /// `{cache_dir}/{hex[0..2]}/{hex[2..4]}/{hex}{ext}`
    Hash,
}

impl Namer {
    /// Storage name for the artifact of `generator_id` over `source_name`.
    ///
    /// `extension` includes the leading dot; `None` reuses the source's.
    pub fn name(
        &self,
        cache_dir: &str,
        generator_id: &str,
        source_name: &str,
        extension: Option<&str>,
    ) -> String {
        let (stem_path, source_ext) = split_extension(source_name);
        let ext = extension.unwrap_or(source_ext);
        let digest = artifact_digest(generator_id, source_name);
        let cache_dir = cache_dir.trim_matches('/');

        let relative = match self {
            Namer::SourceNameAsPath => format!(
                "{}/{}{}",
                stem_path,
                &digest[..SHORT_HASH_LEN],
                ext
            ),
            Namer::Hash => format!("{}/{}/{}{}", &digest[0..2], &digest[2..4], digest, ext),
        };

        if cache_dir.is_empty() {
            relative
        } else {
            format!("{}/{}", cache_dir, relative)
        }
    }
}

/// blake3 over the generator id and source name, hex-encoded.
pub fn artifact_digest(generator_id: &str, source_name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(generator_id.as_bytes());
    hasher.update(&[0u8]);
    hasher.update(source_name.as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

/// Split `photos/a.jpg` into (`photos/a`, `.jpg`). The extension only comes
/// from the final path segment; leading dots are not extensions.
fn split_extension(name: &str) -> (&str, &str) {
    let name = name.trim_start_matches('/');
    let file_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => name.split_at(file_start + dot),
        _ => (name, ""),
    }
}
