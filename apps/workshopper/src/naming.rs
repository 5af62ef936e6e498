use rand_core::RngCore;
use url::Url;

use crate::Error;

/// Derive the repository name from a clone URL: the last path segment
/// with a trailing `.git` stripped.
pub fn repo_name_from_url(repo_url: &str) -> Result<String, Error> {
    let parsed = Url::parse(repo_url).map_err(|_| Error::InvalidRepoUrl(repo_url.to_string()))?;
    let name = parsed
        .path_segments()
        .and_then(|segments| segments.rev().find(|segment| !segment.is_empty()))
        .ok_or_else(|| Error::InvalidRepoUrl(repo_url.to_string()))?;
    Ok(name.strip_suffix(".git").unwrap_or(name).to_string())
}

/// Generate `n` cryptographically secure random bytes, hex-encoded.
/// Entropy exhaustion is fatal; there is no weaker fallback source.
pub fn random_hex(n: usize) -> Result<String, Error> {
    let mut bytes = vec![0u8; n];
    rand_core::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(Error::Entropy)?;
    Ok(hex::encode(bytes))
}
