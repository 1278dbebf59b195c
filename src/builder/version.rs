//! Release version handling.
//!
//! Tags are compared with semver ordering after a lenient normalization
//! step, so `v2.4`, `2.4.0` and `2.5.1rc4` are all understood.

use semver::{Prerelease, Version};

use crate::core::errors::VersionError;

/// Strip one leading `v`/`V` from a tag.
pub fn normalize(version: &str) -> &str {
    match version.chars().next() {
        Some('v') | Some('V') => &version[1..],
        _ => version,
    }
}

/// Parse a tag or package version, allowing for incomplete versions.
///
/// Numbered pre-release identifiers are split so that they order
/// numerically: `rc10` is read as `rc.10` and sorts after `rc9`.
pub fn parse_version(raw: &str) -> Result<Version, VersionError> {
    let invalid = |reason: &str| VersionError {
        version: raw.to_string(),
        reason: reason.to_string(),
    };

    let s = normalize(raw.trim());
    if s.is_empty() {
        return Err(invalid("empty version"));
    }

    let mut version = match Version::parse(s) {
        Ok(v) => v,
        Err(_) => parse_lenient(s).map_err(|reason| invalid(&reason))?,
    };

    if !version.pre.is_empty() {
        let split = split_numbered(version.pre.as_str());
        version.pre = Prerelease::new(&split).map_err(|e| invalid(&e.to_string()))?;
    }

    Ok(version)
}

/// Pad a version with missing components and move a glued pre-release
/// (`1.2.3rc4`) behind a dash.
fn parse_lenient(s: &str) -> Result<Version, String> {
    let (core, suffix) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err("more than three numeric components".to_string());
    }

    let mut glued = String::new();
    if suffix.is_empty() {
        if let Some(last) = parts.last_mut() {
            if let Some(idx) = last.find(|c: char| !c.is_ascii_digit()) {
                if idx == 0 {
                    return Err("non-numeric component".to_string());
                }
                glued = format!("-{}", &last[idx..]);
                *last = &last[..idx];
            }
        }
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| "non-numeric component".to_string())?;
    }

    let padded = format!(
        "{}.{}.{}{}{}",
        numbers[0], numbers[1], numbers[2], glued, suffix
    );
    Version::parse(&padded).map_err(|e| e.to_string())
}

/// Split identifiers of the form `<letters><digits>` into two identifiers.
fn split_numbered(pre: &str) -> String {
    pre.split('.')
        .map(|ident| match ident.find(|c: char| c.is_ascii_digit()) {
            Some(idx)
                if idx > 0
                    && ident[..idx].chars().all(|c| c.is_ascii_alphabetic())
                    && ident[idx..].chars().all(|c| c.is_ascii_digit()) =>
            {
                match ident[idx..].parse::<u64>() {
                    Ok(n) => format!("{}.{}", &ident[..idx], n),
                    Err(_) => ident.to_string(),
                }
            }
            _ => ident.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Decide whether `candidate` is newer than `published`.
///
/// Nothing published always counts as newer.
pub fn is_newer(candidate: &str, published: Option<&str>) -> Result<bool, VersionError> {
    let Some(published) = published else {
        return Ok(true);
    };

    Ok(parse_version(candidate)? > parse_version(published)?)
}
