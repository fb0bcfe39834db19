//! Path validation.
//!
//! Source paths come from configuration and listing paths come from remote
//! backends; neither is trusted to stay inside the backend root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns it normalized.
///
/// Paths may not escape the storage root (`..` past the root is rejected),
/// may not contain null bytes, and may not be empty once normalized.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use forge_storage::validate_path;
/// assert!(validate_path("assets/caves/rock.webp").is_ok());
/// assert!(validate_path("assets/../icons").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("/assets//./caves/../woods/").unwrap(),
///     Path::new("assets/woods")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate("icons/svg/dice.svg").unwrap(), Path::new("icons/svg/dice.svg"));
        assert_eq!(validate("rain.ogg").unwrap(), Path::new("rain.ogg"));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(validate("assets//caves").unwrap(), Path::new("assets/caves"));
        assert_eq!(validate("./assets/./caves/").unwrap(), Path::new("assets/caves"));
        assert_eq!(validate("/assets/caves").unwrap(), Path::new("assets/caves"));
        assert_eq!(validate("assets/caves/..").unwrap(), Path::new("assets"));
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(validate("../etc/passwd").is_err());
        assert!(validate("assets/../../etc").is_err());
        assert!(validate("..").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate("").is_err());
        assert!(validate(".").is_err());
        assert!(validate("//").is_err());
        assert!(validate("\0").is_err());
    }
}
