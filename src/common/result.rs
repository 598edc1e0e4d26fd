use crate::common::error::PublisherError;
use std::path::Path;

/// Result alias used throughout the publisher.
///
/// # Examples
///
/// ```
/// use publisher::common::result::PublisherResult;
/// use publisher::common::error::PublisherError;
///
/// fn lookup(found: bool) -> PublisherResult<&'static str> {
///     if found {
///         Ok("gh-pages")
///     } else {
///         Err(PublisherError::config_error("no such target", None))
///     }
/// }
///
/// assert!(lookup(true).is_ok());
/// assert!(lookup(false).is_err());
/// ```
pub type PublisherResult<T> = Result<T, PublisherError>;

/// Conversions from `Option` into [`PublisherResult`].
pub trait OptionExt<T> {
    /// Turn `None` into a configuration error.
    ///
    /// ```
    /// use publisher::common::result::{OptionExt, PublisherResult};
    ///
    /// let missing: Option<u8> = None;
    /// let result: PublisherResult<u8> = missing.ok_or_config_error("prod is not a valid deployment target");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_config_error(self, message: impl Into<String>) -> PublisherResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_config_error(self, message: impl Into<String>) -> PublisherResult<T> {
        self.ok_or_else(|| PublisherError::config_error(message, None))
    }
}

/// Attach file system context to I/O results.
pub trait ResultExt<T> {
    /// Wrap the error as a [`PublisherError::FileSystemError`] for `path`.
    ///
    /// ```
    /// use publisher::common::result::{PublisherResult, ResultExt};
    /// use std::path::Path;
    ///
    /// let result: Result<(), std::io::Error> = Err(std::io::Error::new(
    ///     std::io::ErrorKind::NotFound, "gone"
    /// ));
    /// let wrapped: PublisherResult<()> = result.with_filesystem_error("failed to remove", Path::new("dist"));
    /// assert!(wrapped.unwrap_err().to_string().contains("failed to remove"));
    /// ```
    fn with_filesystem_error(self, message: impl Into<String>, path: &Path) -> PublisherResult<T>;
}

impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn with_filesystem_error(self, message: impl Into<String>, path: &Path) -> PublisherResult<T> {
        self.map_err(|e| {
            PublisherError::filesystem_error_with_source(
                format!("{} {}", message.into(), path.display()),
                Some(path.to_path_buf()),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_option_ext_ok_or_config_error() {
        let some_value = Some("prod".to_string());
        assert_eq!(some_value.ok_or_config_error("missing").unwrap(), "prod");

        let none_value: Option<String> = None;
        let result = none_value.ok_or_config_error("staging is not a valid deployment target");
        if let Err(PublisherError::ConfigError { message, .. }) = result {
            assert_eq!(message, "staging is not a valid deployment target");
        } else {
            panic!("Expected ConfigError");
        }
    }

    #[test]
    fn test_result_ext_with_filesystem_error_keeps_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let result: Result<(), std::io::Error> = Err(io_error);

        let wrapped = result.with_filesystem_error("failed to remove", Path::new("/tmp/site/a"));
        match wrapped {
            Err(PublisherError::FileSystemError { message, path, .. }) => {
                assert_eq!(message, "failed to remove /tmp/site/a");
                assert_eq!(path, Some(PathBuf::from("/tmp/site/a")));
            }
            other => panic!("Expected FileSystemError, got {:?}", other),
        }
    }
}
