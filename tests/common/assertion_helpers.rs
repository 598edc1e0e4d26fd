//! Assertion helpers for testing

/// Assert that a file exists
#[macro_export]
macro_rules! assert_file_exists {
    ($path:expr) => {
        assert!($path.exists(), "File should exist: {}", $path.display());
    };
    ($path:expr, $msg:expr) => {
        assert!($path.exists(), "{}: {}", $msg, $path.display());
    };
}

/// Assert that a file does not exist
#[macro_export]
macro_rules! assert_file_not_exists {
    ($path:expr) => {
        assert!(
            !$path.exists(),
            "File should not exist: {}",
            $path.display()
        );
    };
    ($path:expr, $msg:expr) => {
        assert!(!$path.exists(), "{}: {}", $msg, $path.display());
    };
}

/// Assert that a file holds exactly the expected bytes
#[macro_export]
macro_rules! assert_file_content {
    ($path:expr, $expected:expr) => {
        let content = std::fs::read_to_string(&$path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", $path.display(), e));
        assert_eq!(
            content,
            $expected,
            "File content mismatch in: {}",
            $path.display()
        );
    };
}

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => panic!("Expected Ok, got Err: {:?}", err),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => panic!("{}: {:?}", $msg, err),
        }
    };
}
