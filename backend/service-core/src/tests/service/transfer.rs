// Unit tests for in-process transfer path handling

use crate::service::transfer::resolve_in_root;

use std::path::{Path, PathBuf};

/// **VALUE**: Verifies that requests cannot escape the service root.
///
/// **WHY THIS MATTERS**: The fallback server may bind a non-loopback address. A `..` in a
/// filename must never expose files outside the root.
///
/// **BUG THIS CATCHES**: Would catch removal of the component check, which would let
/// `../../etc/passwd` through.
#[test]
fn given_escaping_filenames_when_resolved_then_rejected() {
    let root = Path::new("/srv/tftp");

    for name in ["../secret", "a/../../b", "./x", "", "/", "/etc/passwd", "\\\\host\\share"] {
        assert_eq!(resolve_in_root(root, name), None, "Should reject {name:?}");
    }
}

/// **VALUE**: Verifies plain names and subdirectories resolve under root.
///
/// **BUG THIS CATCHES**: Would catch nested paths being refused, which breaks PXE
/// layouts like `boot/pxelinux.0`.
#[test]
fn given_plain_filenames_when_resolved_then_joined_under_root() {
    let root = Path::new("/srv/tftp");

    assert_eq!(
        resolve_in_root(root, "test_file.txt"),
        Some(PathBuf::from("/srv/tftp/test_file.txt"))
    );
    assert_eq!(
        resolve_in_root(root, "boot/pxelinux.0"),
        Some(PathBuf::from("/srv/tftp/boot/pxelinux.0"))
    );
}
