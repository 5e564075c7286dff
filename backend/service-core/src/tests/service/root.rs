// Unit tests for service root preparation

use crate::service::root::prepare_root;
use crate::{README_FILE_BODY, README_FILE_NAME, SAMPLE_FILE_BODY, SAMPLE_FILE_NAME};

use std::fs;

/// **VALUE**: Verifies seeding on a fresh root creates exactly the two sample files.
///
/// **WHY THIS MATTERS**: The probe asks for `test_file.txt`; if it is missing, a perfectly
/// healthy server answers with ERROR and the probe reports a malformed response.
///
/// **BUG THIS CATCHES**: Would catch a missing seed file or extra stray files.
#[test]
fn given_missing_root_when_prepared_then_creates_directory_and_two_samples() {
    // GIVEN: A root that does not exist yet
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("nested").join("tftp_root");

    // WHEN: Preparing
    prepare_root(&root).expect("fresh root should be prepared");

    // THEN: Exactly the two files with their bodies
    let mut names: Vec<String> = fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![README_FILE_NAME, SAMPLE_FILE_NAME]);
    assert_eq!(
        fs::read_to_string(root.join(SAMPLE_FILE_NAME)).unwrap(),
        SAMPLE_FILE_BODY
    );
    assert_eq!(
        fs::read_to_string(root.join(README_FILE_NAME)).unwrap(),
        README_FILE_BODY
    );
}

/// **VALUE**: Verifies existing sample files are never overwritten.
///
/// **WHY THIS MATTERS**: Testers replace `test_file.txt` with real payloads; re-running the
/// tool must not clobber them.
///
/// **BUG THIS CATCHES**: Would catch a switch from create-new to truncate-and-write.
#[test]
fn given_existing_sample_when_prepared_then_content_is_untouched() {
    // GIVEN: Root with a customised test file
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join(SAMPLE_FILE_NAME), b"custom payload").unwrap();

    // WHEN: Preparing twice
    prepare_root(temp.path()).unwrap();
    prepare_root(temp.path()).unwrap();

    // THEN: Custom content kept, README added
    assert_eq!(
        fs::read(temp.path().join(SAMPLE_FILE_NAME)).unwrap(),
        b"custom payload"
    );
    assert!(temp.path().join(README_FILE_NAME).exists());
}
