use std::fs;

use hello_teal::{emit, EmitConfig};

const APPROVAL: &str = "#pragma version 5
txn ApplicationID
int 0
==
bnz main_l2
byte \"Year\"
int 1970
global LatestTimestamp
int 31536000
/
+
app_global_put
byte \"Caller\"
txn Sender
app_global_put
byte \"Message\"
byte \"Hello World!\"
app_global_put
int 1
return
main_l2:
int 1
return";

const CLEAR: &str = "#pragma version 5
int 1
return";

#[test]
fn test_emit_writes_both_programs() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path());

    let report = emit(&config).unwrap();
    assert_eq!(report.approval, dir.path().join("approval.teal"));
    assert_eq!(report.clear, dir.path().join("clear.teal"));

    assert_eq!(fs::read_to_string(&report.approval).unwrap(), APPROVAL);
    assert_eq!(fs::read_to_string(&report.clear).unwrap(), CLEAR);
}

#[test]
fn test_emit_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path());

    let first = emit(&config).unwrap();
    let approval = fs::read(&first.approval).unwrap();
    let clear = fs::read(&first.clear).unwrap();

    let second = emit(&config).unwrap();
    assert_eq!(fs::read(&second.approval).unwrap(), approval);
    assert_eq!(fs::read(&second.clear).unwrap(), clear);
}

#[test]
fn test_stale_clear_replaced_without_approval() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path());
    fs::write(config.clear_path(), "stale").unwrap();
    assert!(!config.approval_path().exists());

    emit(&config).unwrap();
    assert_eq!(fs::read_to_string(config.clear_path()).unwrap(), CLEAR);
}

#[test]
fn test_stale_outputs_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path());
    fs::write(config.approval_path(), "x".repeat(4096)).unwrap();
    fs::write(config.clear_path(), "x".repeat(4096)).unwrap();

    emit(&config).unwrap();
    assert_eq!(fs::read_to_string(config.approval_path()).unwrap(), APPROVAL);
    assert_eq!(fs::read_to_string(config.clear_path()).unwrap(), CLEAR);
}

#[test]
fn test_unsupported_version_clears_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path()).version(9);
    fs::write(config.approval_path(), "stale").unwrap();

    let err = emit(&config).unwrap_err();
    assert!(matches!(err, hello_teal::Error::Compile(_)));
    assert!(!config.approval_path().exists());
    assert!(!config.clear_path().exists());
}

#[test]
fn test_missing_out_dir_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = EmitConfig::default().out_dir(dir.path().join("missing"));

    let err = emit(&config).unwrap_err();
    assert!(matches!(err, hello_teal::Error::Io { .. }));
}
