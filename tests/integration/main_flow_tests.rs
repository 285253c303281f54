use serial_test::serial;
use std::process::Command;

const BINARY: &str = env!("CARGO_BIN_EXE_skill-rating");

/// The application exits with an error code when the database connection fails
#[test]
#[serial]
fn test_application_exits_on_connection_failure() {
    let output = Command::new(BINARY)
        .arg("replay")
        .env(
            "CONNECTION_STRING",
            "host=invalid_host port=5432 user=postgres password=wrong dbname=nonexistent"
        )
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to execute skill-rating");

    assert_eq!(output.status.code(), Some(1), "Process should fail with invalid connection");

    // Logs go to stderr through the indicatif writer
    let logs = String::from_utf8_lossy(&output.stderr);
    assert!(logs.contains("Failed to connect to database"), "Got: {}", logs);
    assert!(
        logs.contains("Application cannot start without a valid database connection"),
        "Got: {}",
        logs
    );
}

/// Without a connection string argument parsing fails before anything else runs
#[test]
#[serial]
fn test_application_exits_on_missing_connection_string() {
    let temp_dir = std::env::temp_dir().join("skill_rating_test");
    std::fs::create_dir_all(&temp_dir).ok();

    // Run from a directory without a .env file
    let output = Command::new(BINARY)
        .arg("replay")
        .current_dir(&temp_dir)
        .env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_default())
        .output()
        .expect("Failed to execute skill-rating");

    std::fs::remove_dir_all(&temp_dir).ok();

    assert!(!output.status.success(), "Process should fail without CONNECTION_STRING");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--connection-string"), "Got: {}", stderr);
}
