//! Integration tests for the layout file → spawn pipeline.
//!
//! A layout file is written to a scratch directory, located through
//! `ConfigLocations`, decoded, and spawned against the recording port.

use std::path::PathBuf;

use rezide::application::spawn_layout::{build_and_spawn, SpawnError, WindowManagerError};
use rezide::infrastructure::storage::config::{ConfigLocations, ConfigSource, TomlConfigFile};
use rezide::infrastructure::window_manager::recording::{RecordedCall, RecordingWindowManager};
use rezide_core::{ErrorClass, LayoutSet, Orientation};
use uuid::Uuid;

const LAYOUTS: &str = r#"
[ide]
split = "horizontal"
children = ["left side", "right window"]
sizes = [40, 60]
is_layout = true

["left side"]
split = "vertical"
children = ["top left", "bottom left"]
sizes = [50, 50]

["top left"]
command = "alacritty"
mark = "top left"

["bottom left"]
command = "alacritty -e htop"
mark = "bottom left"

["right window"]
command = "alacritty -e nvim"
mark = "right window"
"#;

/// Writes `content` to `$XDG_CONFIG_HOME/rezide/config.toml` inside a fresh
/// scratch directory and returns the locations pointing at it.
fn install_config(content: &str) -> (ConfigLocations, PathBuf) {
    let root = std::env::temp_dir().join(format!("rezide-it-{}", Uuid::new_v4()));
    let dir = root.join("xdg").join("rezide");
    std::fs::create_dir_all(&dir).expect("create config dir");
    std::fs::write(dir.join("config.toml"), content).expect("write config");
    let locations = ConfigLocations {
        explicit: None,
        xdg_config_home: Some(root.join("xdg")),
        home: Some(root.join("home")),
    };
    (locations, root)
}

fn load(locations: &ConfigLocations) -> LayoutSet {
    TomlConfigFile::locate(locations)
        .expect("config must be found")
        .read()
        .expect("config must decode")
}

fn make(mark: &str, command: &str) -> RecordedCall {
    RecordedCall::MakeWindow {
        mark: mark.to_string(),
        command: command.to_string(),
    }
}

#[test]
fn test_config_file_layout_is_spawned_in_order() {
    // Arrange
    let (locations, root) = install_config(LAYOUTS);
    let set = load(&locations);
    let mut wm = RecordingWindowManager::new();

    // Act
    let report = build_and_spawn(&set, "ide", &mut wm).unwrap();

    // Assert
    assert_eq!(
        wm.calls,
        [
            RecordedCall::CountWorkspaceWindows,
            make("top left", "alacritty"),
            RecordedCall::SplitAndMarkParent(Orientation::Horizontal),
            make("right window", "alacritty -e nvim"),
            RecordedCall::Focus("top left".to_string()),
            RecordedCall::SplitAndMarkParent(Orientation::Vertical),
            make("bottom left", "alacritty -e htop"),
        ]
    );
    assert_eq!(report.windows_created, 3);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_crowded_workspace_issues_no_operations() {
    // Arrange
    let (locations, root) = install_config(LAYOUTS);
    let set = load(&locations);
    let mut wm = RecordingWindowManager::with_existing_windows(2);

    // Act
    let err = build_and_spawn(&set, "ide", &mut wm).unwrap_err();

    // Assert
    assert!(matches!(err, SpawnError::Precondition { found: 2 }));
    assert_eq!(wm.mutating_calls().count(), 0);
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_missing_layout_issues_no_operations() {
    let (locations, root) = install_config(LAYOUTS);
    let set = load(&locations);
    let mut wm = RecordingWindowManager::new();

    let err = build_and_spawn(&set, "nope", &mut wm).unwrap_err();

    match err {
        SpawnError::Layout(e) => assert_eq!(e.class(), ErrorClass::LayoutNotFound),
        other => panic!("expected a layout error, got {other:?}"),
    }
    assert!(wm.calls.is_empty());
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_failure_mid_sequence_keeps_earlier_operations() {
    // Arrange: two mutating calls succeed, the third fails
    let (locations, root) = install_config(LAYOUTS);
    let set = load(&locations);
    let mut wm = RecordingWindowManager::failing_after(2);

    // Act
    let err = build_and_spawn(&set, "ide", &mut wm).unwrap_err();

    // Assert
    match err {
        SpawnError::Port {
            completed,
            total,
            source: WindowManagerError::Other(_),
        } => {
            assert_eq!(completed, 2);
            assert_eq!(total, 6);
        }
        other => panic!("expected a port error, got {other:?}"),
    }
    assert_eq!(wm.mutating_calls().count(), 3, "no call after the failing one");
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn test_cyclic_definitions_are_rejected_before_spawning() {
    let (locations, root) = install_config(
        r#"
        [a]
        split = "horizontal"
        children = ["b", "w1"]
        sizes = [50, 50]
        is_layout = true

        [b]
        split = "vertical"
        children = ["a", "w2"]
        sizes = [50, 50]

        [w1]
        command = "alacritty"
        mark = "w1"

        [w2]
        command = "alacritty"
        mark = "w2"
        "#,
    );
    let set = load(&locations);
    let mut wm = RecordingWindowManager::new();

    let err = build_and_spawn(&set, "a", &mut wm).unwrap_err();

    match err {
        SpawnError::Layout(e) => assert_eq!(e.class(), ErrorClass::CyclicReference),
        other => panic!("expected a layout error, got {other:?}"),
    }
    assert!(wm.calls.is_empty());
    let _ = std::fs::remove_dir_all(root);
}
