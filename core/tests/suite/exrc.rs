use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

use exvi_core::Config;
use exvi_core::ScreenId;
use exvi_core::Session;
use exvi_core::exrc::StartupSources;
use exvi_core::exrc::run_startup;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::mock_host::MockHost;

fn write_rc(dir: &Path, name: &str, text: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

fn session_with_screen(exrc: bool) -> (Session, ScreenId) {
    let mut session = Session::new("ex", Config::default());
    let id = session.link_screen();
    session.require_screen_mut(id).unwrap().options.exrc = exrc;
    (session, id)
}

fn messages(session: &Session) -> Vec<String> {
    session
        .messages
        .iter()
        .map(|message| String::from_utf8_lossy(&message.text).into_owned())
        .collect()
}

fn batch_texts(host: &MockHost) -> Vec<&str> {
    host.batches.iter().map(|(_, text)| text.as_str()).collect()
}

#[test]
fn nexinit_wins_over_exinit_and_home() {
    let home = TempDir::new().unwrap();
    write_rc(home.path(), ".exrc", "set home\n", 0o644);
    let sources = StartupSources {
        nexinit: Some("set nexinit".to_string()),
        exinit: Some("set exinit".to_string()),
        home: Some(home.path().to_path_buf()),
        local_dir: home.path().to_path_buf(),
    };
    let (mut session, id) = session_with_screen(false);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert_eq!(
        host.batches,
        vec![(Some("NEXINIT".to_string()), "set nexinit".to_string())]
    );
}

#[test]
fn home_nexrc_is_preferred_over_exrc() {
    let home = TempDir::new().unwrap();
    let nexrc = write_rc(home.path(), ".nexrc", "set from-nexrc\n", 0o644);
    write_rc(home.path(), ".exrc", "set from-exrc\n", 0o644);
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        ..StartupSources::default()
    };
    let (mut session, id) = session_with_screen(false);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert_eq!(
        host.batches,
        vec![(
            Some(nexrc.display().to_string()),
            "set from-nexrc\n".to_string()
        )]
    );
}

#[test]
fn writable_rc_file_is_not_sourced() {
    let home = TempDir::new().unwrap();
    let exrc = write_rc(home.path(), ".exrc", "set unsafe\n", 0o664);
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        ..StartupSources::default()
    };
    let (mut session, id) = session_with_screen(false);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert!(host.batches.is_empty());
    assert_eq!(
        messages(&session),
        vec![format!(
            "{}: not sourced: writable by a user other than the owner",
            exrc.display()
        )]
    );
}

#[test]
fn local_rc_needs_the_exrc_option() {
    let home = TempDir::new().unwrap();
    let local = TempDir::new().unwrap();
    write_rc(home.path(), ".exrc", "set home\n", 0o644);
    write_rc(local.path(), ".exrc", "set local\n", 0o644);
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        local_dir: local.path().to_path_buf(),
        ..StartupSources::default()
    };

    let (mut session, id) = session_with_screen(false);
    let mut host = MockHost::new();
    run_startup(&mut host, &mut session, id, &sources).unwrap();
    assert_eq!(batch_texts(&host), vec!["set home\n"]);

    let (mut session, id) = session_with_screen(true);
    let mut host = MockHost::new();
    run_startup(&mut host, &mut session, id, &sources).unwrap();
    assert_eq!(batch_texts(&host), vec!["set home\n", "set local\n"]);
}

#[test]
fn home_rc_is_not_read_twice_as_the_local_rc() {
    let home = TempDir::new().unwrap();
    write_rc(home.path(), ".exrc", "set once\n", 0o644);
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        local_dir: home.path().to_path_buf(),
        ..StartupSources::default()
    };
    let (mut session, id) = session_with_screen(true);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert_eq!(batch_texts(&host), vec!["set once\n"]);
    assert!(session.messages.is_empty());
}

#[test]
fn exit_from_home_rc_skips_the_local_rc() {
    let home = TempDir::new().unwrap();
    let local = TempDir::new().unwrap();
    write_rc(home.path(), ".exrc", "quit\n", 0o644);
    write_rc(local.path(), ".exrc", "set local\n", 0o644);
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        local_dir: local.path().to_path_buf(),
        ..StartupSources::default()
    };
    let (mut session, id) = session_with_screen(true);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert_eq!(batch_texts(&host), vec!["quit\n"]);
    assert!(session.screen(id).unwrap().exit_requested());
}

#[test]
fn missing_rc_files_are_silently_skipped() {
    let home = TempDir::new().unwrap();
    let sources = StartupSources {
        home: Some(home.path().to_path_buf()),
        local_dir: home.path().to_path_buf(),
        ..StartupSources::default()
    };
    let (mut session, id) = session_with_screen(true);
    let mut host = MockHost::new();

    run_startup(&mut host, &mut session, id, &sources).unwrap();

    assert!(host.batches.is_empty());
    assert!(!host.calls.contains(&"run_commands"));
    assert!(session.messages.is_empty());
}
