use exvi_core::Event;
use exvi_core::ExitStatus;
use exvi_core::ScreenFlags;
use exvi_core::SessionFlags;
use exvi_core::exrc::StartupSources;
use exvi_process_hardening::Promise;
use exvi_process_hardening::Promises;
use pretty_assertions::assert_eq;

use super::mock_host::MockHost;
use super::mock_host::RecordingSandbox;
use super::mock_host::run;
use super::mock_host::run_with;

#[test]
fn ex_without_arguments_runs_a_scratch_file_in_ex() {
    let mut host = MockHost::new();
    let outcome = run("ex", &[], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(
        host.calls,
        vec![
            "init_screen",
            "init_keys",
            "read_startup_files",
            "init_file",
            "ex"
        ]
    );
    assert_eq!(host.dispatches.len(), 1);
    let dispatch = &host.dispatches[0];
    assert!(dispatch.flags.contains(ScreenFlags::EX));
    assert!(dispatch.flags.contains(ScreenFlags::STATUS_CNT));
    assert!(!dispatch.flags.contains(ScreenFlags::VI));
    assert_eq!(dispatch.file, None);
    assert_eq!(host.ended, vec![dispatch.screen]);
    assert_eq!(outcome.stderr, "");
}

#[test]
fn view_is_readonly_before_the_first_dispatch() {
    let mut host = MockHost::new();
    let outcome = run("view", &["somefile"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    let dispatch = &host.dispatches[0];
    assert_eq!(dispatch.interpreter, "vi");
    assert!(dispatch.readonly);
    assert_eq!(dispatch.file.as_deref(), Some("somefile"));
    assert_eq!(dispatch.args, vec!["somefile"]);
}

#[test]
fn plain_vi_is_not_readonly() {
    let mut host = MockHost::new();
    run("vi", &["a", "b"], &mut host);

    let dispatch = &host.dispatches[0];
    assert_eq!(dispatch.interpreter, "vi");
    assert!(!dispatch.readonly);
    assert_eq!(dispatch.file.as_deref(), Some("a"));
    assert_eq!(dispatch.args, vec!["a", "b"]);
}

#[test]
fn recover_with_tag_fails_before_any_screen() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["-r", "-t", "x"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(outcome.status.code(), 1);
    assert_eq!(outcome.stderr, "vi: only one of -r and -t may be specified.\n");
    assert!(host.calls.is_empty());
    assert!(host.ended.is_empty());
}

#[test]
fn second_command_is_a_usage_error() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["+1", "+2"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(outcome.stderr, "vi: only one -c command may be specified.\n");
    assert!(host.calls.is_empty());
}

#[test]
fn silent_requires_ex() {
    let mut host = MockHost::new();
    let outcome = run("ex", &["-v", "-s"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(outcome.stderr, "ex: -s option is only applicable to ex.\n");
    assert!(host.calls.is_empty());

    let mut host = MockHost::new();
    let outcome = run("vi", &["-s"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Failure);
    assert!(outcome.stderr.starts_with("usage: vi "), "{}", outcome.stderr);
    assert!(host.calls.is_empty());
}

#[test]
fn failed_screen_construction_still_flushes_and_ends_the_screen() {
    let mut host = MockHost {
        fail_init_screen: Some("terminal type unknown"),
        ..MockHost::new()
    };
    let outcome = run("vi", &["file"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(host.calls, vec!["init_screen"]);
    assert_eq!(host.ended.len(), 1);
    assert_eq!(outcome.stderr, "vi: terminal type unknown\n");
}

#[test]
fn pending_messages_are_written_once_in_order() {
    let mut host = MockHost {
        dispatch_messages: vec!["first", "second", "third"],
        ..MockHost::new()
    };
    let outcome = run("ex", &[], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(outcome.stderr, "ex: first\nex: second\nex: third\n");
    assert!(outcome.session.messages.is_empty());
}

#[test]
fn dispatch_failure_is_fatal_and_reported() {
    let mut host = MockHost {
        fail_dispatch: Some("engine exploded"),
        ..MockHost::new()
    };
    let outcome = run("vi", &[], &mut host);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(outcome.stderr, "vi: engine exploded\n");
    assert_eq!(host.ended.len(), 1);
}

#[test]
fn scheduled_bell_rings_before_messages() {
    let mut host = MockHost {
        schedule_bell: true,
        dispatch_messages: vec!["done"],
        ..MockHost::new()
    };
    let outcome = run("ex", &[], &mut host);

    assert_eq!(outcome.stderr, "\x07ex: done\n");
}

#[test]
fn setup_messages_wait_for_enter() {
    let mut host = MockHost {
        show_in_ex: true,
        events: [
            Event::Character('x'),
            Event::Character('y'),
            Event::Character('\n'),
            Event::Character('z'),
        ]
        .into_iter()
        .collect(),
        ..MockHost::new()
    };
    let outcome = run("vi", &[], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(outcome.stdout, "Press Enter to continue: ");
    assert_eq!(host.bells, 2);
    assert_eq!(host.events.len(), 1);
}

#[test]
fn interrupt_also_dismisses_the_wait() {
    let mut host = MockHost {
        show_in_ex: true,
        ..MockHost::new()
    };
    let outcome = run("vi", &[], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(host.bells, 0);
}

#[test]
fn secure_flag_narrows_the_sandbox() {
    let mut host = MockHost::new();
    let mut sandbox = RecordingSandbox::default();
    let outcome = run_with("vi", &["-S"], |_| {}, &mut host, &mut sandbox);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(sandbox.declared.len(), 2);
    assert_eq!(sandbox.declared[0], Promises::all());
    assert!(!sandbox.declared[1].contains(Promise::Proc));
    assert!(!sandbox.declared[1].contains(Promise::Exec));
    assert!(sandbox.declared[1].contains(Promise::Tty));
    assert!(host.dispatches[0].secure);
}

#[test]
fn sandbox_failure_is_fatal_before_any_screen() {
    let mut host = MockHost::new();
    let mut sandbox = RecordingSandbox {
        fail: true,
        ..RecordingSandbox::default()
    };
    let outcome = run_with("vi", &[], |_| {}, &mut host, &mut sandbox);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert!(outcome.stderr.starts_with("vi: sandbox: "), "{}", outcome.stderr);
    assert!(host.calls.is_empty());
}

#[test]
fn command_option_runs_once_against_the_first_file() {
    let mut host = MockHost::new();
    let outcome = run("ex", &["-c", "set ai", "notes.txt"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(
        host.batches,
        vec![(Some("-c option".to_string()), "set ai".to_string())]
    );
    assert_eq!(outcome.session.command_option, None);
    assert_eq!(host.dispatches[0].file.as_deref(), Some("notes.txt"));
}

#[test]
fn command_option_exit_skips_the_main_loop() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["+quit"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(host.dispatches.is_empty());
    assert_eq!(host.ended.len(), 1);
}

#[test]
fn command_option_keeps_setup_in_ex_until_the_main_loop() {
    let mut host = MockHost::new();
    run("vi", &["+"], &mut host);

    assert_eq!(
        host.batches,
        vec![(Some("-c option".to_string()), "$".to_string())]
    );
    assert_eq!(host.dispatches[0].interpreter, "vi");
}

#[test]
fn startup_exit_ends_the_session() {
    let mut host = MockHost {
        startup: StartupSources {
            exinit: Some("quit".to_string()),
            ..StartupSources::default()
        },
        ..MockHost::new()
    };
    let outcome = run("vi", &["file"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(
        host.calls,
        vec!["init_screen", "init_keys", "read_startup_files", "run_commands"]
    );
    assert_eq!(host.ended.len(), 1);
}

#[test]
fn recover_without_files_lists_recoverable_files() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["-r"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(host.calls.contains(&"list_recovery"));
    assert!(!host.calls.contains(&"init_file"));
    assert_eq!(outcome.stderr, "No files to recover\n");
}

#[test]
fn recover_marks_arguments_and_first_file() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["-r", "lost.txt"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    let dispatch = &host.dispatches[0];
    assert!(dispatch.flags.contains(ScreenFlags::ARG_RECOVER));
    assert!(dispatch.file_recover);
    assert_eq!(dispatch.file.as_deref(), Some("lost.txt"));
}

#[test]
fn window_flag_sets_the_default_scroll() {
    let mut host = MockHost::new();
    run("vi", &["-w", "10"], &mut host);
    assert_eq!(host.dispatches[0].default_scroll, 5);

    let mut host = MockHost::new();
    run("vi", &[], &mut host);
    assert_eq!(host.dispatches[0].default_scroll, 12);
}

#[test]
fn bad_window_size_is_reported_but_not_fatal() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["-w", "lots"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(outcome.stderr, "vi: set: illegal number lots for window\n");
}

#[test]
fn scripted_ex_is_silent_and_skips_startup() {
    let mut host = MockHost::new();
    let outcome = run_with(
        "ex",
        &[],
        |session| session.flags.insert(SessionFlags::SCRIPTED),
        &mut host,
        &mut RecordingSandbox::default(),
    );

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(!host.calls.contains(&"read_startup_files"));
    assert!(host.dispatches[0].flags.contains(ScreenFlags::EX_SILENT));
}

#[test]
fn forced_ex_under_vi_dispatches_ex() {
    let mut host = MockHost::new();
    run("vi", &["-e"], &mut host);
    assert_eq!(host.dispatches[0].interpreter, "ex");
}

#[test]
fn tagged_file_comes_before_file_arguments() {
    let mut host = MockHost {
        tag_file: Some("tagged.c"),
        ..MockHost::new()
    };
    let outcome = run("vi", &["-t", "main", "a.c", "b.c"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(!host.calls.contains(&"init_file"));
    let dispatch = &host.dispatches[0];
    assert_eq!(dispatch.file.as_deref(), Some("tagged.c"));
    assert_eq!(dispatch.args, vec!["tagged.c", "a.c", "b.c"]);
}

#[test]
fn command_option_runs_against_the_tagged_file() {
    let mut host = MockHost {
        tag_file: Some("tagged.c"),
        ..MockHost::new()
    };
    let outcome = run("vi", &["-t", "main", "-c", "set ai"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(!host.calls.contains(&"init_file"));
    assert_eq!(
        host.batches,
        vec![(Some("-c option".to_string()), "set ai".to_string())]
    );
    assert_eq!(outcome.session.command_option, None);
    assert_eq!(host.dispatches[0].file.as_deref(), Some("tagged.c"));

    let mut host = MockHost {
        tag_file: Some("tagged.c"),
        ..MockHost::new()
    };
    let outcome = run("vi", &["-t", "main", "+quit"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Success);
    assert!(host.dispatches.is_empty());
    assert_eq!(host.ended.len(), 1);
}

#[test]
fn unknown_program_names_boot_vi_with_the_ex_grammar() {
    let mut host = MockHost::new();
    let outcome = run("exvi", &["-R", "-v", "file"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Success);
    let dispatch = &host.dispatches[0];
    assert_eq!(dispatch.interpreter, "vi");
    assert!(dispatch.readonly);

    let mut host = MockHost::new();
    let outcome = run("exvi", &["file"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Success);
    assert_eq!(host.dispatches[0].interpreter, "vi");
    assert!(!host.dispatches[0].readonly);

    let mut host = MockHost::new();
    let outcome = run("exvi", &["-e", "file"], &mut host);
    assert_eq!(outcome.status, ExitStatus::Failure);
    assert!(outcome.stderr.starts_with("usage: ex "), "{}", outcome.stderr);
    assert!(host.calls.is_empty());
}

#[test]
fn flags_after_the_first_file_are_file_names() {
    let mut host = MockHost::new();
    run("vi", &["file", "-R"], &mut host);

    let dispatch = &host.dispatches[0];
    assert!(!dispatch.readonly);
    assert_eq!(dispatch.args, vec!["file", "-R"]);
}

#[test]
fn failed_tag_lookup_is_fatal() {
    let mut host = MockHost::new();
    let outcome = run("vi", &["-t", "missing"], &mut host);

    assert_eq!(outcome.status, ExitStatus::Failure);
    assert_eq!(outcome.stderr, "vi: tag not found\n");
    assert!(host.dispatches.is_empty());
    assert_eq!(host.ended.len(), 1);
}

#[test]
fn no_snapshot_clears_the_session_flag() {
    let mut host = MockHost::new();
    let outcome = run("vi", &[], &mut host);
    assert!(outcome.session.flags.contains(SessionFlags::SNAPSHOT));

    let mut host = MockHost::new();
    let outcome = run("vi", &["-F"], &mut host);
    assert!(!outcome.session.flags.contains(SessionFlags::SNAPSHOT));
}
