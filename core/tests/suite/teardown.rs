use exvi_core::Config;
use exvi_core::Session;
use exvi_core::SessionFlags;
use exvi_core::end_screen;
use exvi_core::teardown;
use pretty_assertions::assert_eq;

use super::mock_host::MockHost;

#[test]
fn ends_command_line_then_visible_then_hidden_screens() {
    let mut session = Session::new("vi", Config::default());
    let ccl = session.link_screen();
    session.ccl_screen = session.remove_screen(ccl);
    let hidden = session.link_screen();
    session.hide_screen(hidden).unwrap();
    let back = session.link_screen();
    let front = session.link_screen();
    let mut host = MockHost::new();
    let mut stderr = Vec::new();

    teardown(&mut session, &mut host, &mut stderr);

    assert_eq!(host.calls, vec!["end_file!"]);
    assert_eq!(host.ended, vec![ccl, front, back, hidden]);
    assert!(session.ccl_screen.is_none());
    assert!(session.visible_ids().is_empty());
    assert!(session.hidden_ids().is_empty());
    assert!(stderr.is_empty());
}

#[test]
fn failing_hosts_do_not_stop_message_delivery() {
    let mut session = Session::new("vi", Config::default());
    let first = session.link_screen();
    let second = session.link_screen();
    session.messages.info("saved");
    session.flags.insert(SessionFlags::BELL_SCHED);
    let mut host = MockHost {
        fail_end_screen: true,
        ..MockHost::new()
    };
    let mut stderr = Vec::new();

    teardown(&mut session, &mut host, &mut stderr);

    assert_eq!(host.ended, vec![second, first]);
    assert_eq!(
        String::from_utf8(stderr).unwrap(),
        format!("\x07saved\nvi: screen {second} not ended\nvi: screen {first} not ended\n")
    );
    assert!(session.messages.is_empty());
}

#[test]
fn end_screen_unlinks_before_handing_off() {
    let mut session = Session::new("ex", Config::default());
    let id = session.link_screen();
    let mut host = MockHost::new();

    end_screen(&mut host, &mut session, id).unwrap();

    assert_eq!(host.ended, vec![id]);
    assert!(session.screen(id).is_none());
    assert!(end_screen(&mut host, &mut session, id).is_err());
    assert_eq!(host.ended, vec![id]);
}
