//! HTTP control-endpoint tests, driven through the full loop tick so the
//! accept → parse → actuate → render chain is exercised end to end.

use crate::mock_io::{test_config, MockHardware, MockListener, MockSink};

use roomnode::app::service::BridgeService;
use roomnode::edge::EdgeLatch;
use roomnode::outputs::{DEFAULT_PWM_DUTY, DEFAULT_PWM_FREQ_HZ};
use roomnode::pins;

fn response_text(buf: &std::rc::Rc<std::cell::RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buf.borrow().clone()).expect("response must be UTF-8")
}

// ── Actuation (scenario: plain GPIO output) ───────────────────

#[test]
fn outlet_on_drives_pin_high_and_reuses_handle() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /outlet/on HTTP/1.1\r\nHost: node\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    assert_eq!(hw.claims, vec![(pins::OUTLET_GPIO, false)]);
    assert_eq!(hw.writes, vec![(pins::OUTLET_GPIO, true)]);

    // Identical request again: pin re-asserted, no second claim.
    listener.push_request("GET /outlet/on HTTP/1.1\r\nHost: node\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    assert_eq!(hw.claims.len(), 1, "handle must be created exactly once");
    assert_eq!(
        hw.writes,
        vec![(pins::OUTLET_GPIO, true), (pins::OUTLET_GPIO, true)]
    );
}

#[test]
fn outlet_off_drives_pin_low() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("PUT /outlet/off HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();
    assert_eq!(hw.writes, vec![(pins::OUTLET_GPIO, false)]);
}

#[test]
fn line_containing_both_paths_resolves_off() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /outlet/on/outlet/off HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();
    assert_eq!(hw.writes, vec![(pins::OUTLET_GPIO, false)], "off wins");
}

#[test]
fn last_method_line_decides_the_route() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /led/on HTTP/1.1\r\nGET /outlet/on HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();
    // Only the retained (last) line matters: the LED line is discarded.
    assert_eq!(hw.writes, vec![(pins::OUTLET_GPIO, true)]);
}

// ── Actuation (scenario: PWM output) ──────────────────────────

#[test]
fn pwm_on_with_query_params() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /buzzer/on?freq=50&duty=300 HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    assert_eq!(hw.claims, vec![(pins::BUZZER_GPIO, true)]);
    assert_eq!(hw.pwm_calls, vec![(pins::BUZZER_GPIO, 50, 300)]);
}

#[test]
fn pwm_on_without_params_uses_defaults() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /buzzer/on HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();
    assert_eq!(
        hw.pwm_calls,
        vec![(pins::BUZZER_GPIO, DEFAULT_PWM_FREQ_HZ, DEFAULT_PWM_DUTY)]
    );
}

#[test]
fn pwm_off_zeroes_duty_and_keeps_channel() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    listener.push_request("GET /buzzer/on?freq=440&duty=512 HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();
    listener.push_request("GET /buzzer/off HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    assert_eq!(
        hw.pwm_calls,
        vec![
            (pins::BUZZER_GPIO, 440, 512),
            (pins::BUZZER_GPIO, 440, 0),
        ]
    );
    assert_eq!(hw.claims.len(), 1, "off must not release the channel");
}

// ── Response rendering ────────────────────────────────────────

#[test]
fn every_request_gets_the_full_status_page() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let config = test_config();
    let client_id = config.client_id.clone();
    let mut service = BridgeService::new(config, &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    hw.analog = 777;
    let response = listener.push_request("GET / HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    let text = response_text(&response);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: text/html"));
    assert!(text.contains(&format!("<title>{}</title>", client_id)));
    assert!(text.contains("777"), "current analog value rendered");
    for name in ["Switch #2", "Switch #3", "Switch #4"] {
        assert!(text.contains(name), "input '{name}' missing from page");
    }
    for link in ["/outlet/on", "/outlet/off", "/led/on", "/led/off", "/buzzer/on", "/buzzer/off"] {
        assert!(text.contains(link), "control link '{link}' missing from page");
    }

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    assert!(head.contains(&format!("Content-Length: {}", body.len())));
}

#[test]
fn inputs_render_in_lexicographic_order() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    let response = listener.push_request("GET / HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    let text = response_text(&response);
    let s2 = text.find("Switch #2").unwrap();
    let s3 = text.find("Switch #3").unwrap();
    let s4 = text.find("Switch #4").unwrap();
    assert!(s2 < s3 && s3 < s4);
}

#[test]
fn garbage_request_still_gets_a_page() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    // Invalid UTF-8 and no request line at all.
    let response = listener.push_raw(vec![0xff, 0xfe, 0x00, b'\r', b'\n']);
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    let text = response_text(&response);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(hw.writes.is_empty(), "garbage must not actuate anything");
}

#[test]
fn page_reflects_last_known_input_levels() {
    static LATCH: EdgeLatch = EdgeLatch::new();
    let mut service = BridgeService::new(test_config(), &LATCH);
    let (mut hw, mut udp, mut listener) = (MockHardware::new(), MockSink::new(), MockListener::new());

    hw.set_level(pins::SWITCH_2_GPIO, false);
    LATCH.set();
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    let response = listener.push_request("GET / HTTP/1.1\r\n\r\n");
    service.tick(&mut hw, &mut udp, &mut listener).unwrap();

    let text = response_text(&response);
    // Switch #2 now reads 0; the untouched Switch #3 still reads 1.
    assert!(text.contains("<td>Switch #2</td>\n  <td>0</td>"));
    assert!(text.contains("<td>Switch #3</td>\n  <td>1</td>"));
}
