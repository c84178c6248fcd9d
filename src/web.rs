//! HTTP control endpoint.
//!
//! Not a web server — a forgiving single-line command matcher over a
//! buffered request head, serving one client per loop tick. The
//! observable contract, preserved deliberately:
//!
//! * among all header lines starting with a method token, the **last**
//!   one is "the request line" (any ordering and junk lines tolerated);
//! * `GET`, `POST`, and `PUT` are accepted identically;
//! * output routes match by substring containment anywhere in that line,
//!   `off_path` evaluated after `on_path` so off wins when both occur;
//! * the response is always `200 OK` with the full status page, even
//!   when the request was unreadable garbage.
//!
//! Do not generalise this into a real HTTP parser — the looseness is
//! part of the device's contract with its existing clients.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Read, Write};

use log::{info, warn};

use crate::app::ports::HardwareIo;
use crate::config::{Config, DigitalOutputSpec};
use crate::error::Result;
use crate::outputs::{ActuatorBank, PwmCommand};

/// Total request-head budget; anything past this is ignored.
const MAX_HEAD_BYTES: u64 = 8 * 1024;
const MAX_HEAD_LINES: usize = 64;

/// Retained request line, capped so a hostile client cannot grow memory.
pub type RequestLine = heapless::String<512>;

/// Read header lines until a blank line, EOF, or the head budget runs
/// out, retaining the last line that looks like a request line.
pub fn read_request_line<R: Read>(stream: R) -> std::io::Result<RequestLine> {
    let mut reader = BufReader::new(stream.take(MAX_HEAD_BYTES));
    let mut retained = RequestLine::new();
    let mut line = String::new();

    for _ in 0..MAX_HEAD_LINES {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if trimmed.starts_with("GET ") || trimmed.starts_with("POST ") || trimmed.starts_with("PUT ")
        {
            retained.clear();
            for ch in trimmed.chars() {
                // Over-long lines are truncated; real routes are short.
                if retained.push(ch).is_err() {
                    break;
                }
            }
        }
    }
    Ok(retained)
}

/// Route decision for one output against the retained request line.
/// `off_path` is checked second on purpose: when a line somehow contains
/// both routes, off wins.
pub fn match_output(line: &str, spec: &DigitalOutputSpec) -> Option<bool> {
    let mut decision = None;
    if line.contains(spec.on_path.as_str()) {
        decision = Some(true);
    }
    if line.contains(spec.off_path.as_str()) {
        decision = Some(false);
    }
    decision
}

/// Scan for `freq=<int>&duty=<int>` anywhere in the request line.
/// Anything else — absent, partial, or unparsable — yields `None` and
/// the actuator bank falls back to its defaults.
pub fn parse_pwm_params(line: &str) -> Option<PwmCommand> {
    for (at, _) in line.match_indices("freq=") {
        let rest = &line[at + 5..];
        let freq_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if freq_end == 0 {
            continue;
        }
        let Some(duty_rest) = rest[freq_end..].strip_prefix("&duty=") else {
            continue;
        };
        let duty_end = duty_rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(duty_rest.len());
        if duty_end == 0 {
            continue;
        }
        if let (Ok(freq_hz), Ok(duty)) =
            (rest[..freq_end].parse(), duty_rest[..duty_end].parse())
        {
            return Some(PwmCommand { freq_hz, duty });
        }
    }
    None
}

/// Render the status page: device title, analog reading, every input in
/// lexicographic order, every output with both control links.
pub fn render_status_page(
    client_id: &str,
    analog_value: i32,
    inputs: &BTreeMap<String, bool>,
    outputs: &[DigitalOutputSpec],
) -> String {
    let mut html = format!(
        "<html>\n<head>\n<title>{0}</title>\n</head>\n<body>\n<h1>{0}</h1>\n<table>\n \
         <tr>\n  <td>Analog Sensor</td>\n  <td>{1}</td>\n </tr>\n",
        client_id, analog_value
    );

    // BTreeMap iteration is already name-sorted.
    for (name, level) in inputs {
        let _ = write!(
            html,
            " <tr>\n  <td>{}</td>\n  <td>{}</td>\n </tr>\n",
            name, u8::from(*level)
        );
    }

    for out in outputs {
        let _ = write!(
            html,
            " <tr>\n  <td>{}</td>\n  <td><a href=\"{}\">On</a> | <a href=\"{}\">Off</a></td>\n </tr>\n",
            out.name, out.on_path, out.off_path
        );
    }

    html.push_str("</table>\n</body>\n</html>");
    html
}

/// Write the one and only response shape this endpoint produces.
pub fn write_response<W: Write>(w: &mut W, body: &str) -> std::io::Result<()> {
    write!(
        w,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )?;
    w.write_all(body.as_bytes())
}

/// Serve one accepted connection end to end: parse, actuate, respond,
/// and let the caller drop (close) the stream unconditionally.
///
/// Read and write failures stay inside this function — the client still
/// gets a best-effort page built from last-known values. Only a
/// configuration-consistency violation propagates.
pub fn serve_connection<S: Read + Write>(
    stream: &mut S,
    config: &Config,
    bank: &mut ActuatorBank,
    hw: &mut impl HardwareIo,
    analog_value: i32,
    inputs: &BTreeMap<String, bool>,
) -> Result<()> {
    let request_line = match read_request_line(&mut *stream) {
        Ok(line) => line,
        Err(e) => {
            warn!("Request read failed, serving status page anyway: {}", e);
            RequestLine::new()
        }
    };

    for spec in &config.outputs {
        let Some(on) = match_output(&request_line, spec) else {
            continue;
        };
        info!(
            "Request drives output '{}' (pin {}) -> {}",
            spec.name, spec.pin, on
        );
        let pwm = if spec.is_pwm && on {
            parse_pwm_params(&request_line)
        } else {
            None
        };
        bank.set_output(hw, &spec.name, on, pwm)?;
    }

    let body = render_status_page(&config.client_id, analog_value, inputs, &config.outputs);
    if let Err(e) = write_response(stream, &body) {
        warn!("Response write failed: {}", e);
    }
    Ok(())
}
