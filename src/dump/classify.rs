/// Structural role of a single line of the device dump.
///
/// The Alteon report carries no schema; nesting depth is recovered from
/// indentation width and a handful of literal tokens. Classification is
/// purely structural and says nothing about whether the line's fields are
/// usable, that is the extractors' problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    SectionStart,
    VipStart,
    ServiceStart,
    RealServerStart,
    SectionEnd,
    Other,
}

pub const SECTION_HEADER: &str = "Virtual server state:";
pub const SECTION_FOOTER: &str = "IDS group state:";
const VIP_MARKER: &str = "IP4";
const SERVICE_KEYWORD: &str = "rport";
const SERVICE_INDENT: usize = 4;
const REAL_SERVER_INDENT: usize = 8;

/// Classifies one line, checked in fixed order with the first match winning:
/// section header, VIP, service, real server, section footer. Expects lines
/// as produced by [`str::lines`], i.e. without the trailing newline.
pub fn classify(line: &str) -> LineKind {
    if line == SECTION_HEADER {
        LineKind::SectionStart
    } else if is_vip_start(line) {
        LineKind::VipStart
    } else if is_service_start(line) {
        LineKind::ServiceStart
    } else if is_real_server_start(line) {
        LineKind::RealServerStart
    } else if line == SECTION_FOOTER {
        LineKind::SectionEnd
    } else {
        LineKind::Other
    }
}

// `<digits>: IP4 ` at column zero.
fn is_vip_start(line: &str) -> bool {
    let b = line.as_bytes();
    let digits = b.iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || b.len() <= digits || b[digits] != b':' {
        return false;
    }
    let mut i = digits + 1;
    if !next_is_whitespace(b, i) {
        return false;
    }
    i += 1;
    b[i..].starts_with(VIP_MARKER.as_bytes()) && next_is_whitespace(b, i + VIP_MARKER.len())
}

// Exactly 4 leading whitespace, a token, one whitespace, `rport`.
fn is_service_start(line: &str) -> bool {
    let b = line.as_bytes();
    if b.len() <= SERVICE_INDENT || !b[..SERVICE_INDENT].iter().all(|c| c.is_ascii_whitespace()) {
        return false;
    }
    let mut i = SERVICE_INDENT;
    let token = b[i..].iter().take_while(|c| !c.is_ascii_whitespace()).count();
    if token == 0 {
        return false;
    }
    i += token;
    if !next_is_whitespace(b, i) {
        return false;
    }
    i += 1;
    b[i..].starts_with(SERVICE_KEYWORD.as_bytes())
}

// Exactly 8 leading whitespace, `<digits>: `, then a dotted-decimal-looking
// prefix (`d{1,3}.d{1,3}.`). Real-server lines are the only ones nested this
// deep that open with an id and an address.
fn is_real_server_start(line: &str) -> bool {
    let b = line.as_bytes();
    if b.len() <= REAL_SERVER_INDENT
        || !b[..REAL_SERVER_INDENT].iter().all(|c| c.is_ascii_whitespace())
    {
        return false;
    }
    let mut i = REAL_SERVER_INDENT;
    let digits = b[i..].iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    i += digits;
    if i >= b.len() || b[i] != b':' {
        return false;
    }
    i += 1;
    if !next_is_whitespace(b, i) {
        return false;
    }
    i += 1;
    for _ in 0..2 {
        let octet = b[i..].iter().take_while(|c| c.is_ascii_digit()).count();
        if octet == 0 || octet > 3 {
            return false;
        }
        i += octet;
        if i >= b.len() || b[i] != b'.' {
            return false;
        }
        i += 1;
    }
    true
}

fn next_is_whitespace(b: &[u8], i: usize) -> bool {
    i < b.len() && b[i].is_ascii_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_markers_match_exactly() {
        assert_eq!(classify("Virtual server state:"), LineKind::SectionStart);
        assert_eq!(classify("IDS group state:"), LineKind::SectionEnd);
        assert_eq!(classify("Virtual server state: "), LineKind::Other);
        assert_eq!(classify("  Virtual server state:"), LineKind::Other);
        assert_eq!(classify("next"), LineKind::Other);
    }

    #[test]
    fn vip_lines() {
        assert_eq!(
            classify("1: IP4 10.0.0.1, 00:00:5e:00:01:01, ena, vip-a"),
            LineKind::VipStart
        );
        assert_eq!(classify("142: IP4 172.16.9.30,"), LineKind::VipStart);
        // no digits, wrong marker, missing whitespace
        assert_eq!(classify(": IP4 10.0.0.1"), LineKind::Other);
        assert_eq!(classify("1: IP6 ::1"), LineKind::Other);
        assert_eq!(classify("1:IP4 10.0.0.1"), LineKind::Other);
        assert_eq!(classify("1: IP40 10.0.0.1"), LineKind::Other);
    }

    #[test]
    fn service_lines_need_four_columns_of_indent() {
        assert_eq!(classify("    80: rport 8080, group 1"), LineKind::ServiceStart);
        assert_eq!(classify("    http: rport http"), LineKind::ServiceStart);
        assert_eq!(classify("   80: rport 8080"), LineKind::Other);
        assert_eq!(classify("     80: rport 8080"), LineKind::Other);
        assert_eq!(classify("    80: report 8080"), LineKind::Other);
    }

    #[test]
    fn real_server_lines_need_eight_columns_of_indent() {
        assert_eq!(classify("        1: 10.0.1.1, real-a, UP"), LineKind::RealServerStart);
        assert_eq!(classify("        12: 192.168.200.4, web-12: UP"), LineKind::RealServerStart);
        assert_eq!(classify("       1: 10.0.1.1, real-a, UP"), LineKind::Other);
        assert_eq!(classify("        x: 10.0.1.1"), LineKind::Other);
        assert_eq!(classify("        1: real-a 10.0.1.1"), LineKind::Other);
        assert_eq!(classify("        1: 1000.1.1.1"), LineKind::Other);
    }

    #[test]
    fn unindented_service_shape_is_not_a_service() {
        // same tokens, wrong depth: must never be attributed to a VIP
        assert_eq!(classify("80: rport 8080, group 1"), LineKind::Other);
    }
}
