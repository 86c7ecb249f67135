use chrono::{ DateTime, TimeZone, Utc };
use uuid::Uuid;

const SANITIZE_MAX_CHARS: usize = 2000;
const BYTE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Millisecond timestamp in base 36 followed by a random base-36 suffix.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    // 64 random bits keep the suffix around 12 characters.
    let random = Uuid::new_v4().as_u128() >> 64;
    format!("{}{}", to_base36(millis), to_base36(random))
}

/// `HH:MM` in the timezone of the given instant.
pub fn format_time<Tz: TimeZone>(date: &DateTime<Tz>) -> String
    where Tz::Offset: std::fmt::Display
{
    date.format("%H:%M").to_string()
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Cuts to `length` characters and appends `...` when anything was dropped.
pub fn truncate(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_string();
    }
    let head: String = text.chars().take(length).collect();
    format!("{}...", head)
}

fn strip_script_blocks(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(start) = lower[pos..].find("<script").map(|i| i + pos) {
        let Some(open_end) = lower[start..].find('>').map(|i| i + start + 1) else {
            break;
        };
        let Some(close) = lower[open_end..].find("</script>").map(|i| i + open_end) else {
            break;
        };
        out.push_str(&text[pos..start]);
        pos = close + "</script>".len();
    }
    out.push_str(&text[pos..]);
    out
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Trims, removes `<script>` blocks and any remaining tags, and caps the length.
pub fn sanitize_text(text: &str) -> String {
    let cleaned = strip_tags(&strip_script_blocks(text.trim()));
    cleaned.chars().take(SANITIZE_MAX_CHARS).collect()
}

pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut i = 0;
    let mut unit: u128 = 1;
    while i < BYTE_UNITS.len() - 1 && (bytes as u128) >= unit * 1024 {
        unit *= 1024;
        i += 1;
    }
    let value = (bytes as f64) / (unit as f64);

    let rendered = format!("{:.*}", decimals, value);
    let rendered = if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rendered
    };
    format!("{} {}", rendered, BYTE_UNITS[i])
}
