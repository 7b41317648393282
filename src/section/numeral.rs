//! Standalone numeral substitution used by block duplication.

/// Replaces every standalone occurrence of the numeral `from` with `to`.
///
/// An occurrence is standalone when it is not part of a longer number: the
/// neighbouring characters are not digits, and not a decimal point that
/// joins it to further digits. `gate0`, `_0]` and `MMU_GEAR_0` are replaced;
/// `10`, `0.5` and `22.0` are not.
pub(super) fn replace(line: &str, from: &str, to: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(pos) = line[search..].find(from) {
        let start = search + pos;
        let end = start + from.len();
        if is_standalone(bytes, start, end) {
            out.push_str(&line[copied..start]);
            out.push_str(to);
            copied = end;
        }
        search = end;
    }

    out.push_str(&line[copied..]);
    out
}

fn is_standalone(bytes: &[u8], start: usize, end: usize) -> bool {
    let joined_before = start > 0
        && (bytes[start - 1].is_ascii_digit()
            || (bytes[start - 1] == b'.' && start >= 2 && bytes[start - 2].is_ascii_digit()));
    let joined_after = end < bytes.len()
        && (bytes[end].is_ascii_digit()
            || (bytes[end] == b'.' && end + 1 < bytes.len() && bytes[end + 1].is_ascii_digit()));
    !joined_before && !joined_after
}
