/// Offset between an ASCII capital letter and its regional indicator symbol.
const REGIONAL_INDICATOR_OFFSET: u32 = 0x1F1A5;

/// Flag emoji for an ISO 3166-1 alpha-2 code, e.g. `SG` -> 🇸🇬.
///
/// Each letter maps to a regional indicator symbol; the pair renders as the
/// country flag. Case is ignored. Anything other than two ASCII letters has
/// no flag.
pub fn flag_emoji(alpha2: &str) -> Option<String> {
    let code = alpha2.trim();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    code.chars()
        .map(|c| char::from_u32(c.to_ascii_uppercase() as u32 + REGIONAL_INDICATOR_OFFSET))
        .collect()
}
