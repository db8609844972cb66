// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalisation.

/// Normalises to E.164: every non-digit is dropped and `+` prepended.
pub fn to_e164(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    format!("+{digits}")
}

/// The other spelling of a Brazilian mobile number.
///
/// Brazilian mobiles gained a leading `9` after the area code; WhatsApp
/// still reports many accounts in the old eight-digit form. Returns the
/// form with the ninth digit removed or added, or `None` when `e164` is not
/// a Brazilian mobile number.
pub fn brazil_alternate(e164: &str) -> Option<String> {
    let digits = e164.strip_prefix('+').unwrap_or(e164);
    let rest = digits.strip_prefix("55")?;
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (area, subscriber) = rest.split_at_checked(2)?;
    match subscriber.len() {
        9 if subscriber.starts_with('9') => Some(format!("+55{area}{}", &subscriber[1..])),
        8 if subscriber.starts_with(['6', '7', '8', '9']) => {
            Some(format!("+55{area}9{subscriber}"))
        }
        _ => None,
    }
}
