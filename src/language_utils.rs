/*!
 * Language code utilities for cache keying.
 *
 * Cache keys must treat "en", "EN" and "eng" as the same source
 * language, so codes are normalized to ISO 639-1 where one exists,
 * falling back to the lowercased input for anything unrecognized.
 */

use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Normalize a language code for cache keying
///
/// Prefers the ISO 639-1 (2-letter) form; unrecognized codes pass
/// through lowercased so keying never fails on exotic input.
pub fn normalize_language_code(code: &str) -> String {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 {
        if Language::from_639_1(&normalized).is_some() {
            return normalized;
        }
    } else if normalized.len() == 3 {
        let part2t = part2b_to_part2t(&normalized).unwrap_or(&normalized);
        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(part1) = lang.to_639_1() {
                return part1.to_string();
            }
            return part2t.to_string();
        }
    }

    normalized
}

/// Whether two language codes refer to the same language
pub fn language_codes_match(a: &str, b: &str) -> bool {
    normalize_language_code(a) == normalize_language_code(b)
}
