/*!
 * Locale code utilities.
 *
 * The content store identifies locales with BCP 47 style tags such as
 * `en`, `zh-Hans` or `pt-BR`. The translation engine wants upper-case codes
 * with its own set of regional variants. This module validates store
 * locales and maps them to engine codes.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Primary language subtag of a locale, lower-cased (`zh-Hans` -> `zh`)
pub fn primary_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Region or script subtag of a locale, if any (`zh-Hans` -> `Hans`)
pub fn secondary_subtag(locale: &str) -> Option<&str> {
    locale.trim().split(['-', '_']).nth(1).filter(|s| !s.is_empty())
}

/// Validate that a locale's primary subtag is an ISO 639-1 code
pub fn validate_locale(locale: &str) -> Result<Language> {
    let primary = primary_subtag(locale);
    if primary.len() != 2 {
        return Err(anyhow!("Invalid locale code: {}", locale));
    }
    Language::from_639_1(&primary).ok_or_else(|| anyhow!("Invalid locale code: {}", locale))
}

/// English name of a locale's language, used in log messages
pub fn get_language_name(locale: &str) -> Result<String> {
    let lang = validate_locale(locale)?;
    Ok(lang.to_name().to_string())
}

/// Map a store locale to the engine's target language code
///
/// Chinese script/region variants map to `ZH-HANS`/`ZH-HANT`, English and
/// Portuguese get an explicit regional variant because the engine no longer
/// accepts the bare code as a target, everything else becomes the upper-cased
/// primary subtag.
pub fn to_engine_code(locale: &str) -> Result<String> {
    validate_locale(locale)?;
    let primary = primary_subtag(locale);
    let secondary = secondary_subtag(locale).map(|s| s.to_lowercase());

    let code = match (primary.as_str(), secondary.as_deref()) {
        ("zh", Some("hant" | "tw" | "hk" | "mo")) => "ZH-HANT".to_string(),
        ("zh", _) => "ZH-HANS".to_string(),
        ("en", Some("gb" | "uk")) => "EN-GB".to_string(),
        ("en", _) => "EN-US".to_string(),
        ("pt", Some("br")) => "PT-BR".to_string(),
        ("pt", _) => "PT-PT".to_string(),
        (other, _) => other.to_uppercase(),
    };

    Ok(code)
}

/// Check if two locale codes name the same locale, ignoring case and separator
pub fn locale_codes_match(code1: &str, code2: &str) -> bool {
    let normalize = |c: &str| c.trim().replace('_', "-").to_lowercase();
    normalize(code1) == normalize(code2)
}
