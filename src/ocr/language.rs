//! Language detection for extracted text
//!
//! Scores Unicode scripts first (Arabic, Cyrillic, CJK, ...) and falls back
//! to stopword frequency to tell Latin-script languages apart.

use thiserror::Error;

/// Code reported when the language cannot be determined
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Texts shorter than this (after trimming) are not sent to a detector
pub const MIN_DETECTION_CHARS: usize = 10;

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("no language features found in text")]
    NoFeatures,
}

/// Detects the primary language of a text
pub trait LanguageDetector: Send + Sync {
    /// Return an ISO 639-1 code
    fn detect(&self, text: &str) -> Result<String, LanguageError>;
}

/// Detect a language, mapping short texts and detector errors to `unknown`
pub fn detect_or_unknown(detector: &dyn LanguageDetector, text: &str) -> String {
    if text.trim().chars().count() < MIN_DETECTION_CHARS {
        return UNKNOWN_LANGUAGE.to_string();
    }

    match detector.detect(text) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = %e, "Language detection failed");
            UNKNOWN_LANGUAGE.to_string()
        }
    }
}

const LATIN_STOPWORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &["the", "and", "of", "to", "is", "in", "that", "with", "for", "this", "are", "was"],
    ),
    (
        "fr",
        &["le", "la", "les", "et", "des", "est", "une", "dans", "pour", "que", "avec", "sur"],
    ),
    (
        "es",
        &["el", "los", "las", "y", "del", "es", "una", "en", "por", "que", "con", "para"],
    ),
    (
        "de",
        &["der", "die", "das", "und", "ist", "nicht", "mit", "ein", "eine", "zu", "auf", "für"],
    ),
];

/// Heuristic detector based on character scripts and stopwords
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptLanguageDetector;

#[derive(Default)]
struct ScriptCounts {
    arabic: usize,
    hebrew: usize,
    cyrillic: usize,
    cjk: usize,
    latin: usize,
}

impl ScriptCounts {
    fn tally(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            match c as u32 {
                0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF
                | 0xFE70..=0xFEFF => counts.arabic += 1,
                0x0590..=0x05FF => counts.hebrew += 1,
                0x0400..=0x04FF => counts.cyrillic += 1,
                0x3040..=0x30FF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF => counts.cjk += 1,
                _ if c.is_ascii_alphabetic() => counts.latin += 1,
                0x00C0..=0x024F => counts.latin += 1,
                _ => {}
            }
        }
        counts
    }
}

impl ScriptLanguageDetector {
    fn latin_language(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();

        let mut best = ("en", 0usize);
        for (code, stopwords) in LATIN_STOPWORDS {
            let score = words.iter().filter(|w| stopwords.contains(w)).count();
            if score > best.1 {
                best = (code, score);
            }
        }
        best.0
    }
}

impl LanguageDetector for ScriptLanguageDetector {
    fn detect(&self, text: &str) -> Result<String, LanguageError> {
        let counts = ScriptCounts::tally(text);

        let scripts = [
            ("ar", counts.arabic),
            ("he", counts.hebrew),
            ("ru", counts.cyrillic),
            ("zh", counts.cjk),
        ];
        let (code, count) = scripts
            .iter()
            .copied()
            .max_by_key(|(_, count)| *count)
            .unwrap_or(("", 0));

        if count == 0 && counts.latin == 0 {
            return Err(LanguageError::NoFeatures);
        }

        if count > counts.latin {
            return Ok(code.to_string());
        }

        Ok(Self::latin_language(text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenDetector;

    impl LanguageDetector for BrokenDetector {
        fn detect(&self, _text: &str) -> Result<String, LanguageError> {
            Err(LanguageError::NoFeatures)
        }
    }

    struct PanickyDetector;

    impl LanguageDetector for PanickyDetector {
        fn detect(&self, _text: &str) -> Result<String, LanguageError> {
            panic!("detector must not be called for short text");
        }
    }

    #[test]
    fn test_detects_arabic() {
        let text = "هذا نص عربي لاختبار كشف اللغة في المستند";
        assert_eq!(ScriptLanguageDetector.detect(text).unwrap(), "ar");
    }

    #[test]
    fn test_detects_english_and_french() {
        let en = "The patient was admitted to the clinic and the results are normal.";
        let fr = "Le patient est dans la clinique et les résultats sont pour une analyse.";
        assert_eq!(ScriptLanguageDetector.detect(en).unwrap(), "en");
        assert_eq!(ScriptLanguageDetector.detect(fr).unwrap(), "fr");
    }

    #[test]
    fn test_no_letters_is_an_error() {
        assert!(ScriptLanguageDetector.detect("12345 67890 !!!").is_err());
    }

    #[test]
    fn test_short_text_skips_detector() {
        assert_eq!(detect_or_unknown(&PanickyDetector, "  short  "), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_detector_error_maps_to_unknown() {
        let text = "long enough text for detection";
        assert_eq!(detect_or_unknown(&BrokenDetector, text), UNKNOWN_LANGUAGE);
        assert_eq!(detect_or_unknown(&ScriptLanguageDetector, text), "en");
    }
}
