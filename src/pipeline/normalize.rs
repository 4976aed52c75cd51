//! Arabic text normalization for extracted circulaire text.
//!
//! PDF generators and OCR both emit Arabic in Presentation Forms-B
//! (positional glyph variants, U+FE70..U+FEFF) instead of logical base
//! letters. Matching section headings by regex only works on the base
//! letters, so every extracted page goes through [`normalize_arabic`]
//! before any parsing.

use unicode_normalization::UnicodeNormalization;

/// Map a Presentation Forms glyph (or Arabic-Indic digit) to its base form.
///
/// Lam-alef ligatures expand to the two-letter sequence. Returns `None`
/// for characters outside the table; those fall through to NFKC.
fn presentation_form(c: char) -> Option<&'static str> {
    let base = match c {
        // Alef
        '\u{FE8D}' | '\u{FE8E}' => "\u{0627}",
        // Beh
        '\u{FE8F}'..='\u{FE92}' => "\u{0628}",
        // Teh marbuta
        '\u{FE93}' | '\u{FE94}' => "\u{0629}",
        // Teh
        '\u{FE95}'..='\u{FE98}' => "\u{062A}",
        // Theh
        '\u{FE99}'..='\u{FE9C}' => "\u{062B}",
        // Jeem
        '\u{FE9D}'..='\u{FEA0}' => "\u{062C}",
        // Hah
        '\u{FEA1}'..='\u{FEA4}' => "\u{062D}",
        // Khah
        '\u{FEA5}'..='\u{FEA8}' => "\u{062E}",
        // Dal
        '\u{FEA9}' | '\u{FEAA}' => "\u{062F}",
        // Thal
        '\u{FEAB}' | '\u{FEAC}' => "\u{0630}",
        // Reh
        '\u{FEAD}' | '\u{FEAE}' => "\u{0631}",
        // Zain
        '\u{FEAF}' | '\u{FEB0}' => "\u{0632}",
        // Seen
        '\u{FEB1}'..='\u{FEB4}' => "\u{0633}",
        // Sheen
        '\u{FEB5}'..='\u{FEB8}' => "\u{0634}",
        // Sad
        '\u{FEB9}'..='\u{FEBC}' => "\u{0635}",
        // Dad
        '\u{FEBD}'..='\u{FEC0}' => "\u{0636}",
        // Tah
        '\u{FEC1}'..='\u{FEC4}' => "\u{0637}",
        // Zah
        '\u{FEC5}'..='\u{FEC8}' => "\u{0638}",
        // Ain
        '\u{FEC9}'..='\u{FECC}' => "\u{0639}",
        // Ghain
        '\u{FECD}'..='\u{FED0}' => "\u{063A}",
        // Feh
        '\u{FED1}'..='\u{FED4}' => "\u{0641}",
        // Qaf
        '\u{FED5}'..='\u{FED8}' => "\u{0642}",
        // Kaf
        '\u{FED9}'..='\u{FEDC}' => "\u{0643}",
        // Lam
        '\u{FEDD}'..='\u{FEE0}' => "\u{0644}",
        // Meem
        '\u{FEE1}'..='\u{FEE4}' => "\u{0645}",
        // Noon
        '\u{FEE5}'..='\u{FEE8}' => "\u{0646}",
        // Heh
        '\u{FEE9}'..='\u{FEEC}' => "\u{0647}",
        // Waw
        '\u{FEED}' | '\u{FEEE}' => "\u{0648}",
        // Alef maksura
        '\u{FEEF}' | '\u{FEF0}' => "\u{0649}",
        // Yeh
        '\u{FEF1}'..='\u{FEF4}' => "\u{064A}",
        // Lam-alef ligatures (madda/hamza variants included)
        '\u{FEF5}'..='\u{FEFC}' => "\u{0644}\u{0627}",
        // Hamza
        '\u{FE80}' => "\u{0621}",
        // Alef with madda
        '\u{FE81}' | '\u{FE82}' => "\u{0622}",
        // Alef with hamza above
        '\u{FE83}' | '\u{FE84}' => "\u{0623}",
        // Waw with hamza
        '\u{FE85}' | '\u{FE86}' => "\u{0624}",
        // Alef with hamza below
        '\u{FE87}' | '\u{FE88}' => "\u{0625}",
        // Yeh with hamza
        '\u{FE89}'..='\u{FE8C}' => "\u{0626}",
        // Arabic-Indic digits
        '\u{0660}' => "0",
        '\u{0661}' => "1",
        '\u{0662}' => "2",
        '\u{0663}' => "3",
        '\u{0664}' => "4",
        '\u{0665}' => "5",
        '\u{0666}' => "6",
        '\u{0667}' => "7",
        '\u{0668}' => "8",
        '\u{0669}' => "9",
        _ => return None,
    };
    Some(base)
}

/// Rewrite presentation-form glyphs to base letters and pass everything else
/// through NFKC. Idempotent: a normalized string normalizes to itself.
pub fn normalize_arabic(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match presentation_form(c) {
            Some(base) => out.push_str(base),
            None => out.extend(std::iter::once(c).nfkc()),
        }
    }
    out
}

/// Count Arabic letters including the presentation-form ranges.
/// Runs on raw (pre-normalization) text when deciding whether a page
/// has enough embedded Arabic to skip OCR.
pub fn count_arabic_letters(text: &str) -> usize {
    text.chars()
        .filter(|c| {
            matches!(c,
                '\u{0600}'..='\u{06FF}'
                    | '\u{FB50}'..='\u{FDFF}'
                    | '\u{FE70}'..='\u{FEFF}')
        })
        .count()
}
