//! Arabic letter classes used for word shape decisions.
//!
//! Only the letters the mushaf font distinguishes are modelled: the two
//! joining groups that make up "base" letters, plus the smaller sets the
//! stretch rules key on. Diacritics (harakat, tanween, Quranic annotation
//! signs) are never base letters.

use bitflags::bitflags;

/// Letters that join on both sides.
pub const DUAL_JOINING: &str = "بتثجحخسشصضطظعغفقكلمنهيئى";
/// Letters that join only to the preceding letter.
pub const RIGHT_JOINING: &str = "ادذرزوؤأٱإءة";
/// Letters whose final/isolated forms have dedicated alternates in the font.
pub const FINAL_ALTERNATES: &str = "ىصضسشفقبتثنكيئ";
/// Beh-shaped letters (share the tooth glyph and accept `cv10`).
pub const BEH_SHAPED: &str = "بتثنيئ";

pub const VERSE_END: char = '\u{06DD}';
pub const FATHA: char = '\u{064E}';

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LetterClass: u8 {
        const DUAL_JOINING = 0b0001;
        const RIGHT_JOINING = 0b0010;
        const BEH_SHAPED = 0b0100;
        const FINAL_ALTERNATE = 0b1000;
        const BASE = Self::DUAL_JOINING.bits() | Self::RIGHT_JOINING.bits();
    }
}

/// Classify a single character. Non-letters yield an empty set.
pub fn classify(c: char) -> LetterClass {
    let mut class = LetterClass::empty();
    if DUAL_JOINING.contains(c) {
        class |= LetterClass::DUAL_JOINING;
    }
    if RIGHT_JOINING.contains(c) {
        class |= LetterClass::RIGHT_JOINING;
    }
    if BEH_SHAPED.contains(c) {
        class |= LetterClass::BEH_SHAPED;
    }
    if FINAL_ALTERNATES.contains(c) {
        class |= LetterClass::FINAL_ALTERNATE;
    }
    class
}

pub fn is_base(c: char) -> bool {
    classify(c).intersects(LetterClass::BASE)
}

pub fn is_dual_joining(c: char) -> bool {
    DUAL_JOINING.contains(c)
}

pub fn is_right_joining(c: char) -> bool {
    RIGHT_JOINING.contains(c)
}

pub fn is_beh_shaped(c: char) -> bool {
    BEH_SHAPED.contains(c)
}

/// Arabic-Indic digits (U+0660..=U+0669) carry verse numbers.
pub fn is_arabic_indic_digit(c: char) -> bool {
    ('\u{0660}'..='\u{0669}').contains(&c)
}

/// Nonspacing marks of the Arabic blocks that appear in mushaf text.
///
/// Small waw and small yeh (U+06E5, U+06E6) are modifier letters, not marks,
/// and the verse-end sign U+06DD is a format character.
pub fn is_mark(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E4}'
        | '\u{06E7}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
        | '\u{08D3}'..='\u{08E1}'
        | '\u{08E3}'..='\u{08FF}')
}

/// True when no base letter follows `index` in `word`.
pub fn is_last_base(word: &[char], index: usize) -> bool {
    word.iter().skip(index + 1).all(|&c| !is_base(c))
}
