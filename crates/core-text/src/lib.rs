//! Line text primitives for mushaf layout.
//!
//! * `segment` splits a rendering line into words and classified spaces.
//! * `letters` holds the Arabic letter classes the stretch and tajweed rules
//!   key on.
//! * `spans` maps regex byte offsets to char indices and extracts named
//!   capture spans.
//!
//! All indices exposed by this crate are char (code point) indices into the
//! line text. Mushaf text lives in the Basic Multilingual Plane, so these
//! coincide with UTF-16 offsets used by most shaping front ends.

pub mod letters;
pub mod segment;
pub mod spans;

pub use letters::{LetterClass, is_base, is_last_base};
pub use segment::{LineTextInfo, SpaceType, WordInfo, segment};
pub use spans::{CharOffsets, NamedSpan, named_spans};
