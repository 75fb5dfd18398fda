//! Detection of filler-only speech.
//!
//! Backchannels ("uh-huh", "yeah", "okay") and bare function words carry no
//! requirement content and must never start or extend a turn.

const FILLER_WORDS: &[&str] = &[
    "uh", "um", "ah", "hmm", "mhmm", "uh-huh", "yeah", "yep", "yes", "no", "okay", "ok",
    "alright", "sure", "right", "got", "gotcha", "nice", "oh", "well", "so", "like", "wait",
    "but", "and", "the", "is", "are", "it", "to", "from", "in", "on", "at", "for", "with",
    "this", "that",
];

/// True when `text` contains nothing but filler tokens.
///
/// Tokens are split on whitespace, lower-cased and stripped of trailing
/// `.`, `?`, `!` and `,`. Empty input counts as filler.
pub fn is_filler(text: &str) -> bool {
    text.split_whitespace().all(|token| {
        let word = token
            .trim_end_matches(['.', '?', '!', ','])
            .to_lowercase();
        word.is_empty() || FILLER_WORDS.contains(&word.as_str())
    })
}
