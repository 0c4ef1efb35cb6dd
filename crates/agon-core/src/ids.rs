//! Identifier and slug generation

use rand::Rng;
use uuid::Uuid;

/// Unique identifier for a participant
pub type ParticipantId = Uuid;

/// Unique identifier for a match
pub type MatchId = Uuid;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brisk", "calm", "clever", "crimson", "dusty", "eager", "fierce", "gentle",
    "hollow", "keen", "lucid", "mellow", "nimble", "quiet", "rapid", "stoic", "vivid", "wry",
];

const NOUNS: &[&str] = &[
    "badger", "falcon", "fox", "gannet", "heron", "ibis", "jackal", "kestrel", "lynx", "marten",
    "newt", "otter", "owl", "puffin", "raven", "stoat", "tern", "viper", "wren", "yak",
];

/// Generate a fresh opaque identifier
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// First six hex characters of an identifier
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..6].to_string()
}

/// Human-friendly, collision-resistant slug such as `brisk-otter-3f2a9c`
pub fn slug() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    format!("{}-{}-{}", adjective, noun, short_id(&new_id()))
}

/// Reduce arbitrary text to a lowercase, dash-separated path segment
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}
