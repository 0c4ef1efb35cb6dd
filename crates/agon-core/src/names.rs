//! Identity to display-name lookup for rendering transcripts

use std::collections::HashMap;

use crate::ids::ParticipantId;

#[derive(Debug, Clone, Default)]
pub struct DisplayNames {
    names: HashMap<ParticipantId, String>,
}

impl DisplayNames {
    pub fn insert(&mut self, id: ParticipantId, name: &str) {
        self.names.insert(id, name.to_string());
    }

    /// Display name, or `"unknown"` for an unregistered id
    pub fn name_of(&self, id: &ParticipantId) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or("unknown")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> FromIterator<(ParticipantId, &'a str)> for DisplayNames {
    fn from_iter<I: IntoIterator<Item = (ParticipantId, &'a str)>>(iter: I) -> Self {
        let mut names = Self::default();
        for (id, name) in iter {
            names.insert(id, name);
        }
        names
    }
}
