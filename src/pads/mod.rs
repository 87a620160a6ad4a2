//! Pad definitions - the static key/label/sample table behind the board

/// One key-triggerable pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadDefinition {
    pub trigger_key: char,
    pub label: &'static str,
    pub audio_source: &'static str,
}

impl PadDefinition {
    pub const fn new(trigger_key: char, label: &'static str, audio_source: &'static str) -> Self {
        Self {
            trigger_key,
            label,
            audio_source,
        }
    }

    /// Last path segment of the audio source, e.g. `Heater-1.mp3`.
    pub fn file_name(&self) -> &'static str {
        file_name_of(self.audio_source)
    }
}

/// Last path segment of a URL or path, ignoring any query or fragment.
pub fn file_name_of(source: &str) -> &str {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

macro_rules! pad {
    ($key:literal, $label:literal, $file:literal) => {
        PadDefinition::new($key, $label, concat!(
            "https://s3.amazonaws.com/freecodecamp/drums/",
            $file
        ))
    };
}

/// The nine pads, in grid order (three rows of three).
pub const DEFAULT_KIT: [PadDefinition; 9] = [
    pad!('Q', "Heater 1", "Heater-1.mp3"),
    pad!('W', "Heater 2", "Heater-2.mp3"),
    pad!('E', "Heater 3", "Heater-3.mp3"),
    pad!('A', "Heater 4", "Heater-4_1.mp3"),
    pad!('S', "Clap", "Heater-6.mp3"),
    pad!('D', "Open-HH", "Dsc_Oh.mp3"),
    pad!('Z', "Kick-n'-Hat", "Kick_n_Hat.mp3"),
    pad!('X', "Kick", "RP4_KICK_1.mp3"),
    pad!('C', "Closed-HH", "Cev_H2.mp3"),
];

/// Number of pads per row when the kit is laid out as a grid.
pub const GRID_WIDTH: usize = 3;

/// An immutable, ordered set of pads. Pad indices are positions in this list.
#[derive(Debug, Clone, Copy)]
pub struct Kit {
    pads: &'static [PadDefinition],
}

impl Kit {
    pub const fn new(pads: &'static [PadDefinition]) -> Self {
        Self { pads }
    }

    pub fn pads(&self) -> &'static [PadDefinition] {
        self.pads
    }

    pub fn len(&self) -> usize {
        self.pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'static PadDefinition> {
        self.pads.get(index)
    }

    /// Position of the pad bound to `key`. Matching is exact; callers uppercase first.
    pub fn index_of(&self, key: char) -> Option<usize> {
        self.pads.iter().position(|pad| pad.trigger_key == key)
    }

    pub fn contains(&self, key: char) -> bool {
        self.index_of(key).is_some()
    }

    /// Pads chunked into rows of `width`, each entry paired with its index.
    pub fn rows(&self, width: usize) -> Vec<Vec<(usize, &'static PadDefinition)>> {
        let width = width.max(1);
        let indexed: Vec<_> = self.pads.iter().enumerate().collect();
        indexed.chunks(width).map(|row| row.to_vec()).collect()
    }
}

impl Default for Kit {
    fn default() -> Self {
        Self::new(&DEFAULT_KIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_kit_has_nine_unique_uppercase_keys() {
        let kit = Kit::default();
        assert_eq!(kit.len(), 9);

        let keys: HashSet<char> = kit.pads().iter().map(|p| p.trigger_key).collect();
        assert_eq!(keys.len(), 9);
        assert!(keys.iter().all(|k| k.is_ascii_uppercase()));
    }

    #[test]
    fn test_default_kit_keys_in_grid_order() {
        let keys: String = DEFAULT_KIT.iter().map(|p| p.trigger_key).collect();
        assert_eq!(keys, "QWEASDZXC");
    }

    #[test]
    fn test_index_of() {
        let kit = Kit::default();
        assert_eq!(kit.index_of('Q'), Some(0));
        assert_eq!(kit.index_of('C'), Some(8));
        assert_eq!(kit.index_of('G'), None);
        assert_eq!(kit.index_of('q'), None);
        assert_eq!(kit.get(6).map(|p| p.label), Some("Kick-n'-Hat"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(DEFAULT_KIT[0].file_name(), "Heater-1.mp3");
        assert_eq!(DEFAULT_KIT[3].file_name(), "Heater-4_1.mp3");
        assert!(DEFAULT_KIT
            .iter()
            .all(|p| p.audio_source.ends_with(p.file_name())));

        let local = PadDefinition::new('K', "Local", "kits/808/kick.wav?v=2");
        assert_eq!(local.file_name(), "kick.wav");
    }

    #[test]
    fn test_rows() {
        let kit = Kit::default();
        let rows = kit.rows(GRID_WIDTH);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert_eq!(rows[1][0].0, 3);
        assert_eq!(rows[1][0].1.trigger_key, 'A');
    }
}
