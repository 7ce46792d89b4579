use std::io::{self, Write};

/// Value text that marks a footprint as a mounting hole.
pub const MOUNTING_HOLE_MARKER: &str = "MountingHole";

/// Case-sensitive substring test on a footprint's value text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    marker: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(MOUNTING_HOLE_MARKER)
    }
}

impl Classifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_mounting_hole(&self, label: &str) -> bool {
        label.contains(self.marker.as_str())
    }

    /// Classify `label` and write one match/no-match line to `out`.
    pub fn classify<W: Write + ?Sized>(&self, label: &str, out: &mut W) -> io::Result<bool> {
        let matched = self.is_mounting_hole(label);
        if matched {
            writeln!(out, "{label} DOES match key mounting hole")?;
        } else {
            writeln!(out, "{label} does not match mounting hole")?;
        }
        log::debug!("classified {label:?} against {:?}: {matched}", self.marker);
        Ok(matched)
    }
}
