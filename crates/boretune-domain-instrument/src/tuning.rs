use crate::error::GeometryError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub name: Option<String>,
    pub frequency: Option<f64>,
    pub frequency_min: Option<f64>,
    pub frequency_max: Option<f64>,
}

impl Note {
    pub fn new(name: impl Into<String>, frequency: f64) -> Self {
        Self {
            name: Some(name.into()),
            frequency: Some(frequency),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, frequency_min: f64, frequency_max: f64) -> Self {
        self.frequency_min = Some(frequency_min);
        self.frequency_max = Some(frequency_max);
        self
    }

    /// Nominal frequency, else the geometric mean of the range, else
    /// whichever range bound is known.
    pub fn target_frequency(&self) -> Option<f64> {
        if let Some(f) = self.frequency {
            return Some(f);
        }
        match (self.frequency_min, self.frequency_max) {
            (Some(lo), Some(hi)) => Some((lo * hi).sqrt()),
            (Some(lo), None) => Some(lo),
            (None, Some(hi)) => Some(hi),
            (None, None) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.name, self.target_frequency()) {
            (Some(name), _) => name.clone(),
            (None, Some(f)) => format!("{f:.2} Hz"),
            (None, None) => "<unnamed>".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fingering {
    pub note: Option<Note>,
    pub open_holes: Vec<bool>,
    pub open_end: Option<bool>,
    pub optimization_weight: Option<u32>,
}

impl Fingering {
    pub fn new(note: Option<Note>, open_holes: Vec<bool>) -> Self {
        Self {
            note,
            open_holes,
            open_end: None,
            optimization_weight: None,
        }
    }

    pub fn all_open(hole_count: usize) -> Self {
        Self::new(None, vec![true; hole_count])
    }

    pub fn is_open_end(&self) -> bool {
        self.open_end.unwrap_or(true)
    }

    pub fn weight(&self) -> f64 {
        f64::from(self.optimization_weight.unwrap_or(1))
    }

    pub fn target_frequency(&self) -> Option<f64> {
        self.note.as_ref().and_then(Note::target_frequency)
    }

    pub fn display_name(&self) -> String {
        self.note
            .as_ref()
            .map(Note::display_name)
            .unwrap_or_else(|| "<no note>".to_string())
    }

    pub fn check_hole_count(&self, expected: usize) -> Result<(), GeometryError> {
        if self.open_holes.len() != expected {
            return Err(GeometryError::HoleCountMismatch {
                expected,
                found: self.open_holes.len(),
                note: self.display_name(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub name: String,
    pub number_of_holes: usize,
    pub fingerings: Vec<Fingering>,
}

impl Tuning {
    pub fn new(name: impl Into<String>, number_of_holes: usize, fingerings: Vec<Fingering>) -> Self {
        Self {
            name: name.into(),
            number_of_holes,
            fingerings,
        }
    }

    pub fn check_hole_count(&self, expected: usize) -> Result<(), GeometryError> {
        self.fingerings
            .iter()
            .try_for_each(|f| f.check_hole_count(expected))
    }

    /// Indices of the fingerings with the lowest and highest target
    /// frequency. `None` when no fingering has a target.
    pub fn extreme_targets(&self) -> Option<(usize, usize)> {
        let targets = || {
            self.fingerings
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.target_frequency().map(|t| (i, t)))
        };
        let low = targets().min_by(|a, b| a.1.total_cmp(&b.1))?;
        let high = targets().max_by(|a, b| a.1.total_cmp(&b.1))?;
        Some((low.0, high.0))
    }
}
