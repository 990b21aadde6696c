use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthUnit {
    Millimetres,
    Centimetres,
    Metres,
    Inches,
    Feet,
}

impl LengthUnit {
    pub fn to_metres(self) -> f64 {
        match self {
            LengthUnit::Millimetres => 0.001,
            LengthUnit::Centimetres => 0.01,
            LengthUnit::Metres => 1.0,
            LengthUnit::Inches => 0.0254,
            LengthUnit::Feet => 0.3048,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorePoint {
    pub position: f64,
    pub diameter: f64,
}

impl BorePoint {
    pub fn new(position: f64, diameter: f64) -> Self {
        Self { position, diameter }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    pub name: Option<String>,
    pub position: f64,
    pub diameter: f64,
    /// Chimney height, the wall thickness at the hole.
    pub height: f64,
}

impl Hole {
    pub fn new(position: f64, diameter: f64, height: f64) -> Self {
        Self {
            name: None,
            position,
            diameter,
            height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MouthpieceKind {
    Fipple {
        window_length: f64,
        window_width: f64,
        window_height: Option<f64>,
        windway_length: Option<f64>,
        windway_height: Option<f64>,
        fipple_factor: Option<f64>,
    },
    Embouchure {
        length: f64,
        width: f64,
        height: f64,
        air_stream_length: Option<f64>,
        air_stream_depth: Option<f64>,
    },
    SingleReed {
        alpha: Option<f64>,
    },
    DoubleReed {
        alpha: Option<f64>,
    },
    LipReed {
        alpha: Option<f64>,
    },
}

impl MouthpieceKind {
    pub fn is_reed(&self) -> bool {
        matches!(
            self,
            MouthpieceKind::SingleReed { .. }
                | MouthpieceKind::DoubleReed { .. }
                | MouthpieceKind::LipReed { .. }
        )
    }

    /// Distance the air jet travels before it meets the edge, if the
    /// mouthpiece is jet driven.
    pub fn jet_length(&self) -> Option<f64> {
        match self {
            MouthpieceKind::Fipple { window_length, .. } => Some(*window_length),
            MouthpieceKind::Embouchure {
                length,
                air_stream_length,
                ..
            } => Some(air_stream_length.unwrap_or(*length)),
            _ => None,
        }
    }

    fn scale(&mut self, factor: f64) {
        match self {
            MouthpieceKind::Fipple {
                window_length,
                window_width,
                window_height,
                windway_length,
                windway_height,
                ..
            } => {
                *window_length *= factor;
                *window_width *= factor;
                scale_opt(window_height, factor);
                scale_opt(windway_length, factor);
                scale_opt(windway_height, factor);
            }
            MouthpieceKind::Embouchure {
                length,
                width,
                height,
                air_stream_length,
                air_stream_depth,
            } => {
                *length *= factor;
                *width *= factor;
                *height *= factor;
                scale_opt(air_stream_length, factor);
                scale_opt(air_stream_depth, factor);
            }
            MouthpieceKind::SingleReed { .. }
            | MouthpieceKind::DoubleReed { .. }
            | MouthpieceKind::LipReed { .. } => {}
        }
    }
}

fn scale_opt(value: &mut Option<f64>, factor: f64) {
    if let Some(v) = value.as_mut() {
        *v *= factor;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mouthpiece {
    pub position: f64,
    pub beta: Option<f64>,
    pub gain_factor: Option<f64>,
    pub kind: MouthpieceKind,
}

impl Mouthpiece {
    pub fn new(position: f64, kind: MouthpieceKind) -> Self {
        Self {
            position,
            beta: None,
            gain_factor: None,
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Termination {
    pub flange_diameter: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub unit: LengthUnit,
    pub mouthpiece: Mouthpiece,
    pub bore_points: Vec<BorePoint>,
    pub holes: Vec<Hole>,
    pub termination: Termination,
}

impl Instrument {
    pub fn new(
        name: impl Into<String>,
        unit: LengthUnit,
        mouthpiece: Mouthpiece,
        bore_points: Vec<BorePoint>,
        holes: Vec<Hole>,
        termination: Termination,
    ) -> Self {
        let mut instrument = Self {
            name: name.into(),
            unit,
            mouthpiece,
            bore_points,
            holes,
            termination,
        };
        instrument.sort();
        instrument
    }

    /// Restores position order. Stable, so a diameter step (two points at
    /// one position) keeps its orientation.
    pub fn sort(&mut self) {
        self.bore_points
            .sort_by(|a, b| a.position.total_cmp(&b.position));
        self.holes.sort_by(|a, b| a.position.total_cmp(&b.position));
    }

    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    pub fn bore_top(&self) -> Option<f64> {
        self.bore_points.first().map(|p| p.position)
    }

    pub fn bore_bottom(&self) -> Option<f64> {
        self.bore_points.last().map(|p| p.position)
    }

    pub fn bore_length(&self) -> f64 {
        match (self.bore_top(), self.bore_bottom()) {
            (Some(top), Some(bottom)) => bottom - top,
            _ => 0.0,
        }
    }

    /// Linear interpolation of the bore profile, clamped at both ends. At a
    /// step the downstream diameter wins.
    pub fn bore_diameter_at(&self, position: f64) -> Option<f64> {
        let points = &self.bore_points;
        let first = points.first()?;
        let last = points.last()?;
        if position < first.position {
            return Some(first.diameter);
        }
        if position >= last.position {
            return Some(last.diameter);
        }
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.position <= position && position < b.position {
                let span = b.position - a.position;
                let t = (position - a.position) / span;
                return Some(a.diameter + t * (b.diameter - a.diameter));
            }
        }
        Some(last.diameter)
    }

    pub fn convert_to(&self, unit: LengthUnit) -> Instrument {
        if unit == self.unit {
            return self.clone();
        }
        let factor = self.unit.to_metres() / unit.to_metres();
        let mut out = self.clone();
        out.unit = unit;
        out.mouthpiece.position *= factor;
        out.mouthpiece.kind.scale(factor);
        for point in &mut out.bore_points {
            point.position *= factor;
            point.diameter *= factor;
        }
        for hole in &mut out.holes {
            hole.position *= factor;
            hole.diameter *= factor;
            hole.height *= factor;
        }
        out.termination.flange_diameter *= factor;
        out
    }

    pub fn to_metres(&self) -> Instrument {
        self.convert_to(LengthUnit::Metres)
    }
}
