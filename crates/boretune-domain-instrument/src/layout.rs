use crate::error::GeometryError;
use crate::model::Instrument;

/// A conical (or cylindrical) piece of bore between two cut positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoreSection {
    pub length: f64,
    /// Radius at the end nearer the mouthpiece.
    pub left_radius: f64,
    pub right_radius: f64,
    pub right_position: f64,
}

impl BoreSection {
    pub fn is_cylinder(&self) -> bool {
        (self.left_radius - self.right_radius).abs() <= f64::EPSILON * self.left_radius
    }

    /// The same section seen from the other end.
    pub fn reversed(&self) -> Self {
        Self {
            length: self.length,
            left_radius: self.right_radius,
            right_radius: self.left_radius,
            right_position: self.right_position - self.length,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoleSection {
    /// Position of the hole in the instrument's hole order.
    pub index: usize,
    pub position: f64,
    pub radius: f64,
    pub height: f64,
    pub bore_radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Component {
    Bore(BoreSection),
    Hole(HoleSection),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerminationSection {
    pub radius: f64,
    pub flange_radius: f64,
}

/// The instrument flattened into the order the transfer chain walks it.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentLayout {
    /// Closed cavity above the mouthpiece, ordered top to mouthpiece.
    pub headspace: Vec<BoreSection>,
    /// Mouthpiece to termination.
    pub components: Vec<Component>,
    pub mouthpiece_radius: f64,
    pub termination: TerminationSection,
    pub hole_count: usize,
}

impl ComponentLayout {
    /// Builds the layout of an instrument expressed in metres.
    pub fn build(instrument: &Instrument) -> Result<Self, GeometryError> {
        let points = &instrument.bore_points;
        if points.len() < 2 {
            return Err(GeometryError::TooFewBorePoints {
                found: points.len(),
            });
        }
        for point in points {
            positive("bore diameter", point.diameter)?;
        }
        for hole in &instrument.holes {
            positive("hole diameter", hole.diameter)?;
            if !(hole.height >= 0.0) {
                return Err(GeometryError::InvalidDimension {
                    what: "hole height".to_string(),
                    value: hole.height,
                });
            }
        }

        let top = points[0].position;
        let bottom = points[points.len() - 1].position;
        let mouthpiece = instrument.mouthpiece.position;
        if !(mouthpiece >= top && mouthpiece < bottom) {
            return Err(GeometryError::MouthpieceOutsideBore {
                position: mouthpiece,
                top,
                bottom,
            });
        }
        for (index, hole) in instrument.holes.iter().enumerate() {
            if !(hole.position > mouthpiece && hole.position <= bottom) {
                return Err(GeometryError::HoleOutsideBore {
                    index,
                    position: hole.position,
                    top: mouthpiece,
                    bottom,
                });
            }
        }

        let radius_at = |position: f64| {
            instrument
                .bore_diameter_at(position)
                .map(|d| 0.5 * d)
                .unwrap_or(0.5 * points[0].diameter)
        };
        let mouthpiece_radius = radius_at(mouthpiece);

        let mut headspace = Vec::new();
        let mut cur = top;
        let mut cur_r = 0.5 * points[0].diameter;
        for point in points.iter().skip(1) {
            let (pos, r) = if point.position < mouthpiece {
                (point.position, 0.5 * point.diameter)
            } else {
                (mouthpiece, mouthpiece_radius)
            };
            if pos > cur {
                headspace.push(BoreSection {
                    length: pos - cur,
                    left_radius: cur_r,
                    right_radius: r,
                    right_position: pos,
                });
            }
            cur = pos;
            cur_r = r;
            if point.position >= mouthpiece {
                break;
            }
        }

        enum Cut {
            Point(f64),
            Hole(usize),
        }
        let mut cuts: Vec<(f64, Cut)> = points
            .iter()
            .filter(|p| p.position > mouthpiece)
            .map(|p| (p.position, Cut::Point(0.5 * p.diameter)))
            .chain(
                instrument
                    .holes
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.position, Cut::Hole(i))),
            )
            .collect();
        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut components = Vec::with_capacity(cuts.len());
        let mut cur = mouthpiece;
        let mut cur_r = mouthpiece_radius;
        for (pos, cut) in cuts {
            let r = match cut {
                Cut::Point(r) => r,
                Cut::Hole(_) => radius_at(pos),
            };
            if pos > cur {
                components.push(Component::Bore(BoreSection {
                    length: pos - cur,
                    left_radius: cur_r,
                    right_radius: r,
                    right_position: pos,
                }));
            }
            cur = pos;
            cur_r = r;
            if let Cut::Hole(index) = cut {
                let hole = &instrument.holes[index];
                components.push(Component::Hole(HoleSection {
                    index,
                    position: pos,
                    radius: 0.5 * hole.diameter,
                    height: hole.height,
                    bore_radius: r,
                }));
            }
        }

        Ok(Self {
            headspace,
            components,
            mouthpiece_radius,
            termination: TerminationSection {
                radius: 0.5 * points[points.len() - 1].diameter,
                flange_radius: 0.5 * instrument.termination.flange_diameter,
            },
            hole_count: instrument.holes.len(),
        })
    }

    pub fn bore_sections(&self) -> impl Iterator<Item = &BoreSection> {
        self.components.iter().filter_map(|c| match c {
            Component::Bore(b) => Some(b),
            Component::Hole(_) => None,
        })
    }

    /// Length of bore from the mouthpiece to the termination.
    pub fn playing_length(&self) -> f64 {
        self.bore_sections().map(|b| b.length).sum()
    }
}

fn positive(what: &str, value: f64) -> Result<(), GeometryError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimension {
            what: what.to_string(),
            value,
        })
    }
}
