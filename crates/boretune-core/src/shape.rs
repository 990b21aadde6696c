use crate::objective::ObjectiveError;
use boretune_domain_instrument::{Instrument, MouthpieceKind};
use serde::{Deserialize, Serialize};

/// How the bore profile follows a change of bore length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoreLengthAdjustment {
    /// Only the bottom point moves. Points it passes are pulled up with it.
    #[default]
    MoveBottom,
    /// All points are scaled about the top of the bore.
    PreserveTaper,
    /// Points below the lowest hole (only the bottom point when there are no
    /// holes) shift with the bottom. Points the bell passes when shortening
    /// are pulled up to its top.
    PreserveBell,
}

/// Contiguous runs of holes, top to bottom, that share one value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleGrouping {
    groups: Vec<Vec<usize>>,
}

impl HoleGrouping {
    pub fn new(groups: Vec<Vec<usize>>) -> Self {
        Self { groups }
    }

    /// Every hole in a group of its own.
    pub fn individual(hole_count: usize) -> Self {
        Self::new((0..hole_count).map(|i| vec![i]).collect())
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups must list `0..hole_count` in order, none of them empty.
    pub fn validate(&self, hole_count: usize) -> Result<(), ObjectiveError> {
        if let Some(index) = self.groups.iter().position(Vec::is_empty) {
            return Err(ObjectiveError::InvalidGrouping(format!("group {index} is empty")));
        }
        let flat: Vec<usize> = self.groups.iter().flatten().copied().collect();
        if flat.len() != hole_count || flat.iter().enumerate().any(|(i, &h)| i != h) {
            return Err(ObjectiveError::InvalidGrouping(format!(
                "groups {:?} do not cover holes 0..{hole_count} in order",
                self.groups
            )));
        }
        Ok(())
    }

    fn shared_spacings(&self) -> usize {
        self.groups.iter().filter(|g| g.len() > 1).count()
    }
}

/// One free part of the instrument geometry.
///
/// Lengths and diameters are in metres; ratios are dimensionless.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometryAxis {
    /// Distance from the top to the bottom bore point.
    BoreLength { adjustment: BoreLengthAdjustment },
    /// Bore length, then the hole spacings top to bottom (one shared value
    /// inside each group, one between consecutive groups), then the distance
    /// from the bottom hole to the end of the bore.
    HolePositions {
        grouping: Option<HoleGrouping>,
        adjustment: BoreLengthAdjustment,
    },
    /// One diameter per hole group.
    HoleSizes { grouping: Option<HoleGrouping> },
    /// Ratio of each of the bottom `points` bore diameters to the one above.
    BoreDiameterRatios { points: usize },
    WindowHeight,
    MouthpieceBeta,
}

impl GeometryAxis {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryAxis::BoreLength { .. } => "bore length",
            GeometryAxis::HolePositions { .. } => "hole positions",
            GeometryAxis::HoleSizes { .. } => "hole sizes",
            GeometryAxis::BoreDiameterRatios { .. } => "bore diameter ratios",
            GeometryAxis::WindowHeight => "window height",
            GeometryAxis::MouthpieceBeta => "mouthpiece beta",
        }
    }

    pub fn dimensions(&self, hole_count: usize) -> usize {
        match self {
            GeometryAxis::BoreLength { .. }
            | GeometryAxis::WindowHeight
            | GeometryAxis::MouthpieceBeta => 1,
            GeometryAxis::HolePositions { grouping, .. } => {
                let grouping = resolve(grouping, hole_count);
                let between = grouping.len().saturating_sub(1);
                1 + grouping.shared_spacings() + between + 1
            }
            GeometryAxis::HoleSizes { grouping } => resolve(grouping, hole_count).len(),
            GeometryAxis::BoreDiameterRatios { points } => *points,
        }
    }

    fn validate(&self, instrument: &Instrument) -> Result<(), ObjectiveError> {
        let hole_count = instrument.hole_count();
        match self {
            GeometryAxis::BoreLength { .. } | GeometryAxis::MouthpieceBeta => Ok(()),
            GeometryAxis::HolePositions { grouping, .. } => {
                if hole_count == 0 {
                    return Err(ObjectiveError::NeedsHoles { axis: self.name() });
                }
                resolve(grouping, hole_count).validate(hole_count)
            }
            GeometryAxis::HoleSizes { grouping } => {
                if hole_count == 0 {
                    return Err(ObjectiveError::NeedsHoles { axis: self.name() });
                }
                resolve(grouping, hole_count).validate(hole_count)
            }
            GeometryAxis::BoreDiameterRatios { points } => {
                let available = instrument.bore_points.len().saturating_sub(1);
                if *points == 0 || *points > available {
                    return Err(ObjectiveError::BorePointCount {
                        requested: *points,
                        available,
                    });
                }
                Ok(())
            }
            GeometryAxis::WindowHeight => window_height(&instrument.mouthpiece.kind)
                .map(|_| ())
                .ok_or(ObjectiveError::UnsupportedAxis {
                    axis: self.name(),
                    reason: "mouthpiece has no window or embouchure height",
                }),
        }
    }

    fn read(&self, instrument: &Instrument, out: &mut Vec<f64>) {
        match self {
            GeometryAxis::BoreLength { .. } => out.push(instrument.bore_length()),
            GeometryAxis::HolePositions { grouping, .. } => {
                let grouping = resolve(grouping, instrument.hole_count());
                let holes = &instrument.holes;
                out.push(instrument.bore_length());
                let groups = grouping.groups();
                for (g, group) in groups.iter().enumerate() {
                    if group.len() > 1 {
                        let span = holes[group[group.len() - 1]].position - holes[group[0]].position;
                        out.push(span / (group.len() - 1) as f64);
                    }
                    if let Some(next) = groups.get(g + 1) {
                        out.push(holes[next[0]].position - holes[group[group.len() - 1]].position);
                    }
                }
                let bottom = instrument.bore_bottom().unwrap_or(0.0);
                let last = holes.last().map_or(bottom, |h| h.position);
                out.push(bottom - last);
            }
            GeometryAxis::HoleSizes { grouping } => {
                let grouping = resolve(grouping, instrument.hole_count());
                for group in grouping.groups() {
                    let sum: f64 = group.iter().map(|&h| instrument.holes[h].diameter).sum();
                    out.push(sum / group.len() as f64);
                }
            }
            GeometryAxis::BoreDiameterRatios { points } => {
                let bore = &instrument.bore_points;
                for i in bore.len() - points..bore.len() {
                    out.push(bore[i].diameter / bore[i - 1].diameter);
                }
            }
            GeometryAxis::WindowHeight => {
                out.push(window_height(&instrument.mouthpiece.kind).unwrap_or(0.0))
            }
            GeometryAxis::MouthpieceBeta => out.push(instrument.mouthpiece.beta.unwrap_or(0.0)),
        }
    }

    fn apply(&self, instrument: &mut Instrument, values: &[f64]) {
        match self {
            GeometryAxis::BoreLength { adjustment } => {
                set_bore_length(instrument, values[0], *adjustment);
            }
            GeometryAxis::HolePositions {
                grouping,
                adjustment,
            } => {
                let grouping = resolve(grouping, instrument.hole_count());
                set_bore_length(instrument, values[0], *adjustment);
                let mut next = values[1..].iter().copied();
                let mut spacings = Vec::with_capacity(instrument.hole_count());
                let groups = grouping.groups();
                for (g, group) in groups.iter().enumerate() {
                    if group.len() > 1 {
                        let shared = next.next().unwrap_or(0.0);
                        spacings.extend(std::iter::repeat(shared).take(group.len() - 1));
                    }
                    if g + 1 < groups.len() {
                        spacings.push(next.next().unwrap_or(0.0));
                    }
                }
                let mut position =
                    instrument.bore_bottom().unwrap_or(0.0) - next.next().unwrap_or(0.0);
                let holes = &mut instrument.holes;
                for i in (0..holes.len()).rev() {
                    holes[i].position = position;
                    if i > 0 {
                        position -= spacings[i - 1];
                    }
                }
            }
            GeometryAxis::HoleSizes { grouping } => {
                let grouping = resolve(grouping, instrument.hole_count());
                for (group, &diameter) in grouping.groups().iter().zip(values) {
                    for &h in group {
                        instrument.holes[h].diameter = diameter;
                    }
                }
            }
            GeometryAxis::BoreDiameterRatios { points } => {
                let bore = &mut instrument.bore_points;
                let first = bore.len() - points;
                for (i, &ratio) in (first..bore.len()).zip(values) {
                    bore[i].diameter = bore[i - 1].diameter * ratio;
                }
            }
            GeometryAxis::WindowHeight => match &mut instrument.mouthpiece.kind {
                MouthpieceKind::Fipple { window_height, .. } => *window_height = Some(values[0]),
                MouthpieceKind::Embouchure { height, .. } => *height = values[0],
                _ => {}
            },
            GeometryAxis::MouthpieceBeta => instrument.mouthpiece.beta = Some(values[0]),
        }
    }
}

fn resolve(grouping: &Option<HoleGrouping>, hole_count: usize) -> HoleGrouping {
    grouping
        .clone()
        .unwrap_or_else(|| HoleGrouping::individual(hole_count))
}

fn window_height(kind: &MouthpieceKind) -> Option<f64> {
    match kind {
        MouthpieceKind::Fipple { window_height, .. } => *window_height,
        MouthpieceKind::Embouchure { height, .. } => Some(*height),
        _ => None,
    }
}

fn set_bore_length(instrument: &mut Instrument, length: f64, adjustment: BoreLengthAdjustment) {
    let (Some(top), Some(bottom)) = (instrument.bore_top(), instrument.bore_bottom()) else {
        return;
    };
    let new_bottom = top + length;
    let lowest_hole = instrument.holes.last().map(|h| h.position);
    let points = &mut instrument.bore_points;
    match adjustment {
        BoreLengthAdjustment::MoveBottom => {
            for point in points.iter_mut() {
                point.position = point.position.min(new_bottom);
            }
            if let Some(last) = points.last_mut() {
                last.position = new_bottom;
            }
        }
        BoreLengthAdjustment::PreserveTaper => {
            let old = bottom - top;
            if old > 0.0 {
                let factor = length / old;
                for point in points.iter_mut() {
                    point.position = top + (point.position - top) * factor;
                }
            }
        }
        BoreLengthAdjustment::PreserveBell => {
            let delta = new_bottom - bottom;
            let count = points.len();
            let in_bell: Vec<bool> = points
                .iter()
                .enumerate()
                .map(|(i, point)| {
                    i + 1 == count || lowest_hole.is_some_and(|hole| point.position > hole)
                })
                .collect();
            let mut bell_top = new_bottom;
            for (point, _) in points.iter_mut().zip(&in_bell).filter(|(_, moves)| **moves) {
                point.position += delta;
                bell_top = bell_top.min(point.position);
            }
            // Points the bell passes on the way up collapse onto its top.
            for (point, _) in points.iter_mut().zip(&in_bell).filter(|(_, moves)| !**moves) {
                point.position = point.position.min(bell_top);
            }
        }
    }
    instrument.sort();
}

/// Which geometry an objective is free to change, in vector order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveShape {
    axes: Vec<GeometryAxis>,
}

impl ObjectiveShape {
    pub fn new(axes: Vec<GeometryAxis>) -> Self {
        Self { axes }
    }

    pub fn bore_length() -> Self {
        Self::new(vec![GeometryAxis::BoreLength {
            adjustment: BoreLengthAdjustment::default(),
        }])
    }

    pub fn hole_positions() -> Self {
        Self::new(vec![GeometryAxis::HolePositions {
            grouping: None,
            adjustment: BoreLengthAdjustment::default(),
        }])
    }

    pub fn hole_sizes() -> Self {
        Self::new(vec![GeometryAxis::HoleSizes { grouping: None }])
    }

    /// Hole positions followed by hole sizes.
    pub fn holes() -> Self {
        Self::new(vec![
            GeometryAxis::HolePositions {
                grouping: None,
                adjustment: BoreLengthAdjustment::default(),
            },
            GeometryAxis::HoleSizes { grouping: None },
        ])
    }

    pub fn axes(&self) -> &[GeometryAxis] {
        &self.axes
    }

    pub fn dimensions(&self, hole_count: usize) -> usize {
        self.axes.iter().map(|a| a.dimensions(hole_count)).sum()
    }

    pub fn validate(&self, instrument: &Instrument) -> Result<(), ObjectiveError> {
        if self.axes.is_empty() {
            return Err(ObjectiveError::EmptyShape);
        }
        let moves_length = |a: &&GeometryAxis| {
            matches!(
                a,
                GeometryAxis::BoreLength { .. } | GeometryAxis::HolePositions { .. }
            )
        };
        if self.axes.iter().filter(moves_length).count() > 1 {
            return Err(ObjectiveError::ConflictingAxes);
        }
        self.axes.iter().try_for_each(|a| a.validate(instrument))
    }

    /// Geometry vector of `instrument`, which must be in metres.
    pub fn read(&self, instrument: &Instrument) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dimensions(instrument.hole_count()));
        for axis in &self.axes {
            axis.read(instrument, &mut out);
        }
        out
    }

    /// Writes `x` into `instrument` (metres). `x` must have
    /// `dimensions(hole_count)` entries.
    pub fn apply(&self, instrument: &mut Instrument, x: &[f64]) {
        let hole_count = instrument.hole_count();
        let mut offset = 0;
        for axis in &self.axes {
            let n = axis.dimensions(hole_count);
            axis.apply(instrument, &x[offset..offset + n]);
            offset += n;
        }
        instrument.sort();
    }
}
