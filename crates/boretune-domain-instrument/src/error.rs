#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("fingering {note} has {found} hole states but the instrument has {expected} holes")]
    HoleCountMismatch {
        expected: usize,
        found: usize,
        note: String,
    },
    #[error("bore needs at least two points, found {found}")]
    TooFewBorePoints { found: usize },
    #[error("mouthpiece at {position} lies outside the bore [{top}, {bottom})")]
    MouthpieceOutsideBore { position: f64, top: f64, bottom: f64 },
    #[error("hole {index} at {position} lies outside the playing bore ({top}, {bottom}]")]
    HoleOutsideBore {
        index: usize,
        position: f64,
        top: f64,
        bottom: f64,
    },
    #[error("invalid {what}: {value}")]
    InvalidDimension { what: String, value: f64 },
}
