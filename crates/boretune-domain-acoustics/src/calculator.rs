use crate::algebra::StateVector;
use crate::bore_section::{
    BoreSectionCalculator, GordonBoreSectionCalculator, SimpleBoreSectionCalculator,
};
use crate::hole::{DefaultHoleCalculator, HoleCalculator, KeefeHoleCalculator};
use crate::mouthpiece::{
    EmbouchureMouthpieceCalculator, FippleMouthpieceCalculator, KindMouthpieceCalculator,
    MouthpieceCalculator, MouthpieceContext, ReedMouthpieceCalculator,
};
use crate::termination::{FlangedEndCalculator, TerminationCalculator, UnflangedEndCalculator};
use boretune_domain_instrument::{
    Component, ComponentLayout, Fingering, GeometryError, Instrument, LengthUnit,
    PhysicalParameters,
};
use num_complex::Complex64;
use std::sync::Arc;

/// The four strategies an [`InstrumentCalculator`] is assembled from.
#[derive(Clone)]
pub struct ComponentModels {
    pub mouthpiece: Arc<dyn MouthpieceCalculator>,
    pub termination: Arc<dyn TerminationCalculator>,
    pub hole: Arc<dyn HoleCalculator>,
    pub bore: Arc<dyn BoreSectionCalculator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalculatorFamily {
    Whistle,
    Flute,
    Naf,
    Reed,
    Gordon,
}

impl CalculatorFamily {
    pub const ALL: [CalculatorFamily; 5] = [
        CalculatorFamily::Whistle,
        CalculatorFamily::Flute,
        CalculatorFamily::Naf,
        CalculatorFamily::Reed,
        CalculatorFamily::Gordon,
    ];

    pub fn models(self) -> ComponentModels {
        match self {
            CalculatorFamily::Whistle => ComponentModels {
                mouthpiece: Arc::new(FippleMouthpieceCalculator),
                termination: Arc::new(UnflangedEndCalculator),
                hole: Arc::new(KeefeHoleCalculator),
                bore: Arc::new(SimpleBoreSectionCalculator),
            },
            CalculatorFamily::Flute => ComponentModels {
                mouthpiece: Arc::new(EmbouchureMouthpieceCalculator),
                termination: Arc::new(UnflangedEndCalculator),
                hole: Arc::new(DefaultHoleCalculator::default()),
                bore: Arc::new(SimpleBoreSectionCalculator),
            },
            CalculatorFamily::Naf => ComponentModels {
                mouthpiece: Arc::new(FippleMouthpieceCalculator),
                termination: Arc::new(FlangedEndCalculator),
                hole: Arc::new(DefaultHoleCalculator::default()),
                bore: Arc::new(SimpleBoreSectionCalculator),
            },
            CalculatorFamily::Reed => ComponentModels {
                mouthpiece: Arc::new(ReedMouthpieceCalculator),
                termination: Arc::new(UnflangedEndCalculator),
                hole: Arc::new(DefaultHoleCalculator::default()),
                bore: Arc::new(GordonBoreSectionCalculator),
            },
            CalculatorFamily::Gordon => ComponentModels {
                mouthpiece: Arc::new(KindMouthpieceCalculator),
                termination: Arc::new(FlangedEndCalculator),
                hole: Arc::new(DefaultHoleCalculator::default()),
                bore: Arc::new(GordonBoreSectionCalculator),
            },
        }
    }
}

/// Input impedance of an instrument under a fingering.
///
/// Holds its own copy of the instrument in metres; cloning gives an
/// independent working copy that shares the component strategies.
#[derive(Clone)]
pub struct InstrumentCalculator {
    instrument: Instrument,
    source_unit: LengthUnit,
    layout: ComponentLayout,
    params: PhysicalParameters,
    fingering: Fingering,
    models: ComponentModels,
}

impl InstrumentCalculator {
    pub fn new(
        instrument: &Instrument,
        params: PhysicalParameters,
        models: ComponentModels,
    ) -> Result<Self, GeometryError> {
        let source_unit = instrument.unit;
        let instrument = normalized(instrument);
        let layout = ComponentLayout::build(&instrument)?;
        let fingering = Fingering::all_open(layout.hole_count);
        Ok(Self {
            instrument,
            source_unit,
            layout,
            params,
            fingering,
            models,
        })
    }

    pub fn for_family(
        family: CalculatorFamily,
        instrument: &Instrument,
        params: PhysicalParameters,
    ) -> Result<Self, GeometryError> {
        Self::new(instrument, params, family.models())
    }

    /// Replaces the geometry and rebuilds the layout. The current fingering
    /// survives unless the hole count changed.
    pub fn set_instrument(&mut self, instrument: &Instrument) -> Result<(), GeometryError> {
        let source_unit = instrument.unit;
        let instrument = normalized(instrument);
        let layout = ComponentLayout::build(&instrument)?;
        if layout.hole_count != self.layout.hole_count {
            self.fingering = Fingering::all_open(layout.hole_count);
        }
        self.source_unit = source_unit;
        self.instrument = instrument;
        self.layout = layout;
        Ok(())
    }

    /// The instrument in metres.
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Unit of the geometry last handed to the calculator.
    pub fn source_unit(&self) -> LengthUnit {
        self.source_unit
    }

    pub fn layout(&self) -> &ComponentLayout {
        &self.layout
    }

    pub fn params(&self) -> &PhysicalParameters {
        &self.params
    }

    pub fn set_physical_parameters(&mut self, params: PhysicalParameters) {
        self.params = params;
    }

    pub fn models(&self) -> &ComponentModels {
        &self.models
    }

    pub fn hole_count(&self) -> usize {
        self.layout.hole_count
    }

    pub fn fingering(&self) -> &Fingering {
        &self.fingering
    }

    pub fn set_fingering(&mut self, fingering: Fingering) -> Result<(), GeometryError> {
        fingering.check_hole_count(self.hole_count())?;
        self.fingering = fingering;
        Ok(())
    }

    pub fn is_admittance_driven(&self) -> bool {
        self.models
            .mouthpiece
            .is_admittance_driven(&self.instrument.mouthpiece)
    }

    /// Characteristic impedance of the bore at the mouthpiece.
    pub fn z0(&self) -> f64 {
        self.params.calc_z0(self.layout.mouthpiece_radius)
    }

    /// Impedance whose reactance crosses zero upward where the instrument
    /// plays: the input impedance, or `Z0² / Z` for admittance-driven
    /// mouthpieces.
    pub fn calc_z(&self, frequency: f64) -> Complex64 {
        self.z_unchecked(frequency, &self.fingering)
    }

    pub fn calc_z_for(&self, frequency: f64, fingering: &Fingering) -> Result<Complex64, GeometryError> {
        fingering.check_hole_count(self.hole_count())?;
        Ok(self.z_unchecked(frequency, fingering))
    }

    pub fn calc_input_impedance(&self, frequency: f64) -> Complex64 {
        self.input_state(frequency, &self.fingering).impedance()
    }

    pub fn calc_input_impedance_for(
        &self,
        frequency: f64,
        fingering: &Fingering,
    ) -> Result<Complex64, GeometryError> {
        fingering.check_hole_count(self.hole_count())?;
        Ok(self.input_state(frequency, fingering).impedance())
    }

    pub fn calc_reflection_coefficient(&self, frequency: f64) -> Complex64 {
        self.reflection_unchecked(frequency, &self.fingering)
    }

    pub fn calc_reflection_coefficient_for(
        &self,
        frequency: f64,
        fingering: &Fingering,
    ) -> Result<Complex64, GeometryError> {
        fingering.check_hole_count(self.hole_count())?;
        Ok(self.reflection_unchecked(frequency, fingering))
    }

    /// Loop gain estimate; 1.0 when the mouthpiece carries no gain factor.
    pub fn calc_gain(&self, frequency: f64, z: Complex64) -> f64 {
        match self.models.mouthpiece.gain_factor(&self.instrument.mouthpiece) {
            Some(g) => g * frequency * self.params.rho() / z.norm(),
            None => 1.0,
        }
    }

    pub(crate) fn z_unchecked(&self, frequency: f64, fingering: &Fingering) -> Complex64 {
        let state = self.input_state(frequency, fingering);
        if self.is_admittance_driven() {
            let z0 = self.z0();
            state.admittance() * (z0 * z0)
        } else {
            state.impedance()
        }
    }

    fn reflection_unchecked(&self, frequency: f64, fingering: &Fingering) -> Complex64 {
        let z = self.input_state(frequency, fingering).impedance();
        let z0 = self.z0();
        let r = (z - z0) / (z + z0);
        if self.is_admittance_driven() {
            r
        } else {
            -r
        }
    }

    fn input_state(&self, frequency: f64, fingering: &Fingering) -> StateVector {
        let k = self.params.calc_wave_number(frequency);
        let params = &self.params;
        let mut state = self.models.termination.state_vector(
            &self.layout.termination,
            fingering.is_open_end(),
            k,
            params,
        );
        for component in self.layout.components.iter().rev() {
            let matrix = match component {
                Component::Bore(section) => self.models.bore.transfer_matrix(section, k, params),
                Component::Hole(hole) => {
                    let is_open = fingering.open_holes.get(hole.index).copied().unwrap_or(true);
                    self.models.hole.transfer_matrix(hole, is_open, k, params)
                }
            };
            state = matrix.apply(state);
        }

        let context = MouthpieceContext {
            bore_radius: self.layout.mouthpiece_radius,
            headspace: self.headspace_state(k),
        };
        self.models
            .mouthpiece
            .state_vector(&self.instrument.mouthpiece, &context, state, k, params)
    }

    /// Closed top end carried down to the mouthpiece.
    fn headspace_state(&self, k: f64) -> StateVector {
        self.layout
            .headspace
            .iter()
            .fold(StateVector::closed_end(), |state, section| {
                self.models
                    .bore
                    .transfer_matrix(&section.reversed(), k, &self.params)
                    .apply(state)
            })
    }
}

fn normalized(instrument: &Instrument) -> Instrument {
    let mut out = instrument.to_metres();
    out.sort();
    out
}
