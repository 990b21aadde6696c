use num_complex::Complex64;
use std::f64::consts::PI;

const KELVIN_OFFSET: f64 = 273.15;
const GAS_CONSTANT: f64 = 8.314_472;
const MOLAR_MASS_WATER: f64 = 18.015_28e-3;
const PRANDTL: f64 = 0.710;

/// Properties of the air column, derived once from ambient conditions.
///
/// Speed of sound follows Cramer (1993); density follows the CIPM-2007
/// equation for moist air.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalParameters {
    temperature: f64,
    pressure: f64,
    relative_humidity: f64,
    xco2: f64,
    speed_of_sound: f64,
    rho: f64,
    gamma: f64,
    eta: f64,
    alpha_constant: f64,
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self::new(20.0, 101.325, 0.45, 390e-6)
    }
}

impl PhysicalParameters {
    /// `temperature` in °C, `pressure` in kPa, `relative_humidity` as a
    /// fraction, `xco2` as a mole fraction.
    pub fn new(temperature: f64, pressure: f64, relative_humidity: f64, xco2: f64) -> Self {
        let t = temperature;
        let kelvin = t + KELVIN_OFFSET;
        let p = pressure * 1e3;
        let h = relative_humidity.clamp(0.0, 1.0);

        let enhancement = 1.00062 + 3.14e-8 * p + 5.6e-7 * t * t;
        let saturation = (1.237_884_7e-5 * kelvin * kelvin - 1.912_131_6e-2 * kelvin
            + 33.937_110_47
            - 6.343_164_5e3 / kelvin)
            .exp();
        let xw = h * enhancement * saturation / p;

        let compressibility = 1.0
            - p / kelvin
                * (1.581_23e-6 - 2.9331e-8 * t
                    + 1.1043e-10 * t * t
                    + (5.707e-6 - 2.051e-8 * t) * xw
                    + (1.9898e-4 - 2.376e-6 * t) * xw * xw)
            + (p / kelvin).powi(2) * (1.83e-11 - 0.765e-8 * xw * xw);
        let molar_mass_air = (28.965_46 + 12.011 * (xco2 - 0.0004)) * 1e-3;
        let rho = p * molar_mass_air / (compressibility * GAS_CONSTANT * kelvin)
            * (1.0 - xw * (1.0 - MOLAR_MASS_WATER / molar_mass_air));

        let speed_of_sound = cramer_speed_of_sound(t, p, xw, xco2);
        let gamma = rho * speed_of_sound * speed_of_sound / p;
        let eta = 1.458e-6 * kelvin.powf(1.5) / (kelvin + 110.4);
        let alpha_constant = (eta / (2.0 * rho * speed_of_sound)).sqrt()
            * (1.0 + (gamma - 1.0) / PRANDTL.sqrt());

        Self {
            temperature,
            pressure,
            relative_humidity: h,
            xco2,
            speed_of_sound,
            rho,
            gamma,
            eta,
            alpha_constant,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn relative_humidity(&self) -> f64 {
        self.relative_humidity
    }

    pub fn xco2(&self) -> f64 {
        self.xco2
    }

    pub fn speed_of_sound(&self) -> f64 {
        self.speed_of_sound
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn prandtl(&self) -> f64 {
        PRANDTL
    }

    pub fn alpha_constant(&self) -> f64 {
        self.alpha_constant
    }

    /// Characteristic impedance of a tube of the given radius.
    pub fn calc_z0(&self, radius: f64) -> f64 {
        self.rho * self.speed_of_sound / (PI * radius * radius)
    }

    pub fn calc_wave_number(&self, frequency: f64) -> f64 {
        2.0 * PI * frequency / self.speed_of_sound
    }

    pub fn calc_frequency(&self, wave_number: f64) -> f64 {
        wave_number * self.speed_of_sound / (2.0 * PI)
    }

    /// Wave number including boundary-layer losses in a tube of `radius`.
    pub fn complex_wave_number(&self, wave_number: f64, radius: f64) -> Complex64 {
        let epsilon = self.alpha_constant / (radius * wave_number.sqrt());
        Complex64::new(wave_number * (1.0 + epsilon), -wave_number * epsilon)
    }

    /// The loss factor used by the lossy tube formulas.
    pub fn epsilon(&self, wave_number: f64, radius: f64) -> f64 {
        self.alpha_constant / (radius * wave_number.sqrt())
    }
}

fn cramer_speed_of_sound(t: f64, p: f64, xw: f64, xc: f64) -> f64 {
    const A: [f64; 16] = [
        331.5024,
        0.603_055,
        -0.000_528,
        51.471_935,
        0.149_587_4,
        -0.000_782,
        -1.82e-7,
        3.73e-8,
        -2.93e-10,
        -85.209_31,
        -0.228_525,
        5.91e-5,
        -2.835_149,
        -2.15e-13,
        29.179_762,
        0.000_486,
    ];
    A[0] + A[1] * t
        + A[2] * t * t
        + (A[3] + A[4] * t + A[5] * t * t) * xw
        + (A[6] + A[7] * t + A[8] * t * t) * p
        + (A[9] + A[10] * t + A[11] * t * t) * xc
        + A[12] * xw * xw
        + A[13] * p * p
        + A[14] * xc * xc
        + A[15] * xw * p * xc
}
