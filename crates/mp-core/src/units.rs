// mp-core/src/units.rs

use uom::si::f64::{
    MolarVolume as UomMolarVolume, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type MolarVolume = UomMolarVolume;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn m3_per_mol(v: f64) -> MolarVolume {
    use uom::si::molar_volume::cubic_meter_per_mole;
    MolarVolume::new::<cubic_meter_per_mole>(v)
}
