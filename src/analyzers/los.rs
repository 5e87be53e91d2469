//! Level-of-Service classification (NS 5.2-IC capacity method).

use serde::Serialize;

/// Road-capacity grade, best (free flow) to worst (breakdown).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ServiceLevel {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl std::fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceLevel::A => "A",
            ServiceLevel::B => "B",
            ServiceLevel::C => "C",
            ServiceLevel::D => "D",
            ServiceLevel::E => "E",
            ServiceLevel::F => "F",
        };
        f.write_str(s)
    }
}

/// Vehicle density in vehicles per km per lane.
///
/// Undefined (`None`, not zero and not an error) when the segment length or
/// lane count is missing or zero, so unusable geometry never reports grade A.
pub fn density(conteo_vehiculos: u64, longitud_km: Option<f64>, lanes: Option<u32>) -> Option<f64> {
    let longitud = longitud_km.filter(|l| l.is_finite() && *l > 0.0)?;
    let lanes = lanes.filter(|l| *l > 0)?;
    Some(conteo_vehiculos as f64 / (longitud * lanes as f64))
}

/// Converts a vehicle density (veh/km/lane) into a service level.
///
/// Closed upper bound on each tier, first match wins:
///
/// | densidad <= | Grade |
/// |-------------|-------|
/// | 7           | A     |
/// | 11          | B     |
/// | 16          | C     |
/// | 22          | D     |
/// | 28          | E     |
/// | (else)      | F     |
pub fn classify_density(densidad: f64) -> ServiceLevel {
    match densidad {
        d if d <= 7.0 => ServiceLevel::A,
        d if d <= 11.0 => ServiceLevel::B,
        d if d <= 16.0 => ServiceLevel::C,
        d if d <= 22.0 => ServiceLevel::D,
        d if d <= 28.0 => ServiceLevel::E,
        _ => ServiceLevel::F,
    }
}

/// Null-propagating variant: no density, no grade.
pub fn classify(densidad: Option<f64>) -> Option<ServiceLevel> {
    densidad.map(classify_density)
}
