//! The vital-sign vocabulary.
//!
//! Observations record one of seven fixed vital-sign kinds. The kind fixes
//! the unit/code pair on the emitted `valueQuantity` and names the
//! denormalised slot column a diagnostic report links the observation
//! through. [`VitalSign::ALL`] is the canonical slot order of a report.

/// One of the seven recognised vital-sign kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VitalSign {
    RespiratoryRate,
    OxygenSaturation,
    SupplementalOxygen,
    BodyTemperature,
    SystolicBp,
    HeartRate,
    LevelOfConsciousness,
}

impl VitalSign {
    /// Canonical slot order of a diagnostic report's observation columns.
    pub const ALL: [VitalSign; 7] = [
        VitalSign::RespiratoryRate,
        VitalSign::OxygenSaturation,
        VitalSign::SupplementalOxygen,
        VitalSign::BodyTemperature,
        VitalSign::SystolicBp,
        VitalSign::HeartRate,
        VitalSign::LevelOfConsciousness,
    ];

    /// The storage column (and wire name) of this kind.
    pub fn column(self) -> &'static str {
        match self {
            VitalSign::RespiratoryRate => "respiratory_rate",
            VitalSign::OxygenSaturation => "oxygen_saturation",
            VitalSign::SupplementalOxygen => "supplemental_oxygen",
            VitalSign::BodyTemperature => "body_temperature",
            VitalSign::SystolicBp => "systolic_bp",
            VitalSign::HeartRate => "heart_rate",
            VitalSign::LevelOfConsciousness => "level_of_consciousness",
        }
    }

    /// Parses a wire/storage name into a kind.
    pub fn parse(name: &str) -> Option<Self> {
        VitalSign::ALL
            .into_iter()
            .find(|kind| kind.column() == name)
    }

    /// `(unit, code)` pair for the `valueQuantity` of this kind.
    ///
    /// `{score}` and `{yes/no}` are UCUM annotations for dimensionless
    /// values; their codes are empty.
    pub fn unit_code(self) -> (&'static str, &'static str) {
        match self {
            VitalSign::RespiratoryRate => ("breaths/minute", "/min"),
            VitalSign::OxygenSaturation => ("%", "%"),
            VitalSign::SupplementalOxygen => ("{yes/no}", ""),
            VitalSign::BodyTemperature => ("C", "cel"),
            VitalSign::SystolicBp => ("mmHg", "mm[Hg]"),
            VitalSign::HeartRate => ("beats/min", "/min"),
            VitalSign::LevelOfConsciousness => ("{score}", ""),
        }
    }
}
