//! Compounds that processes consume and produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chemical (or light) that biological processes read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Compound {
    /// Cellular energy currency.
    Atp,
    /// Stored sugar, both a cloud compound and an internal intermediate.
    Glucose,
    /// Dissolved oxygen.
    Oxygen,
    /// Dissolved carbon dioxide.
    CarbonDioxide,
    /// Light reaching the patch.
    Sunlight,
    /// Hydrogen sulfide clouds near vents.
    HydrogenSulfide,
    /// Iron chunks and clouds.
    Iron,
}

impl Compound {
    /// All compounds in a stable order.
    pub const ALL: [Compound; 7] = [
        Compound::Atp,
        Compound::Glucose,
        Compound::Oxygen,
        Compound::CarbonDioxide,
        Compound::Sunlight,
        Compound::HydrogenSulfide,
        Compound::Iron,
    ];

    /// Environmental compounds are dissolved in the whole patch and throttle
    /// the speed of any process that needs them.
    pub fn is_environmental(self) -> bool {
        matches!(
            self,
            Compound::Oxygen | Compound::CarbonDioxide | Compound::Sunlight
        )
    }

    /// Stable lowercase identifier, matching the serialized biome keys.
    pub fn internal_name(self) -> &'static str {
        match self {
            Compound::Atp => "atp",
            Compound::Glucose => "glucose",
            Compound::Oxygen => "oxygen",
            Compound::CarbonDioxide => "carbondioxide",
            Compound::Sunlight => "sunlight",
            Compound::HydrogenSulfide => "hydrogensulfide",
            Compound::Iron => "iron",
        }
    }

    /// Looks a compound up by its internal name.
    pub fn by_name(name: &str) -> Option<Compound> {
        Self::ALL.into_iter().find(|c| c.internal_name() == name)
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compound::Atp => "ATP",
            Compound::Glucose => "Glucose",
            Compound::Oxygen => "Oxygen",
            Compound::CarbonDioxide => "Carbon Dioxide",
            Compound::Sunlight => "Sunlight",
            Compound::HydrogenSulfide => "Hydrogen Sulfide",
            Compound::Iron => "Iron",
        };
        f.write_str(name)
    }
}
