//! Acoustic material properties and the surface lookup table.
//!
//! Absorption is given in three bands (low, mid, high). Transmission and
//! scattering are broadband.

use crate::error::{AcousticError, Result};
use std::collections::HashMap;

/// Acoustic properties of a surface.
///
/// # Example
///
/// ```
/// use acoustrace::scene::AcousticMaterial;
///
/// let wall = AcousticMaterial::CONCRETE;
/// assert!(wall.validate().is_ok());
///
/// let curtain = AcousticMaterial {
///     absorption: [0.05, 0.30, 0.55],
///     transmission: 0.5,
///     scattering: 0.4,
/// };
/// assert!(curtain.average_absorption() > 0.29);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticMaterial {
    /// Fraction of energy absorbed at [low, mid, high] frequencies (0.0 - 1.0)
    pub absorption: [f32; 3],

    /// Fraction of energy passing through the surface (0 = blocks, 1 = transparent)
    pub transmission: f32,

    /// 0.0 = mirror-like reflection, 1.0 = fully diffuse
    pub scattering: f32,
}

impl AcousticMaterial {
    pub const DEFAULT: Self = Self {
        absorption: [0.10, 0.20, 0.30],
        transmission: 0.0,
        scattering: 0.10,
    };

    pub const CONCRETE: Self = Self {
        absorption: [0.01, 0.02, 0.02],
        transmission: 0.0,
        scattering: 0.05,
    };

    pub const WOOD: Self = Self {
        absorption: [0.15, 0.11, 0.10],
        transmission: 0.05,
        scattering: 0.10,
    };

    pub const METAL: Self = Self {
        absorption: [0.01, 0.01, 0.02],
        transmission: 0.0,
        scattering: 0.02,
    };

    pub const GLASS: Self = Self {
        absorption: [0.18, 0.06, 0.04],
        transmission: 0.3,
        scattering: 0.02,
    };

    pub const FABRIC: Self = Self {
        absorption: [0.03, 0.12, 0.35],
        transmission: 0.4,
        scattering: 0.30,
    };

    pub const WATER: Self = Self {
        absorption: [0.01, 0.01, 0.02],
        transmission: 0.2,
        scattering: 0.50,
    };

    pub const FOLIAGE: Self = Self {
        absorption: [0.03, 0.06, 0.11],
        transmission: 0.8,
        scattering: 0.70,
    };

    pub const EARTH: Self = Self {
        absorption: [0.15, 0.25, 0.40],
        transmission: 0.0,
        scattering: 0.40,
    };

    pub const ICE: Self = Self {
        absorption: [0.01, 0.01, 0.02],
        transmission: 0.1,
        scattering: 0.05,
    };

    pub fn low_absorption(&self) -> f32 {
        self.absorption[0]
    }

    pub fn mid_absorption(&self) -> f32 {
        self.absorption[1]
    }

    pub fn high_absorption(&self) -> f32 {
        self.absorption[2]
    }

    pub fn average_absorption(&self) -> f32 {
        self.absorption.iter().sum::<f32>() / 3.0
    }

    /// Validates that all material properties are within valid range [0.0, 1.0]
    pub fn validate(&self) -> Result<()> {
        for &val in &self.absorption {
            if !(0.0..=1.0).contains(&val) {
                return Err(AcousticError::Material(
                    "Absorption values must be between 0.0 and 1.0".into(),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.transmission) {
            return Err(AcousticError::Material(
                "Transmission value must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.scattering) {
            return Err(AcousticError::Material(
                "Scattering value must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AcousticMaterial {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Built-in material categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Default,
    Concrete,
    Wood,
    Metal,
    Glass,
    Fabric,
    Water,
    Foliage,
    Earth,
    Ice,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 10] = [
        Self::Default,
        Self::Concrete,
        Self::Wood,
        Self::Metal,
        Self::Glass,
        Self::Fabric,
        Self::Water,
        Self::Foliage,
        Self::Earth,
        Self::Ice,
    ];

    pub const fn material(self) -> AcousticMaterial {
        match self {
            Self::Default => AcousticMaterial::DEFAULT,
            Self::Concrete => AcousticMaterial::CONCRETE,
            Self::Wood => AcousticMaterial::WOOD,
            Self::Metal => AcousticMaterial::METAL,
            Self::Glass => AcousticMaterial::GLASS,
            Self::Fabric => AcousticMaterial::FABRIC,
            Self::Water => AcousticMaterial::WATER,
            Self::Foliage => AcousticMaterial::FOLIAGE,
            Self::Earth => AcousticMaterial::EARTH,
            Self::Ice => AcousticMaterial::ICE,
        }
    }

    /// Id under which [`MaterialTable::with_presets`] registers this kind.
    pub const fn id(self) -> MaterialId {
        MaterialId(self as u32)
    }
}

/// Host-defined surface identifier carried by ray hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MaterialId({})", self.0)
    }
}

/// Surface lookup table used to turn ray hits into acoustic materials.
///
/// Unknown ids resolve to [`AcousticMaterial::DEFAULT`] rather than failing.
///
/// # Example
///
/// ```
/// use acoustrace::scene::{AcousticMaterial, MaterialId, MaterialKind, MaterialTable};
///
/// let mut materials = MaterialTable::with_presets();
/// materials.register(MaterialId(42), AcousticMaterial::GLASS).unwrap();
///
/// assert_eq!(materials.resolve(MaterialKind::Wood.id()), AcousticMaterial::WOOD);
/// assert_eq!(materials.resolve(MaterialId(9999)), AcousticMaterial::DEFAULT);
/// ```
#[derive(Debug, Clone)]
pub struct MaterialTable {
    materials: HashMap<MaterialId, AcousticMaterial>,
    fallback: AcousticMaterial,
}

impl MaterialTable {
    /// Creates a new empty material table
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            fallback: AcousticMaterial::DEFAULT,
        }
    }

    /// Creates a table with every [`MaterialKind`] registered under [`MaterialKind::id`].
    pub fn with_presets() -> Self {
        let mut table = Self::new();
        for kind in MaterialKind::ALL {
            table.materials.insert(kind.id(), kind.material());
        }
        table
    }

    /// Registers (or replaces) the material for a surface id.
    ///
    /// # Errors
    ///
    /// Returns an error if the material's properties are out of range
    pub fn register(&mut self, id: MaterialId, material: AcousticMaterial) -> Result<()> {
        material.validate()?;
        if self.materials.insert(id, material).is_some() {
            log::debug!("Replaced acoustic material for {}", id);
        }
        Ok(())
    }

    pub fn unregister(&mut self, id: MaterialId) -> Option<AcousticMaterial> {
        self.materials.remove(&id)
    }

    /// Retrieves a material by its id
    pub fn get(&self, id: MaterialId) -> Option<&AcousticMaterial> {
        self.materials.get(&id)
    }

    /// Looks up a material, falling back to the default material.
    pub fn resolve(&self, id: MaterialId) -> AcousticMaterial {
        self.materials.get(&id).copied().unwrap_or(self.fallback)
    }

    /// Replaces the material returned for unknown ids.
    pub fn set_fallback(&mut self, material: AcousticMaterial) -> Result<()> {
        material.validate()?;
        self.fallback = material;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &AcousticMaterial)> {
        self.materials.iter().map(|(id, m)| (*id, m))
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::with_presets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_validation() {
        assert!(AcousticMaterial::CONCRETE.validate().is_ok());

        let invalid_absorption = AcousticMaterial {
            absorption: [0.5, 1.5, 0.3],
            transmission: 0.1,
            scattering: 0.05,
        };
        assert!(invalid_absorption.validate().is_err());

        let invalid_transmission = AcousticMaterial {
            absorption: [0.5, 0.5, 0.3],
            transmission: -0.2,
            scattering: 0.05,
        };
        assert!(invalid_transmission.validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        for kind in MaterialKind::ALL {
            assert!(kind.material().validate().is_ok(), "{:?}", kind);
        }
    }

    #[test]
    fn test_material_table() {
        let mut table = MaterialTable::new();
        assert!(table.is_empty());

        table.register(MaterialId(7), AcousticMaterial::METAL).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(MaterialId(7)), Some(&AcousticMaterial::METAL));
        assert_eq!(table.get(MaterialId(8)), None);

        let bad = AcousticMaterial {
            scattering: 2.0,
            ..AcousticMaterial::METAL
        };
        assert!(table.register(MaterialId(9), bad).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_resolves_to_default() {
        let table = MaterialTable::with_presets();
        assert_eq!(table.len(), MaterialKind::ALL.len());
        assert_eq!(table.resolve(MaterialId(500)), AcousticMaterial::DEFAULT);
        assert_eq!(
            table.resolve(MaterialKind::Glass.id()),
            AcousticMaterial::GLASS
        );
    }

    #[test]
    fn test_average_absorption() {
        let avg = AcousticMaterial::DEFAULT.average_absorption();
        assert!((avg - 0.2).abs() < 1e-6);
    }
}
