//! Scene lights.
//!
//! Lights are held in a fixed-capacity [`LightRig`] and packed into the
//! per-pass constant block once per frame. Capacities are hard limits from
//! the shader side; adding past them is rejected and changes nothing.

use ember_resources::constants::{
    GpuLight, MAX_DIRECTIONAL_LIGHTS, MAX_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};
use glam::{Vec3, Vec4};
use tracing::warn;

use crate::error::{SceneError, SceneResult};

/// A sun-like light.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLight {
    /// Light color scaled by intensity.
    pub strength: Vec3,
    /// Direction the light shines along.
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            strength: Vec3::ONE,
            direction: Vec3::new(0.0, -1.0, 0.0),
        }
    }
}

impl DirectionalLight {
    fn to_gpu(self) -> GpuLight {
        GpuLight::directional(self.strength, self.direction)
    }
}

/// An omnidirectional light with a falloff interval.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    /// Light color scaled by intensity.
    pub strength: Vec3,
    /// Position in world space.
    pub position: Vec3,
    /// Distance at which attenuation begins.
    pub falloff_start: f32,
    /// Distance at which the light reaches zero.
    pub falloff_end: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            strength: Vec3::ONE,
            position: Vec3::ZERO,
            falloff_start: 1.0,
            falloff_end: 10.0,
        }
    }
}

impl PointLight {
    fn to_gpu(self) -> GpuLight {
        GpuLight::point(self.strength, self.position, self.falloff_start, self.falloff_end)
    }
}

/// A cone-shaped light.
#[derive(Clone, Copy, Debug)]
pub struct SpotLight {
    /// Light color scaled by intensity.
    pub strength: Vec3,
    /// Position in world space.
    pub position: Vec3,
    /// Cone axis.
    pub direction: Vec3,
    /// Distance at which attenuation begins.
    pub falloff_start: f32,
    /// Distance at which the light reaches zero.
    pub falloff_end: f32,
    /// Cone exponent; larger values narrow the cone.
    pub spot_power: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            strength: Vec3::ONE,
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, -1.0, 0.0),
            falloff_start: 1.0,
            falloff_end: 10.0,
            spot_power: 64.0,
        }
    }
}

impl SpotLight {
    fn to_gpu(self) -> GpuLight {
        GpuLight::spot(
            self.strength,
            self.position,
            self.direction,
            self.falloff_start,
            self.falloff_end,
            self.spot_power,
        )
    }
}

/// Fixed-capacity light set of one scene.
///
/// Packing order inside the shader-visible array: the directional light at
/// index 0, point lights from index 1, the spot light at index
/// `MAX_LIGHTS - 1`. Unused slots stay zeroed, which shaders read as "off".
#[derive(Clone, Debug)]
pub struct LightRig {
    /// Ambient light color.
    pub ambient: Vec4,
    directional: Vec<DirectionalLight>,
    point: Vec<PointLight>,
    spot: Vec<SpotLight>,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.25, 0.25, 0.25, 1.0),
            directional: Vec::new(),
            point: Vec::new(),
            spot: Vec::new(),
        }
    }
}

impl LightRig {
    /// Creates an empty rig with a neutral ambient term.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directional light.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LightCapacityReached`] once
    /// [`MAX_DIRECTIONAL_LIGHTS`] lights are present; the rig is unchanged.
    pub fn add_directional(&mut self, light: DirectionalLight) -> SceneResult<()> {
        if self.directional.len() >= MAX_DIRECTIONAL_LIGHTS {
            warn!(capacity = MAX_DIRECTIONAL_LIGHTS, "directional light capacity reached");
            return Err(SceneError::LightCapacityReached {
                kind: "directional",
                capacity: MAX_DIRECTIONAL_LIGHTS,
            });
        }

        self.directional.push(light);
        Ok(())
    }

    /// Adds a point light.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LightCapacityReached`] once [`MAX_POINT_LIGHTS`]
    /// lights are present; the rig is unchanged.
    pub fn add_point(&mut self, light: PointLight) -> SceneResult<()> {
        if self.point.len() >= MAX_POINT_LIGHTS {
            warn!(capacity = MAX_POINT_LIGHTS, "point light capacity reached");
            return Err(SceneError::LightCapacityReached {
                kind: "point",
                capacity: MAX_POINT_LIGHTS,
            });
        }

        self.point.push(light);
        Ok(())
    }

    /// Adds a spot light.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::LightCapacityReached`] once [`MAX_SPOT_LIGHTS`]
    /// lights are present; the rig is unchanged.
    pub fn add_spot(&mut self, light: SpotLight) -> SceneResult<()> {
        if self.spot.len() >= MAX_SPOT_LIGHTS {
            warn!(capacity = MAX_SPOT_LIGHTS, "spot light capacity reached");
            return Err(SceneError::LightCapacityReached {
                kind: "spot",
                capacity: MAX_SPOT_LIGHTS,
            });
        }

        self.spot.push(light);
        Ok(())
    }

    /// Returns the number of directional lights.
    #[inline]
    pub fn directional_count(&self) -> usize {
        self.directional.len()
    }

    /// Returns the number of point lights.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.point.len()
    }

    /// Returns the number of spot lights.
    #[inline]
    pub fn spot_count(&self) -> usize {
        self.spot.len()
    }

    /// Returns the direction of the shadow-casting light.
    ///
    /// The first directional light casts the shadow; without one the shadow
    /// volume uses straight-down light.
    pub fn primary_direction(&self) -> Vec3 {
        self.directional
            .first()
            .map(|light| light.direction.normalize_or_zero())
            .filter(|direction| *direction != Vec3::ZERO)
            .unwrap_or(Vec3::NEG_Y)
    }

    /// Packs the rig into the shader-visible light array.
    pub fn packed(&self) -> [GpuLight; MAX_LIGHTS] {
        let mut lights = [GpuLight::default(); MAX_LIGHTS];

        if let Some(directional) = self.directional.first() {
            lights[0] = directional.to_gpu();
        }
        for (i, point) in self.point.iter().enumerate() {
            lights[MAX_DIRECTIONAL_LIGHTS + i] = point.to_gpu();
        }
        if let Some(spot) = self.spot.first() {
            lights[MAX_LIGHTS - MAX_SPOT_LIGHTS] = spot.to_gpu();
        }

        lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_capacity() {
        let mut rig = LightRig::new();
        assert!(rig.add_directional(DirectionalLight::default()).is_ok());

        let result = rig.add_directional(DirectionalLight::default());
        assert!(matches!(
            result,
            Err(SceneError::LightCapacityReached { kind: "directional", .. })
        ));
        // Rejected add leaves the rig unchanged
        assert_eq!(rig.directional_count(), 1);
    }

    #[test]
    fn test_point_capacity() {
        let mut rig = LightRig::new();
        for _ in 0..MAX_POINT_LIGHTS {
            assert!(rig.add_point(PointLight::default()).is_ok());
        }

        assert!(rig.add_point(PointLight::default()).is_err());
        assert_eq!(rig.point_count(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_spot_capacity() {
        let mut rig = LightRig::new();
        assert!(rig.add_spot(SpotLight::default()).is_ok());
        assert!(rig.add_spot(SpotLight::default()).is_err());
        assert_eq!(rig.spot_count(), 1);
    }

    #[test]
    fn test_packed_slots() {
        let mut rig = LightRig::new();
        rig.add_directional(DirectionalLight {
            strength: Vec3::new(0.9, 0.8, 0.7),
            direction: Vec3::new(0.0, -1.0, 0.0),
        })
        .ok();
        rig.add_point(PointLight {
            position: Vec3::new(5.0, 1.0, 0.0),
            ..PointLight::default()
        })
        .ok();
        rig.add_spot(SpotLight::default()).ok();

        let packed = rig.packed();

        assert_eq!(packed[0].strength, Vec3::new(0.9, 0.8, 0.7));
        assert_eq!(packed[1].position, Vec3::new(5.0, 1.0, 0.0));
        assert_eq!(packed[MAX_LIGHTS - 1].spot_power, 64.0);
        // Unused point slots stay zeroed
        assert_eq!(packed[2].strength, Vec3::ZERO);
    }

    #[test]
    fn test_primary_direction_fallback() {
        let rig = LightRig::new();
        assert_eq!(rig.primary_direction(), Vec3::NEG_Y);

        let mut lit = LightRig::new();
        lit.add_directional(DirectionalLight {
            strength: Vec3::ONE,
            direction: Vec3::new(2.0, -2.0, 0.0),
        })
        .ok();
        let direction = lit.primary_direction();
        assert!((direction.length() - 1.0).abs() < 1e-5);
        assert!(direction.y < 0.0);
    }
}
