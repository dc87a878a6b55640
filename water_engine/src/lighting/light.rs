/// Scene lights

use glam::{Vec2, Vec3, Vec4};

/// Value uploaded to `LightType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional = 0,
    Point = 1,
    Spot = 2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        /// Falloff between (start, end) distances
        distance_attenuation: Vec2,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        distance_attenuation: Vec2,
        /// Falloff between (inner, outer) cone angles in radians
        angle_attenuation: Vec2,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn directional(direction: Vec3) -> Self {
        Self::new(LightKind::Directional {
            direction: direction.normalize_or_zero(),
        })
    }

    pub fn point(position: Vec3, distance_attenuation: Vec2) -> Self {
        Self::new(LightKind::Point {
            position,
            distance_attenuation,
        })
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        distance_attenuation: Vec2,
        angle_attenuation: Vec2,
    ) -> Self {
        Self::new(LightKind::Spot {
            position,
            direction: direction.normalize_or_zero(),
            distance_attenuation,
            angle_attenuation,
        })
    }

    fn new(kind: LightKind) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn light_type(&self) -> LightType {
        match self.kind {
            LightKind::Directional { .. } => LightType::Directional,
            LightKind::Point { .. } => LightType::Point,
            LightKind::Spot { .. } => LightType::Spot,
        }
    }

    /// Color scaled by intensity
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// World position, zero for directional lights
    pub fn position(&self) -> Vec3 {
        match self.kind {
            LightKind::Directional { .. } => Vec3::ZERO,
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => position,
        }
    }

    /// Direction the light travels, zero for point lights
    pub fn direction(&self) -> Vec3 {
        match self.kind {
            LightKind::Directional { direction } | LightKind::Spot { direction, .. } => direction,
            LightKind::Point { .. } => Vec3::ZERO,
        }
    }

    /// (distance start, distance end, angle inner, angle outer)
    pub fn attenuation(&self) -> Vec4 {
        match self.kind {
            LightKind::Directional { .. } => Vec4::ZERO,
            LightKind::Point {
                distance_attenuation,
                ..
            } => distance_attenuation.extend(0.0).extend(0.0),
            LightKind::Spot {
                distance_attenuation,
                angle_attenuation,
                ..
            } => Vec4::new(
                distance_attenuation.x,
                distance_attenuation.y,
                angle_attenuation.x,
                angle_attenuation.y,
            ),
        }
    }
}
