//! Geometric primitives and colors
//!
//! Double precision vectors used for positions, normals and texture
//! coordinates, and the 8-bit color shared by materials and textures.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Distances below this are treated as zero when normalizing
const LENGTH_EPSILON: f64 = 1e-12;

/// 3D vector (position, normal, texture coordinate)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const UNIT_Z: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction. Degenerate vectors are returned unchanged.
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len > LENGTH_EPSILON {
            *self / len
        } else {
            *self
        }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).length()
    }

    /// Two points are co-located when their distance, truncated to two
    /// decimals, is zero.
    pub fn is_colocated(&self, other: &Self) -> bool {
        centi_units(self.distance(other)) <= 0
    }
}

/// Truncate a length to hundredths, the tolerance used for point comparisons
pub fn centi_units(length: f64) -> i64 {
    // `as` truncates toward zero and maps NaN to 0
    (length * 100.0) as i64
}

impl Default for Vector3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(value: [f32; 3]) -> Self {
        Self::new(f64::from(value[0]), f64::from(value[1]), f64::from(value[2]))
    }
}

/// RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Alpha values below this are treated as fully transparent
    pub const ALPHA_THRESHOLD: u8 = 0x80;

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from normalized float channels (as found in MTL files)
    pub fn from_unit_rgb(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    pub fn is_transparent(&self) -> bool {
        self.a < Self::ALPHA_THRESHOLD
    }

    /// Pack as 16-bit ABGR1555 with the opaque bit set
    pub fn to_abgr555(&self) -> u16 {
        let r = u16::from(self.r >> 3);
        let g = u16::from(self.g >> 3);
        let b = u16::from(self.b >> 3);
        0x8000 | (b << 10) | (g << 5) | r
    }

    /// Pack as a texel: transparent pixels become `0x0000`
    pub fn to_texel(&self) -> u16 {
        if self.is_transparent() {
            0
        } else {
            self.to_abgr555()
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_dot() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);

        assert_eq!(x.cross(&y), Vector3::UNIT_Z);
        assert_eq!(x.dot(&y), 0.0);
        assert_eq!(x.dot(&x), 1.0);
    }

    #[test]
    fn test_normalized() {
        let v = Vector3::new(3.0, 0.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);

        // degenerate input is a no-op
        assert_eq!(Vector3::ZERO.normalized(), Vector3::ZERO);
    }

    #[test]
    fn test_colocated_tolerance() {
        let origin = Vector3::ZERO;
        assert!(origin.is_colocated(&Vector3::new(0.0, 0.0, 0.001)));
        assert!(origin.is_colocated(&Vector3::new(0.0, 0.0, 0.0099)));
        assert!(!origin.is_colocated(&Vector3::new(0.0, 0.0, 0.02)));
        assert!(!origin.is_colocated(&Vector3::new(0.01, 0.0, 0.0)));
    }

    #[test]
    fn test_abgr555() {
        assert_eq!(Color::WHITE.to_abgr555(), 0xFFFF);
        assert_eq!(Color::rgb(0, 0, 0).to_abgr555(), 0x8000);
        assert_eq!(Color::rgb(0xFF, 0, 0).to_abgr555(), 0x801F);
        assert_eq!(Color::rgb(0, 0xFF, 0).to_abgr555(), 0x83E0);
        assert_eq!(Color::rgb(0, 0, 0xFF).to_abgr555(), 0xFC00);
    }

    #[test]
    fn test_texel_transparency() {
        assert_eq!(Color::rgba(0xFF, 0xFF, 0xFF, 0x7F).to_texel(), 0);
        assert_eq!(Color::rgba(0xFF, 0xFF, 0xFF, 0x80).to_texel(), 0xFFFF);
    }

    #[test]
    fn test_from_unit_rgb() {
        assert_eq!(Color::from_unit_rgb(1.0, 0.0, 2.0), Color::rgb(0xFF, 0, 0xFF));
        assert_eq!(Color::from_unit_rgb(0.5, 0.5, 0.5), Color::rgb(128, 128, 128));
    }
}
