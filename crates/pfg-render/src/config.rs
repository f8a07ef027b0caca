//! Render configuration, read from JSON.

use std::fs;
use std::path::Path;

use pfg_core::{PfgError, Result};
use pfg_math::{dvec3, Aabb3, Vector3};
use pfg_surface::LoadLimits;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::tmesh::ShadingPolicy;

pub type Rgb = [f64; 3];

/// How connected node segments are drawn by the interactive backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Pixel,
    Cylinder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawParams {
    /// Default `F`/`f` step length.
    pub step: f64,
    /// Default rotation angle in degrees.
    pub angle: f64,
    pub line_width: f64,
    pub width_increment: f64,
    pub initial_colour: i32,
    pub line_style: LineStyle,
    pub shading: ShadingPolicy,
    pub ambient: f64,
    /// Direction towards the light.
    pub light: Vector3,
    pub circle_segments: usize,
    pub cylinder_sides: usize,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            step: 1.0,
            angle: 45.0,
            line_width: 1.0,
            width_increment: 1.0,
            initial_colour: 1,
            line_style: LineStyle::Pixel,
            shading: ShadingPolicy::ReuseRows,
            ambient: 0.15,
            light: dvec3(0.0, 0.0, 1.0),
            circle_segments: 16,
            cylinder_sides: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    pub width: u32,
    pub height: u32,
    pub eye: Vector3,
    pub target: Vector3,
    pub up: Vector3,
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Refit the camera to the view volume before drawing.
    pub fit_to_volume: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            eye: dvec3(0.0, 0.0, 10.0),
            target: dvec3(0.0, 0.0, 0.0),
            up: dvec3(0.0, 1.0, 0.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            fit_to_volume: true,
        }
    }
}

impl ViewParams {
    /// Device size in points.
    pub fn resolution(&self) -> (f64, f64) {
        (self.width.max(1) as f64, self.height.max(1) as f64)
    }

    pub fn camera(&self) -> Camera {
        let (w, h) = self.resolution();
        Camera::new(
            self.eye,
            self.target,
            self.up,
            self.fov_degrees.to_radians(),
            w / h,
            self.near,
            self.far,
        )
    }

    /// Aim the view at `volume` so all of it is in front of the eye.
    pub fn fit_to(&mut self, volume: &Aabb3) {
        let mut camera = self.camera();
        camera.fit_to_aabb(volume);
        self.eye = camera.eye;
        self.target = camera.target;
        let reach = (self.eye - self.target).length() + volume.extents().length();
        self.far = self.far.max(reach * 2.0);
    }
}

/// Colour map indexed by the turtle colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colours: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colours: vec![
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 1.0],
                [0.8, 0.1, 0.1],
                [0.1, 0.7, 0.1],
                [0.1, 0.2, 0.8],
                [0.9, 0.8, 0.1],
                [0.8, 0.3, 0.8],
                [0.2, 0.8, 0.8],
                [0.45, 0.3, 0.1],
                [0.3, 0.55, 0.15],
            ],
        }
    }
}

impl Palette {
    /// Colour for an index; indices wrap around the map.
    pub fn colour(&self, index: i32) -> Rgb {
        if self.colours.is_empty() {
            return [0.5; 3];
        }
        self.colours[index.rem_euclid(self.colours.len() as i32) as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub draw: DrawParams,
    pub view: ViewParams,
    pub palette: Palette,
    pub limits: LoadLimits,
}

impl RenderConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PfgError::parse(e.line(), e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PfgError::InvalidOperation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = RenderConfig::from_json(r#"{ "view": { "width": 640 }, "draw": { "line_style": "cylinder" } }"#).unwrap();
        assert_eq!(cfg.view.width, 640);
        assert_eq!(cfg.view.height, 800);
        assert_eq!(cfg.draw.line_style, LineStyle::Cylinder);
        assert_eq!(cfg.draw.shading, ShadingPolicy::ReuseRows);
        assert_eq!(cfg.limits, LoadLimits::default());
    }

    #[test]
    fn test_round_trip() {
        let mut cfg = RenderConfig::default();
        cfg.limits = LoadLimits::legacy();
        cfg.draw.shading = ShadingPolicy::PerVertex;
        let back = RenderConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_bad_json_reports_line() {
        let err = RenderConfig::from_json("{\n\n  \"view\": 3 }").unwrap_err();
        assert!(matches!(err, PfgError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_palette_wraps() {
        let p = Palette::default();
        assert_eq!(p.colour(1), [1.0, 1.0, 1.0]);
        assert_eq!(p.colour(p.colours.len() as i32 + 1), p.colour(1));
        assert_eq!(p.colour(-1), *p.colours.last().unwrap());
    }

    #[test]
    fn test_fit_to_volume() {
        let mut view = ViewParams::default();
        let volume = Aabb3::new(dvec3(10.0, 10.0, -1.0), dvec3(14.0, 12.0, 1.0));
        view.fit_to(&volume);
        assert_eq!(view.target, volume.center());
        let camera = view.camera();
        for corner in [volume.min, volume.max] {
            assert!(camera.project(corner).is_some());
        }
    }

    #[test]
    fn test_camera_aspect() {
        let view = ViewParams {
            width: 400,
            height: 200,
            ..Default::default()
        };
        assert!((view.camera().aspect - 2.0).abs() < 1e-12);
    }
}
