//! Surface materials and the light source used while drawing them.

use cgmath::{Matrix4, Point3, Transform};

/// Shading parameters shared by one or more meshes.
///
/// A material with an `alpha` below `1.0` sends its meshes to the alpha list
/// during traversal, where they are drawn after all opaque geometry with
/// blending enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub alpha: f32,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            alpha: 1.0,
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            shininess: 50.0,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_diffuse(mut self, diffuse: [f32; 3]) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_specular(mut self, specular: [f32; 3], shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Only an alpha of exactly `1.0` counts as opaque.
    #[allow(clippy::float_cmp)]
    pub fn is_opaque(&self) -> bool {
        self.alpha == 1.0
    }
}

/// A point light, typically the scene's sun.
#[derive(Clone, Debug, PartialEq)]
pub struct LightSource {
    /// World space position.
    pub position: Point3<f32>,
    /// Position after applying the current view matrix.
    pub adjusted_position: Point3<f32>,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

impl Default for LightSource {
    fn default() -> Self {
        Self::new(Point3::new(100000.0, 100000.0, 0.0))
    }
}

impl LightSource {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            adjusted_position: position,
            ambient: [0.3, 0.3, 0.3],
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
        }
    }

    /// Returns a copy whose `adjusted_position` is expressed in view space.
    pub fn in_view_space(&self, view: &Matrix4<f32>) -> Self {
        Self {
            adjusted_position: view.transform_point(self.position),
            ..self.clone()
        }
    }
}
