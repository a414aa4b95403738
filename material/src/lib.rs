use radiometry::color::Color;

/// Surface description attached to every primitive of a scene: a base colour plus the Phong
/// terms used by shading, and how much light passes through.
///
/// `transparency` is the fraction of light a shadow feeler keeps when it crosses the surface:
/// 0 is opaque, 1 is fully clear. `ior` is only meaningful for transparent surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    pub transparency: f32,
    pub ior: f32,
}

impl Material {
    pub fn new(
        color: Color,
        diffuse: f32,
        specular: f32,
        shininess: f32,
        transparency: f32,
        ior: f32,
    ) -> Self {
        assert!(
            (0.0..=1.0).contains(&transparency),
            "transparency {} out of [0, 1]",
            transparency
        );
        Material {
            color,
            diffuse,
            specular,
            shininess,
            transparency,
            ior,
        }
    }

    /// Plain diffuse surface of the given colour.
    pub fn matte(color: Color) -> Self {
        Self::new(color, 1.0, 0.0, 0.0, 0.0, 1.0)
    }

    /// Shiny opaque surface.
    pub fn plastic(color: Color, shininess: f32) -> Self {
        Self::new(color, 0.7, 0.3, shininess, 0.0, 1.0)
    }

    /// Tinted see-through surface.
    pub fn glass(color: Color, transparency: f32, ior: f32) -> Self {
        Self::new(color, 0.1, 0.9, 60.0, transparency, ior)
    }

    pub fn is_opaque(&self) -> bool {
        self.transparency <= 0.0
    }

    /// Per-channel tint and scalar transparency that a shadow feeler picks up at this surface.
    pub fn shadow_filter(&self) -> (Color, f32) {
        (self.color, self.transparency)
    }

    pub fn summary(&self) -> String {
        format!(
            "{:x} kd={:.2} ks={:.2} n={:.0} t={:.2} ior={:.2}",
            self.color, self.diffuse, self.specular, self.shininess, self.transparency, self.ior
        )
    }
}

/// Black, no terms. The material the scene starts with until one is set.
impl Default for Material {
    fn default() -> Self {
        Self::new(Color::black(), 0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod test {
    use super::Material;
    use radiometry::color::Color;

    #[test]
    fn glass_lets_light_through() {
        let glass = Material::glass(Color::new(1.0, 0.5, 0.5), 0.8, 1.5);
        assert!(!glass.is_opaque());
        assert_eq!(glass.shadow_filter(), (Color::new(1.0, 0.5, 0.5), 0.8));
        assert!(Material::matte(Color::white()).is_opaque());
        assert!(Material::default().is_opaque());
    }

    #[test]
    #[should_panic]
    fn transparency_out_of_range_panics() {
        Material::new(Color::white(), 1.0, 0.0, 0.0, 1.5, 1.0);
    }
}
