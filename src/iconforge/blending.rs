#[derive(Clone, Debug, PartialEq)]
pub struct Rgba {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl Rgba {
    pub fn into_array(self) -> [u8; 4] {
        [
            self.r.round().clamp(0.0, 255.0) as u8,
            self.g.round().clamp(0.0, 255.0) as u8,
            self.b.round().clamp(0.0, 255.0) as u8,
            self.a.round().clamp(0.0, 255.0) as u8,
        ]
    }

    pub fn from_array(rgba: &[u8]) -> Rgba {
        Self {
            r: rgba[0] as f32,
            g: rgba[1] as f32,
            b: rgba[2] as f32,
            a: rgba[3] as f32,
        }
    }

    fn map_each<F, T>(color: &Rgba, color2: &Rgba, rgb_fn: F, a_fn: T) -> Rgba
    where
        F: Fn(f32, f32) -> f32,
        T: Fn(f32, f32) -> f32,
    {
        Rgba {
            r: rgb_fn(color.r, color2.r),
            g: rgb_fn(color.g, color2.g),
            b: rgb_fn(color.b, color2.b),
            a: a_fn(color.a, color2.a),
        }
    }

    /// Takes two [u8; 4]s, converts them to Rgba structs, then blends them according to blend_mode by calling blend().
    pub fn blend_u8(color: &[u8], other_color: &[u8], blend_mode: &BlendMode) -> [u8; 4] {
        Rgba::from_array(color)
            .blend(&Rgba::from_array(other_color), blend_mode)
            .into_array()
    }

    /// Blends `other_color` onto this color. `self` is the destination.
    pub fn blend(&self, other_color: &Rgba, blend_mode: &BlendMode) -> Rgba {
        match blend_mode {
            BlendMode::Over => {
                let src_a = other_color.a / 255.0;
                let dst_weight = self.a / 255.0 * (1.0 - src_a);
                let out_a = src_a + dst_weight;
                if out_a <= 0.0 {
                    return Rgba {
                        r: 0.0,
                        g: 0.0,
                        b: 0.0,
                        a: 0.0,
                    };
                }
                Rgba::map_each(
                    self,
                    other_color,
                    |c1, c2| (c2 * src_a + c1 * dst_weight) / out_a,
                    |_, _| out_a * 255.0,
                )
            }
            BlendMode::Multiply => Rgba::map_each(
                self,
                other_color,
                |c1, c2| f32::min(255.0, c1 * c2 / 255.0),
                |a1, a2| a1 * a2 / 255.0,
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BlendMode {
    /// Source-over, the way a 2D canvas draws one image onto another.
    Over,
    Multiply,
}

