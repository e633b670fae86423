//! Linear-RGBA color gradient sampled by the backdrop builder.

use serde::{Deserialize, Serialize};

/// One gradient stop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    /// Position along the gradient (0.0 - 1.0)
    pub position: f32,
    /// Linear RGBA
    pub color: [f32; 4],
}

/// Piecewise-linear gradient. Keys are kept sorted by position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColorKey>", into = "Vec<ColorKey>")]
pub struct ColorGradient {
    keys: Vec<ColorKey>,
}

impl ColorGradient {
    pub fn new(mut keys: Vec<ColorKey>) -> Self {
        keys.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { keys }
    }

    /// Single-color gradient.
    pub fn solid(color: [f32; 4]) -> Self {
        Self::new(vec![ColorKey {
            position: 0.0,
            color,
        }])
    }

    /// Two-stop gradient from `from` at 0 to `to` at 1.
    pub fn linear(from: [f32; 4], to: [f32; 4]) -> Self {
        Self::new(vec![
            ColorKey {
                position: 0.0,
                color: from,
            },
            ColorKey {
                position: 1.0,
                color: to,
            },
        ])
    }

    /// Blue-white-orange star colors.
    pub fn starlight() -> Self {
        Self::new(vec![
            ColorKey {
                position: 0.0,
                color: [0.6, 0.7, 1.0, 1.0],
            },
            ColorKey {
                position: 0.6,
                color: [1.0, 1.0, 1.0, 1.0],
            },
            ColorKey {
                position: 1.0,
                color: [1.0, 0.75, 0.45, 1.0],
            },
        ])
    }

    pub fn keys(&self) -> &[ColorKey] {
        &self.keys
    }

    /// Sample at `t`, clamped to [0, 1]. An empty gradient is white.
    pub fn sample(&self, t: f32) -> [f32; 4] {
        let t = t.clamp(0.0, 1.0);
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return [1.0; 4],
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t <= b.position {
                let span = b.position - a.position;
                let f = if span > 0.0 { (t - a.position) / span } else { 1.0 };
                let mut out = [0.0; 4];
                for (i, channel) in out.iter_mut().enumerate() {
                    *channel = a.color[i] + (b.color[i] - a.color[i]) * f;
                }
                return out;
            }
        }
        last.color
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::solid([1.0; 4])
    }
}

impl From<Vec<ColorKey>> for ColorGradient {
    fn from(keys: Vec<ColorKey>) -> Self {
        Self::new(keys)
    }
}

impl From<ColorGradient> for Vec<ColorKey> {
    fn from(gradient: ColorGradient) -> Self {
        gradient.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_gradient_is_white() {
        assert_eq!(ColorGradient::new(Vec::new()).sample(0.3), [1.0; 4]);
    }

    #[test]
    fn test_linear_midpoint() {
        let g = ColorGradient::linear([0.0, 0.0, 0.0, 1.0], [1.0, 0.5, 0.0, 1.0]);
        let mid = g.sample(0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] - 0.25).abs() < 1e-6);
        assert_eq!(g.sample(-1.0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(g.sample(2.0), [1.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_keys_sorted_on_construction() {
        let g = ColorGradient::new(vec![
            ColorKey {
                position: 1.0,
                color: [1.0; 4],
            },
            ColorKey {
                position: 0.0,
                color: [0.0; 4],
            },
        ]);
        assert_eq!(g.keys()[0].position, 0.0);
        assert_eq!(g.sample(0.0), [0.0; 4]);
    }

    #[test]
    fn test_serde_as_key_list() {
        let json = r#"[{"position":0.0,"color":[1,0,0,1]},{"position":1.0,"color":[0,0,1,1]}]"#;
        let g: ColorGradient = serde_json::from_str(json).unwrap();
        assert_eq!(g.keys().len(), 2);
        assert_eq!(g.sample(1.0), [0.0, 0.0, 1.0, 1.0]);
    }
}
