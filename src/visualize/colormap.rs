use plotters::style::RGBColor;

/// A piecewise-linear gradient sampled into a fixed number of bins.
#[derive(Debug, Clone)]
pub struct Colormap {
    lut: Vec<RGBColor>,
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

impl Colormap {
    /// Builds a map from evenly spaced color stops, quantized to `bins`.
    pub fn from_stops(stops: &[RGBColor], bins: usize) -> Self {
        let bins = bins.max(1);
        let segments = stops.len().saturating_sub(1);

        let lut = (0..bins)
            .map(|i| {
                if segments == 0 {
                    return stops.first().copied().unwrap_or(RGBColor(0, 0, 0));
                }
                let x = if bins == 1 {
                    0.0
                } else {
                    i as f64 / (bins - 1) as f64
                };
                let pos = x * segments as f64;
                let seg = (pos.floor() as usize).min(segments - 1);
                let t = pos - seg as f64;
                let (RGBColor(r0, g0, b0), RGBColor(r1, g1, b1)) = (stops[seg], stops[seg + 1]);
                RGBColor(lerp(r0, r1, t), lerp(g0, g1, t), lerp(b0, b1, t))
            })
            .collect();

        Self { lut }
    }

    /// Blue, light blue, white, pink, red over 100 bins.
    pub fn state_vector() -> Self {
        Self::from_stops(
            &[
                RGBColor(0, 0, 255),
                RGBColor(173, 216, 230),
                RGBColor(255, 255, 255),
                RGBColor(255, 192, 203),
                RGBColor(255, 0, 0),
            ],
            100,
        )
    }

    /// Bin for `value`, clamped to [0, 1]. Non-decreasing in `value`.
    pub fn bin(&self, value: f64) -> usize {
        let n = self.lut.len();
        if value.is_nan() {
            return 0;
        }
        let scaled = (value.clamp(0.0, 1.0) * n as f64) as usize;
        scaled.min(n - 1)
    }

    pub fn color(&self, value: f64) -> RGBColor {
        self.lut[self.bin(value)]
    }
}
