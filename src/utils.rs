use mortality_atlas::Year;

/// Chart margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Margin {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn inner(&self, width: f64, height: f64) -> (f64, f64) {
        (
            (width - self.left - self.right).max(0.0),
            (height - self.top - self.bottom).max(0.0),
        )
    }
}

/// Linear map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return d0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }
}

/// Upper bound of a value axis: the data maximum plus 10% headroom.
pub fn padded_max(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// `count + 1` evenly spaced ticks over `[0, max]`.
pub fn value_ticks(max: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return vec![0.0];
    }
    (0..=count)
        .map(|i| max * i as f64 / count as f64)
        .collect()
}

/// Label every n-th year so that about five labels remain.
pub fn label_frequency(year_count: usize) -> usize {
    (year_count / 5).max(1)
}

/// Rates are shown with two decimals.
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}", rate)
}

/// Bar chart height: grows with the number of rows.
pub fn bar_chart_height(rows: usize, row_height: f64, min_height: f64) -> f64 {
    (rows as f64 * row_height).max(min_height)
}

/// Evenly spaced bands with 20% padding, like `d3.scaleBand().padding(0.2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    pub count: usize,
    pub range: f64,
}

impl BandScale {
    const PADDING: f64 = 0.2;

    fn step(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.range / (self.count as f64 + Self::PADDING)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - Self::PADDING)
    }

    pub fn position(&self, index: usize) -> f64 {
        self.step() * (Self::PADDING + index as f64)
    }
}

/// Year closest to an x pixel on a year axis.
pub fn year_at(scale: &LinearScale, years: &[Year], pixel: f64) -> Option<Year> {
    mortality_atlas::playback::closest_year(years, scale.invert(pixel))
}

/// Key of the position nearest to `pixel`. The first one wins a tie.
pub fn nearest_line<K>(positions: impl IntoIterator<Item = (K, f64)>, pixel: f64) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, position) in positions {
        let distance = (position - pixel).abs();
        if best.as_ref().map_or(true, |(_, nearest)| distance < *nearest) {
            best = Some((key, distance));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scale_maps_and_inverts() {
        let scale = LinearScale::new((1990.0, 2010.0), (0.0, 200.0));
        assert_eq!(scale.map(2000.0), 100.0);
        assert_eq!(scale.invert(50.0), 1995.0);

        let flipped = LinearScale::new((0.0, 10.0), (100.0, 0.0));
        assert_eq!(flipped.map(10.0), 0.0);

        let flat = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert_eq!(flat.map(5.0), 50.0);
    }

    #[test]
    fn axis_helpers() {
        assert!((padded_max(10.0) - 11.0).abs() < 1e-9);
        assert_eq!(padded_max(0.0), 1.0);
        assert_eq!(value_ticks(10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(label_frequency(3), 1);
        assert_eq!(label_frequency(30), 6);
        assert_eq!(format_rate(3.14159), "3.14");
        assert_eq!(bar_chart_height(3, 40.0, 400.0), 400.0);
        assert_eq!(bar_chart_height(20, 40.0, 400.0), 800.0);
    }

    #[test]
    fn bands_fit_the_range() {
        let bands = BandScale {
            count: 4,
            range: 420.0,
        };
        let last_end = bands.position(3) + bands.bandwidth();
        assert!((last_end - 400.0).abs() < 1e-9);
        assert_eq!(BandScale { count: 0, range: 100.0 }.bandwidth(), 0.0);
    }

    #[test]
    fn year_at_snaps_to_available_years() {
        let scale = LinearScale::new((1990.0, 2010.0), (0.0, 200.0));
        assert_eq!(year_at(&scale, &[1990, 2000, 2010], 40.0), Some(1990));
        assert_eq!(year_at(&scale, &[1990, 2000, 2010], 160.0), Some(2010));
        // halfway between two years snaps forward
        assert_eq!(year_at(&scale, &[1990, 2000, 2010], 50.0), Some(2000));
        assert_eq!(year_at(&scale, &[1990, 2000, 2010], -30.0), Some(1990));
    }

    #[test]
    fn click_picks_the_line_drawn_closest() {
        let y = LinearScale::new((0.0, 100.0), (400.0, 0.0));
        let lines = [(1u32, y.map(80.0)), (2, y.map(30.0)), (3, y.map(10.0))];
        assert_eq!(nearest_line(lines, y.map(25.0)), Some(2));
        assert_eq!(nearest_line(lines, 0.0), Some(1));
        assert_eq!(nearest_line([(4u32, 10.0), (5, 30.0)], 20.0), Some(4));
        assert_eq!(nearest_line(Vec::<(u32, f64)>::new(), 5.0), None);
    }
}
