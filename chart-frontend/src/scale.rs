//! Coordinate scales. All of them are rebuilt on every render from the measured
//! chart size; none is mutated after construction.

use chrono::{Datelike, NaiveDate};

use crate::surface::fmt_num;

/// Continuous day number used to place dates on a time axis.
pub fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Two linear segments joined at `breakpoint`: `[start, breakpoint]` fills the first
/// `fraction` of the width, `(breakpoint, end]` the rest. Used to compress a sparse
/// early period without squeezing the dense recent one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiecewiseTimeScale {
    start: f64,
    breakpoint: f64,
    end: f64,
    fraction: f64,
    width: f64,
}

impl PiecewiseTimeScale {
    /// Requires `start < breakpoint < end` and `fraction` in (0, 1).
    pub fn new(
        start: NaiveDate,
        breakpoint: NaiveDate,
        end: NaiveDate,
        fraction: f64,
        width: f64,
    ) -> Self {
        debug_assert!(start < breakpoint && breakpoint < end);
        debug_assert!(fraction > 0.0 && fraction < 1.0);
        Self {
            start: day_number(start),
            breakpoint: day_number(breakpoint),
            end: day_number(end),
            fraction,
            width,
        }
    }

    /// A plain linear time scale, expressed as a piecewise one whose segments share a slope.
    pub fn uniform(start: NaiveDate, end: NaiveDate, width: f64) -> Self {
        debug_assert!(start < end);
        let s = day_number(start);
        let e = day_number(end);
        Self {
            start: s,
            breakpoint: (s + e) / 2.0,
            end: e,
            fraction: 0.5,
            width,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn map_date(&self, date: NaiveDate) -> f64 {
        self.map(day_number(date))
    }

    pub fn map(&self, t: f64) -> f64 {
        if t <= self.breakpoint {
            let pct = (t - self.start) / (self.breakpoint - self.start);
            pct * self.fraction * self.width
        } else {
            // Measured back from the right edge so that `end` lands exactly on `width`.
            let remaining = (self.end - t) / (self.end - self.breakpoint);
            self.width - remaining * (1.0 - self.fraction) * self.width
        }
    }

    /// `map` evaluated with the right-hand segment formula, for any `t`.
    pub fn map_right_segment(&self, t: f64) -> f64 {
        let pct = (t - self.breakpoint) / (self.end - self.breakpoint);
        (self.fraction + pct * (1.0 - self.fraction)) * self.width
    }
}

/// Linear map from `domain` to `range`; value axes use `range = (height, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            d0: domain.0,
            d1: domain.1,
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.d0, self.d1)
    }

    pub fn map(&self, v: f64) -> f64 {
        let span = self.d1 - self.d0;
        if span == 0.0 {
            return (self.r0 + self.r1) / 2.0;
        }
        self.r0 + (v - self.d0) / span * (self.r1 - self.r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.d0.min(self.d1), self.d0.max(self.d1), count)
    }
}

/// Round 1/2/5 × 10^k ticks covering `[start, stop]`, at most about `count` of them.
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let Some((i1, i2, inc)) = tick_range(start, stop, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    (i1..=i2)
        .map(|i| {
            if inc < 0.0 {
                i as f64 / -inc
            } else {
                i as f64 * inc
            }
        })
        .collect()
}

/// Tick index range and increment. A negative increment means "divide by its
/// magnitude", which keeps fractional ticks like 0.3 free of float noise.
fn tick_range(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
    let step = (stop - start) / count.max(0.0);
    if !(step.is_finite() && step > 0.0) {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round() as i64;
        i2 = (stop * inv).round() as i64;
        if (i1 as f64) / inv < start {
            i1 += 1;
        }
        if (i2 as f64) / inv > stop {
            i2 -= 1;
        }
        inc = -inv;
    } else {
        let fwd = 10f64.powf(power) * factor;
        i1 = (start / fwd).round() as i64;
        i2 = (stop / fwd).round() as i64;
        if (i1 as f64) * fwd < start {
            i1 += 1;
        }
        if (i2 as f64) * fwd > stop {
            i2 -= 1;
        }
        inc = fwd;
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_range(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

/// Base-10 logarithmic scale over a fixed positive domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LogScale {
    /// Both domain bounds must be positive.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        debug_assert!(domain.0 > 0.0 && domain.1 > 0.0 && domain.0 != domain.1);
        Self {
            d0: domain.0,
            d1: domain.1,
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn map(&self, v: f64) -> f64 {
        let t = (v.ln() - self.d0.ln()) / (self.d1.ln() - self.d0.ln());
        self.r0 + t * (self.r1 - self.r0)
    }

    /// 1..9 × 10^k inside the domain when it spans fewer decades than `count`,
    /// otherwise the powers of ten it contains.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = (self.d0.min(self.d1), self.d0.max(self.d1));
        let i = lo.log10();
        let j = hi.log10();
        let mut out = Vec::new();
        if j - i < count as f64 {
            for p in (i.floor() as i32)..=(j.ceil() as i32) {
                for k in 1..10 {
                    let t = k as f64 * 10f64.powi(p);
                    if t < lo {
                        continue;
                    }
                    if t > hi {
                        break;
                    }
                    out.push(t);
                }
            }
        } else {
            for p in (i.ceil() as i32)..=(j.floor() as i32) {
                out.push(10f64.powi(p));
            }
        }
        out
    }
}

/// Parameter-count label for the size axis, where values are in billions.
pub fn size_label(billions: f64) -> String {
    if billions >= 1000.0 {
        format!("{}T", fmt_num(billions / 1000.0))
    } else {
        format!("{}B", fmt_num(billions))
    }
}

/// Evenly spaced bands with equal inner/outer padding, centered in the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    count: usize,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new(count: usize, width: f64, padding: f64) -> Self {
        let n = count as f64;
        let step = width / (n - padding + padding * 2.0).max(1.0);
        let start = (width - step * (n - padding)) * 0.5;
        Self {
            count,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    /// Left edge of band `index`.
    pub fn position(&self, index: usize) -> f64 {
        debug_assert!(index < self.count);
        self.start + self.step * index as f64
    }

    pub fn center(&self, index: usize) -> f64 {
        self.position(index) + self.bandwidth / 2.0
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn timeline_scale(width: f64) -> PiecewiseTimeScale {
        PiecewiseTimeScale::new(d(2024, 8, 1), d(2025, 7, 1), d(2026, 1, 15), 0.2, width)
    }

    #[test]
    fn piecewise_boundaries_are_exact() {
        let x = timeline_scale(640.0);
        assert_eq!(x.map_date(d(2024, 8, 1)), 0.0);
        assert_eq!(x.map_date(d(2026, 1, 15)), 640.0);
    }

    #[test]
    fn piecewise_is_continuous_at_the_breakpoint() {
        let x = timeline_scale(640.0);
        let b = day_number(d(2025, 7, 1));
        let left = x.map(b);
        let right = x.map_right_segment(b);
        assert!((left - 0.2 * 640.0).abs() < 1e-9);
        assert!((right - 0.2 * 640.0).abs() < 1e-9);
        assert!((x.map(b + 1e-6) - left).abs() < 1e-3);
    }

    #[test]
    fn piecewise_is_monotonic_and_compresses_early_period() {
        let x = timeline_scale(1000.0);
        let mut prev = f64::NEG_INFINITY;
        let mut day = d(2024, 8, 1);
        while day <= d(2026, 1, 15) {
            let px = x.map_date(day);
            assert!(px > prev);
            prev = px;
            day = day.succ_opt().unwrap();
        }
        let early_px_per_day = x.map_date(d(2024, 9, 1)) - x.map_date(d(2024, 8, 31));
        let late_px_per_day = x.map_date(d(2025, 9, 2)) - x.map_date(d(2025, 9, 1));
        assert!(late_px_per_day > early_px_per_day * 3.0);
    }

    #[test]
    fn uniform_time_scale_is_linear() {
        let x = PiecewiseTimeScale::uniform(d(2025, 1, 1), d(2025, 1, 11), 100.0);
        assert_eq!(x.map_date(d(2025, 1, 1)), 0.0);
        assert_eq!(x.map_date(d(2025, 1, 11)), 100.0);
        assert!((x.map_date(d(2025, 1, 3)) - 20.0).abs() < 1e-9);
        assert!((x.map_date(d(2025, 1, 9)) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn linear_scale_inverts_range_for_value_axes() {
        let y = LinearScale::new((0.0, 45.0), (300.0, 0.0));
        assert_eq!(y.map(0.0), 300.0);
        assert_eq!(y.map(45.0), 0.0);
        assert_eq!(y.ticks(5), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn nice_ticks_match_reference_outputs() {
        assert_eq!(nice_ticks(0.0, 48.0, 4), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(nice_ticks(0.0, 40.0, 4), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(nice_ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(nice_ticks(0.0, 0.9, 3), vec![0.0, 0.2, 0.4, 0.6, 0.8]);
        assert_eq!(nice_ticks(5.0, 5.0, 4), vec![5.0]);
        assert!(nice_ticks(0.0, 10.0, 0).is_empty());
    }

    #[test]
    fn log_scale_boundaries_and_monotonicity() {
        let x = LogScale::new((10.0, 2000.0), (0.0, 500.0));
        assert_eq!(x.map(10.0), 0.0);
        assert_eq!(x.map(2000.0), 500.0);
        let mut prev = f64::NEG_INFINITY;
        for v in (10..=2000).step_by(10) {
            let px = x.map(v as f64);
            assert!(px > prev);
            prev = px;
        }
        assert!((x.map(100.0) - x.map(10.0) - (x.map(1000.0) - x.map(100.0))).abs() < 1e-9);
    }

    #[test]
    fn log_ticks_cover_each_decade() {
        let x = LogScale::new((10.0, 2000.0), (0.0, 500.0));
        let ticks = x.ticks(4);
        assert_eq!(ticks.first(), Some(&10.0));
        assert_eq!(ticks.last(), Some(&2000.0));
        assert_eq!(ticks.len(), 20);
        assert!(ticks.contains(&200.0));

        let wide = LogScale::new((1.0, 1e6), (0.0, 500.0));
        assert_eq!(wide.ticks(4), vec![1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0, 1000000.0]);
    }

    #[test]
    fn size_labels_switch_to_trillions() {
        assert_eq!(size_label(20.0), "20B");
        assert_eq!(size_label(1000.0), "1T");
        assert_eq!(size_label(2000.0), "2T");
    }

    #[test]
    fn band_scale_padding() {
        let x = BandScale::new(5, 530.0, 0.3);
        let step = 530.0 / 5.3;
        assert!((x.bandwidth() - step * 0.7).abs() < 1e-9);
        assert!((x.position(0) - step * 0.3).abs() < 1e-9);
        assert!((x.position(4) + x.bandwidth() + step * 0.3 - 530.0).abs() < 1e-9);
    }
}
