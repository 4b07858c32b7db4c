//! Year-by-year map animation.
//!
//! Only the stepping lives here; the front end owns the single interval
//! timer and cancels it before starting a new one.

use crate::Year;

/// One animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub year: Year,
    /// The animation wrapped around and stopped on this frame.
    pub finished: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playback {
    years: Vec<Year>,
    index: usize,
    playing: bool,
    loading: bool,
}

impl Playback {
    /// `years` must be ascending. Starts at `current`, or the last year.
    pub fn new(years: Vec<Year>, current: Option<Year>) -> Self {
        let index = current
            .and_then(|year| years.iter().position(|y| *y == year))
            .unwrap_or_else(|| years.len().saturating_sub(1));
        Playback {
            years,
            index,
            playing: false,
            loading: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_year(&self) -> Option<Year> {
        self.years.get(self.index).copied()
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// Label of the play button.
    pub fn button_label(&self) -> &'static str {
        if self.playing {
            "Pause"
        } else {
            "Play"
        }
    }

    /// Toggling is refused while the all-years data is loading.
    pub fn can_toggle(&self) -> bool {
        !self.loading && !self.years.is_empty()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Begin playing. Rewinds to the first year when sitting on the last
    /// one and returns that year so the caller can draw it immediately.
    pub fn start(&mut self) -> Option<Year> {
        if self.years.is_empty() {
            return None;
        }
        self.playing = true;
        if self.index + 1 == self.years.len() {
            self.index = 0;
            return self.current_year();
        }
        None
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Advance one year. Wrapping back to the first year stops playback.
    pub fn tick(&mut self) -> Option<Frame> {
        if !self.playing || self.years.is_empty() {
            return None;
        }
        self.index += 1;
        if self.index >= self.years.len() {
            self.index = 0;
        }
        let finished = self.index == 0;
        if finished {
            self.playing = false;
        }
        Some(Frame {
            year: self.years[self.index],
            finished,
        })
    }

    /// Jump to `year` (timeline drag). Unknown years are ignored.
    pub fn seek(&mut self, year: Year) -> bool {
        match self.years.iter().position(|y| *y == year) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }
}

/// The available year nearest to `value`; ties go to the later year.
pub fn closest_year(years: &[Year], value: f64) -> Option<Year> {
    years.iter().copied().reduce(|best, year| {
        if (year as f64 - value).abs() <= (best as f64 - value).abs() {
            year
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn years() -> Vec<Year> {
        vec![1990, 1995, 2000]
    }

    #[test]
    fn starts_on_last_year_by_default() {
        let playback = Playback::new(years(), None);
        assert_eq!(playback.current_year(), Some(2000));
        assert_eq!(Playback::new(years(), Some(1995)).current_year(), Some(1995));
    }

    #[test]
    fn start_at_end_rewinds_then_runs_once_through() {
        let mut playback = Playback::new(years(), None);
        assert_eq!(playback.start(), Some(1990));
        assert_eq!(playback.button_label(), "Pause");
        assert_eq!(playback.tick(), Some(Frame { year: 1995, finished: false }));
        assert_eq!(playback.tick(), Some(Frame { year: 2000, finished: false }));
        assert_eq!(playback.tick(), Some(Frame { year: 1990, finished: true }));
        assert!(!playback.is_playing());
        assert_eq!(playback.tick(), None);
    }

    #[test]
    fn idle_ticks_after_finishing_leave_a_restart_untouched() {
        let mut playback = Playback::new(years(), Some(1995));
        playback.start();
        playback.tick();
        assert!(playback.tick().is_some_and(|frame| frame.finished));
        // a leftover timer firing between the finish and the restart
        assert_eq!(playback.tick(), None);
        assert_eq!(playback.start(), None);
        assert_eq!(playback.tick(), Some(Frame { year: 1995, finished: false }));
        assert!(playback.is_playing());
    }

    #[test]
    fn start_mid_timeline_continues_from_there() {
        let mut playback = Playback::new(years(), Some(1990));
        assert_eq!(playback.start(), None);
        assert_eq!(playback.tick().map(|f| f.year), Some(1995));
        playback.stop();
        assert_eq!(playback.tick(), None);
        assert_eq!(playback.current_year(), Some(1995));
    }

    #[test]
    fn loading_blocks_toggle() {
        let mut playback = Playback::new(years(), None);
        assert!(playback.can_toggle());
        playback.set_loading(true);
        assert!(!playback.can_toggle());
        assert!(!Playback::new(vec![], None).can_toggle());
    }

    #[test]
    fn seek_only_accepts_known_years() {
        let mut playback = Playback::new(years(), None);
        assert!(playback.seek(1995));
        assert!(!playback.seek(1996));
        assert_eq!(playback.current_year(), Some(1995));
    }

    #[rstest]
    #[case(1991.0, Some(1990))]
    #[case(1993.0, Some(1995))]
    #[case(1992.5, Some(1995))]
    #[case(1997.5, Some(2000))]
    #[case(2050.0, Some(2000))]
    fn closest_year_snaps(#[case] value: f64, #[case] expected: Option<Year>) {
        assert_eq!(closest_year(&years(), value), expected);
    }

    #[test]
    fn closest_year_of_nothing() {
        assert_eq!(closest_year(&[], 2000.0), None);
    }
}
