/// Play time of a number of sample frames at a sample rate, split into whole hours,
/// minutes and seconds plus floored milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub milliseconds: u16,
}

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;

impl Duration {
    /// A sample rate of zero gives an all-zero duration.
    pub fn new(sample_frame_count: u64, sample_rate: u32) -> Self {
        if sample_rate == 0 {
            return Duration::default();
        }
        let rate = sample_rate as u64;

        let frames_per_hour = rate * SECONDS_PER_HOUR;
        let hours = sample_frame_count / frames_per_hour;
        let remaining = sample_frame_count % frames_per_hour;

        let frames_per_minute = rate * SECONDS_PER_MINUTE;
        let minutes = remaining / frames_per_minute;
        let remaining = remaining % frames_per_minute;

        let seconds = remaining / rate;
        let remaining = remaining % rate;

        // remaining < rate <= u32::MAX, so the product fits in u64
        let milliseconds = remaining * 1000 / rate;

        Duration {
            hours,
            minutes: minutes as u8,
            seconds: seconds as u8,
            milliseconds: milliseconds as u16,
        }
    }

    /// Total length in seconds, milliseconds included.
    pub fn as_secs_f64(&self) -> f64 {
        (self.hours * SECONDS_PER_HOUR + self.minutes as u64 * SECONDS_PER_MINUTE + self.seconds as u64)
            as f64
            + self.milliseconds as f64 / 1000.0
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        let secs = value.hours * SECONDS_PER_HOUR
            + value.minutes as u64 * SECONDS_PER_MINUTE
            + value.seconds as u64;
        std::time::Duration::from_secs(secs) + std::time::Duration::from_millis(value.milliseconds as u64)
    }
}

#[cfg(test)]
mod duration_tests {
    use super::*;

    #[test]
    fn cascades_units() {
        let rate = 44100u32;
        let frames = (2 * 3600 + 3 * 60 + 4) * rate as u64 + rate as u64 / 2;
        let duration = Duration::new(frames, rate);
        assert_eq!(
            duration,
            Duration {
                hours: 2,
                minutes: 3,
                seconds: 4,
                milliseconds: 500
            }
        );
    }

    #[test]
    fn one_second_and_one_hour_at_any_rate() {
        for rate in [1u32, 8000, 44100, 192_000, u32::MAX] {
            let r = rate as u64;
            assert_eq!(
                Duration::new(r, rate),
                Duration {
                    hours: 0,
                    minutes: 0,
                    seconds: 1,
                    milliseconds: 0
                }
            );
            assert_eq!(
                Duration::new(r * 3600, rate),
                Duration {
                    hours: 1,
                    minutes: 0,
                    seconds: 0,
                    milliseconds: 0
                }
            );
        }
    }

    #[test]
    fn milliseconds_are_floored() {
        // 1 frame at 3 Hz is 333.33 ms
        assert_eq!(Duration::new(1, 3).milliseconds, 333);
        assert_eq!(Duration::new(2, 3).milliseconds, 666);
        assert_eq!(Duration::new(44099, 44100).milliseconds, 999);
    }

    #[test]
    fn zero_rate_and_zero_frames() {
        assert_eq!(Duration::new(1000, 0), Duration::default());
        assert_eq!(Duration::new(0, 48000), Duration::default());
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        let duration = Duration::new(u64::MAX, u32::MAX);
        assert!(duration.minutes < 60);
        assert!(duration.seconds < 60);
        assert!(duration.milliseconds < 1000);

        let one_frame = Duration::new(u64::MAX, 1);
        assert_eq!(one_frame.hours, u64::MAX / 3600);
    }

    #[test]
    fn ordering_and_std_conversion() {
        let short = Duration::new(100, 1000);
        let long = Duration::new(61_000, 1000);
        assert!(short < long);
        let std_duration: std::time::Duration = long.into();
        assert_eq!(std_duration.as_millis(), 61_000);
        approx_eq::assert_approx_eq!(long.as_secs_f64(), 61.0, 1e-9);
    }
}
