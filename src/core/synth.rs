//! Purpose: Convert normalized patterns into device-ready `(duration, amplitude)` sequences.
//! Exports: `SynthOptions`, `synthesize`, `synthesize_package`, `coalesce`, `split_timings`,
//! `clamp_amp`, `pulse_count`.
//! Role: Final pipeline stage; output feeds a platform player that is out of scope here.
//! Invariants: All arithmetic is integer; emitted durations use truncating division and the
//! last slice of a train absorbs the remainder, so a train sums to its requested length.
//! Invariants: Every emitted amplitude lies in `[0, amplitude_scale]`.

use tracing::trace;

use crate::core::model::{EventTag, VibrateEvent, VibratePackage, VibratePattern, WaveformSegment};

pub const MIN_UNIT: i64 = 2;
pub const DEFAULT_DURATION: i64 = 1000;
pub const MAX_AMPLITUDE: i32 = 255;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SynthOptions {
    amplitude_scale: i32,
}

impl SynthOptions {
    pub fn new() -> Self {
        Self {
            amplitude_scale: MAX_AMPLITUDE,
        }
    }

    /// Target-device amplitude ceiling, clamped into `[0, 255]`.
    pub fn with_amplitude_scale(mut self, amplitude_scale: i32) -> Self {
        self.amplitude_scale = amplitude_scale.clamp(0, MAX_AMPLITUDE);
        self
    }

    pub fn amplitude_scale(&self) -> i32 {
        self.amplitude_scale
    }
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an intensity in `[0, 100]` linearly onto `[0, scale]`.
pub fn clamp_amp(intensity: i32, scale: i32) -> i32 {
    let scale = scale.max(0);
    (i64::from(intensity) * i64::from(scale) / 100).clamp(0, i64::from(scale)) as i32
}

/// Number of on/off pulses used to approximate `frequency` over `duration_ms`.
///
/// Capped at `duration_ms / 2` so each half-pulse lasts at least 1 ms.
pub fn pulse_count(frequency: i32, duration_ms: i64) -> i64 {
    let wanted = i64::from(frequency) * duration_ms * MIN_UNIT / DEFAULT_DURATION;
    wanted.min(duration_ms / 2).max(1)
}

pub fn synthesize(pattern: &VibratePattern, options: &SynthOptions) -> Vec<WaveformSegment> {
    if pattern.events().is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    if pattern.start_time_ms() > 0 {
        out.push(WaveformSegment::silence(i64::from(pattern.start_time_ms())));
    }
    render_events(pattern.events(), options, &mut out);
    out
}

/// Render every pattern on one absolute timeline; each pattern start becomes a gap measured
/// from the end of whatever was rendered before it.
pub fn synthesize_package(package: &VibratePackage, options: &SynthOptions) -> Vec<WaveformSegment> {
    let mut out = Vec::new();
    let mut played = 0i64;
    for pattern in package.patterns() {
        if pattern.events().is_empty() {
            continue;
        }
        let start = i64::from(pattern.start_time_ms());
        if start > played {
            out.push(WaveformSegment::silence(start - played));
            played = start;
        }
        played += render_events(pattern.events(), options, &mut out);
    }
    out
}

/// Drop zero-length segments and merge neighbours that share an amplitude.
pub fn coalesce(segments: Vec<WaveformSegment>) -> Vec<WaveformSegment> {
    let mut merged: Vec<WaveformSegment> = Vec::with_capacity(segments.len());
    for segment in segments.into_iter().filter(|s| s.duration_ms > 0) {
        match merged.last_mut() {
            Some(last) if last.amplitude == segment.amplitude => last.duration_ms += segment.duration_ms,
            _ => merged.push(segment),
        }
    }
    merged
}

/// Android-style parallel `timings` / `amplitudes` arrays.
pub fn split_timings(segments: &[WaveformSegment]) -> (Vec<i64>, Vec<i32>) {
    segments
        .iter()
        .map(|segment| (segment.duration_ms, segment.amplitude))
        .unzip()
}

fn render_events(events: &[VibrateEvent], options: &SynthOptions, out: &mut Vec<WaveformSegment>) -> i64 {
    let scale = options.amplitude_scale();
    let mut cursor = 0i64;
    for event in events {
        let at = i64::from(event.time_ms());
        if at > cursor {
            out.push(WaveformSegment::silence(at - cursor));
            cursor = at;
        }
        cursor += match event.tag() {
            EventTag::Transient => {
                let duration = i64::from(event.duration_ms());
                out.push(WaveformSegment::new(duration, clamp_amp(event.intensity(), scale)));
                duration
            }
            EventTag::Continuous if event.points().is_empty() => {
                let duration = i64::from(event.duration_ms());
                pulse_train(
                    out,
                    duration,
                    clamp_amp(event.intensity(), scale),
                    event.frequency(),
                );
                duration
            }
            EventTag::Continuous => render_curve(event, scale, out),
        };
    }
    cursor
}

fn render_curve(event: &VibrateEvent, scale: i32, out: &mut Vec<WaveformSegment>) -> i64 {
    let points = event.points();
    let Some(first) = points.first() else {
        return 0;
    };
    let lead = i64::from(first.time_ms());
    if lead > 0 {
        out.push(WaveformSegment::silence(lead));
    }
    for pair in points.windows(2) {
        let slice = i64::from(pair[1].time_ms() - pair[0].time_ms());
        let frequency = event.frequency() + pair[0].frequency();
        trace!(slice, frequency, intensity = pair[0].intensity(), "curve slice");
        pulse_train(out, slice, clamp_amp(pair[0].intensity(), scale), frequency);
    }
    points.last().map_or(0, |last| i64::from(last.time_ms()))
}

fn pulse_train(out: &mut Vec<WaveformSegment>, duration_ms: i64, amplitude: i32, frequency: i32) {
    if duration_ms <= 0 {
        return;
    }
    let count = pulse_count(frequency, duration_ms);
    if count == 1 {
        out.push(WaveformSegment::new(duration_ms, amplitude));
        return;
    }
    let slice = duration_ms / count;
    for pulse in 0..count {
        let length = if pulse == count - 1 {
            duration_ms - slice * (count - 1)
        } else {
            slice
        };
        let off = length / 2;
        out.push(WaveformSegment::new(length - off, amplitude));
        out.push(WaveformSegment::silence(off));
    }
}

#[cfg(test)]
mod tests {
    use super::{
        SynthOptions, clamp_amp, coalesce, pulse_count, split_timings, synthesize,
        synthesize_package,
    };
    use crate::core::dialect::Dialect;
    use crate::core::model::{
        CurvePoint, VibrateEvent, VibratePackage, VibratePattern, WaveformSegment,
    };

    fn total(segments: &[WaveformSegment]) -> i64 {
        segments.iter().map(|s| s.duration_ms).sum()
    }

    #[test]
    fn clamp_amp_is_linear_and_bounded() {
        assert_eq!(clamp_amp(50, 255), 127);
        assert_eq!(clamp_amp(100, 255), 255);
        assert_eq!(clamp_amp(0, 255), 0);
        assert_eq!(clamp_amp(100, 128), 128);
        assert_eq!(clamp_amp(50, -4), 0);
    }

    #[test]
    fn pulse_count_follows_frequency() {
        assert_eq!(pulse_count(0, 1000), 1);
        assert_eq!(pulse_count(-30, 1000), 1);
        assert_eq!(pulse_count(50, 1000), 100);
        assert_eq!(pulse_count(100, 5), 1);
        assert_eq!(pulse_count(100, 10), 2);
        assert_eq!(pulse_count(100, 1), 1);
    }

    #[test]
    fn empty_pattern_emits_nothing() {
        let pattern = VibratePattern::new(500, Vec::new());
        assert!(synthesize(&pattern, &SynthOptions::default()).is_empty());
    }

    #[test]
    fn flat_continuous_without_frequency_is_one_segment() {
        let event = VibrateEvent::continuous(0, 1000, 50, 0, 0, Vec::new()).expect("event");
        let segments = synthesize(&VibratePattern::new(0, vec![event]), &SynthOptions::default());
        assert_eq!(segments, vec![WaveformSegment::new(1000, 127)]);
    }

    #[test]
    fn pulse_train_sums_to_event_duration() {
        for frequency in [1, 7, 30, 50, 100] {
            let event = VibrateEvent::continuous(0, 997, 80, frequency, 0, Vec::new()).expect("event");
            let segments = synthesize(&VibratePattern::new(0, vec![event]), &SynthOptions::default());
            assert_eq!(total(&segments), 997, "frequency {frequency}");
            assert!(segments.iter().all(|s| s.amplitude == 0 || s.amplitude == 204));
            assert!(segments.iter().all(|s| s.duration_ms > 0));
        }
    }

    #[test]
    fn lead_in_and_gaps_are_silence() {
        let events = vec![
            VibrateEvent::transient(0, 100, 0, 0).expect("a"),
            VibrateEvent::transient(100, 100, 0, 0).expect("b"),
            VibrateEvent::transient(148, 100, 0, 0).expect("c"),
        ];
        let segments = synthesize(&VibratePattern::new(250, events), &SynthOptions::default());
        assert_eq!(
            segments,
            vec![
                WaveformSegment::silence(250),
                WaveformSegment::new(48, 255),
                WaveformSegment::silence(52),
                WaveformSegment::new(48, 255),
                WaveformSegment::new(48, 255),
            ]
        );
    }

    #[test]
    fn curve_slices_use_point_levels() {
        let points = vec![
            CurvePoint::new(10, 100, 0).expect("p0"),
            CurvePoint::new(20, 50, 0).expect("p1"),
            CurvePoint::new(30, 20, 100).expect("p2"),
            CurvePoint::new(40, 0, 0).expect("p3"),
        ];
        let event = VibrateEvent::continuous(0, 50, 90, 0, 0, points).expect("event");
        let options = SynthOptions::new().with_amplitude_scale(200);
        let segments = synthesize(&VibratePattern::new(0, vec![event]), &options);
        assert_eq!(segments[0], WaveformSegment::silence(10));
        assert_eq!(segments[1], WaveformSegment::new(10, 200));
        assert_eq!(segments[2], WaveformSegment::new(10, 100));
        // frequency 100 over 10 ms asks for 2 pulses
        assert_eq!(
            &segments[3..],
            &[
                WaveformSegment::new(3, 40),
                WaveformSegment::silence(2),
                WaveformSegment::new(3, 40),
                WaveformSegment::silence(2),
            ]
        );
        assert!(segments.iter().all(|s| (0..=200).contains(&s.amplitude)));
    }

    #[test]
    fn package_rendering_places_patterns_on_one_timeline() {
        let first = VibratePattern::new(100, vec![VibrateEvent::transient(0, 100, 0, 0).expect("a")]);
        let second = VibratePattern::new(1000, vec![VibrateEvent::transient(0, 100, 0, 0).expect("b")]);
        let package = VibratePackage::new(Dialect::He, vec![first, second], 1048);
        let segments = synthesize_package(&package, &SynthOptions::default());
        assert_eq!(
            segments,
            vec![
                WaveformSegment::silence(100),
                WaveformSegment::new(48, 255),
                WaveformSegment::silence(852),
                WaveformSegment::new(48, 255),
            ]
        );
        assert_eq!(total(&segments), 1048);
    }

    #[test]
    fn coalesce_merges_equal_neighbours() {
        let merged = coalesce(vec![
            WaveformSegment::silence(10),
            WaveformSegment::silence(0),
            WaveformSegment::silence(5),
            WaveformSegment::new(48, 200),
            WaveformSegment::new(0, 10),
            WaveformSegment::new(48, 200),
        ]);
        assert_eq!(
            merged,
            vec![WaveformSegment::silence(15), WaveformSegment::new(96, 200)]
        );
    }

    #[test]
    fn split_timings_keeps_order() {
        let (timings, amplitudes) = split_timings(&[
            WaveformSegment::silence(20),
            WaveformSegment::new(48, 99),
        ]);
        assert_eq!(timings, vec![20, 48]);
        assert_eq!(amplitudes, vec![0, 99]);
    }
}
