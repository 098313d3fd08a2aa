/// Signal energy at a single target frequency via the Goertzel recursion.
///
/// Runs the second-order recursion `s[n] = x[n] + 2cos(w)*s[n-1] - s[n-2]`
/// over the whole window and returns the squared magnitude of the final
/// filter state. Degenerate bins (`k = 0` or `k >= N/2` after rounding the
/// frequency onto the window's bin grid) return exactly 0.0 rather than an
/// unreliable estimate.
pub fn tone_energy(samples: &[f32], target_freq: f32, sample_rate: usize) -> f32 {
    let n = samples.len();
    let k = ((n as f32 * target_freq) / sample_rate as f32).round();

    if k == 0.0 || k >= n as f32 / 2.0 {
        return 0.0;
    }

    let omega = 2.0 * std::f32::consts::PI * k / n as f32;
    let coeff = 2.0 * omega.cos();

    let mut s_prev = 0.0f32;
    let mut s_prev2 = 0.0f32;
    for &sample in samples {
        let s = sample + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    s_prev * s_prev + s_prev2 * s_prev2 - coeff * s_prev * s_prev2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FREQ_ONE, FREQ_ZERO, SAMPLES_PER_BIT, SAMPLE_RATE, TONE_AMPLITUDE};

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        let angular = 2.0 * std::f32::consts::PI * freq / SAMPLE_RATE as f32;
        (0..len)
            .map(|i| TONE_AMPLITUDE * (angular * i as f32).sin())
            .collect()
    }

    #[test]
    fn pure_tone_concentrates_energy_at_its_own_bin() {
        let window = tone(FREQ_ZERO, SAMPLES_PER_BIT);

        let at_zero = tone_energy(&window, FREQ_ZERO, SAMPLE_RATE);
        let at_one = tone_energy(&window, FREQ_ONE, SAMPLE_RATE);

        assert!(at_zero > 0.0, "tone energy must be positive at its own bin");
        assert!(
            at_zero > at_one * 10.0,
            "expected dominant energy at 2200 Hz, got {at_zero} vs {at_one}"
        );
    }

    #[test]
    fn silence_has_zero_energy_everywhere() {
        let window = vec![0.0f32; SAMPLES_PER_BIT];
        assert_eq!(tone_energy(&window, FREQ_ZERO, SAMPLE_RATE), 0.0);
        assert_eq!(tone_energy(&window, FREQ_ONE, SAMPLE_RATE), 0.0);
    }

    #[test]
    fn degenerate_low_bin_returns_zero() {
        // 100 Hz rounds to bin 0 for a 26-sample window at 8 kHz
        let window = tone(FREQ_ZERO, SAMPLES_PER_BIT);
        assert_eq!(tone_energy(&window, 0.0, SAMPLE_RATE), 0.0);
        assert_eq!(tone_energy(&window, 100.0, SAMPLE_RATE), 0.0);
    }

    #[test]
    fn degenerate_nyquist_bin_returns_zero() {
        // 4000 Hz lands on bin 13 = N/2 for a 26-sample window
        let window = tone(FREQ_ZERO, SAMPLES_PER_BIT);
        assert_eq!(tone_energy(&window, 4000.0, SAMPLE_RATE), 0.0);
    }

    #[test]
    fn empty_window_returns_zero() {
        assert_eq!(tone_energy(&[], FREQ_ZERO, SAMPLE_RATE), 0.0);
    }
}
