use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid};

/// External current as a function of time (ms).
///
/// Integrators query stage and half-step instants, so implementations must
/// be defined everywhere on the run domain and safe to share across threads.
pub trait Stimulus: Send + Sync {
    fn sample(&self, t: f64) -> f64;
}

impl<F> Stimulus for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn sample(&self, t: f64) -> f64 {
        self(t)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum StimulusSpec {
    Constant {
        amplitude: f64,
    },

    /// `amplitude` on `[start, start + duration)`, zero elsewhere.
    Pulse {
        amplitude: f64,
        start: f64,
        duration: f64,
    },

    Sinusoid {
        amplitude: f64,
        /// Hz
        frequency: f64,
        #[serde(default)]
        offset: f64,
    },

    /// Square wave: `amplitude` while the sine at `frequency` is positive.
    Burst {
        amplitude: f64,
        frequency: f64,
    },

    /// Gaussian noise drawn once on a grid of `resolution` ms and held between points.
    /// The grid may hold at most [`MAX_NOISE_SAMPLES`] points.
    Noise {
        mean: f64,
        std: f64,
        seed: u64,
        #[serde(default = "default_noise_resolution")]
        resolution: f64,
    },

    /// Each value held for `slot` ms, the sequence played `repeats` times, then zero.
    Pattern {
        values: Vec<f64>,
        slot: f64,
        #[serde(default = "default_repeats")]
        repeats: u32,
    },

    Sum {
        parts: Vec<StimulusSpec>,
    },
}

/// Upper bound on the points drawn for one noise stimulus.
pub const MAX_NOISE_SAMPLES: usize = 10_000_000;

fn default_noise_resolution() -> f64 {
    0.1
}

fn default_repeats() -> u32 {
    1
}

impl Default for StimulusSpec {
    fn default() -> Self {
        StimulusSpec::Constant { amplitude: 0.0 }
    }
}

impl StimulusSpec {
    /// Builds the waveform for a run over `[t_start, t_end]`.
    pub fn build(&self, t_start: f64, t_end: f64) -> Result<Waveform> {
        let ensure_finite = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(invalid(format!("stimulus {name} must be finite, got {value}")))
            }
        };

        match self {
            StimulusSpec::Constant { amplitude } => {
                ensure_finite("amplitude", *amplitude)?;
                Ok(Waveform::Constant(*amplitude))
            }
            StimulusSpec::Pulse {
                amplitude,
                start,
                duration,
            } => {
                ensure_finite("amplitude", *amplitude)?;
                ensure_finite("start", *start)?;
                ensure_finite("duration", *duration)?;
                if *duration < 0.0 {
                    return Err(invalid("stimulus duration must be >= 0"));
                }
                Ok(Waveform::Pulse {
                    amplitude: *amplitude,
                    start: *start,
                    stop: start + duration,
                })
            }
            StimulusSpec::Sinusoid {
                amplitude,
                frequency,
                offset,
            } => {
                ensure_finite("amplitude", *amplitude)?;
                ensure_finite("frequency", *frequency)?;
                ensure_finite("offset", *offset)?;
                Ok(Waveform::Sinusoid {
                    amplitude: *amplitude,
                    omega: angular_per_ms(*frequency),
                    offset: *offset,
                })
            }
            StimulusSpec::Burst {
                amplitude,
                frequency,
            } => {
                ensure_finite("amplitude", *amplitude)?;
                ensure_finite("frequency", *frequency)?;
                Ok(Waveform::Burst {
                    amplitude: *amplitude,
                    omega: angular_per_ms(*frequency),
                })
            }
            StimulusSpec::Noise {
                mean,
                std,
                seed,
                resolution,
            } => {
                ensure_finite("mean", *mean)?;
                ensure_finite("std", *std)?;
                if !(resolution.is_finite() && *resolution > 0.0) {
                    return Err(invalid("stimulus resolution must be positive"));
                }
                let normal = Normal::new(*mean, *std)
                    .map_err(|err| invalid(format!("stimulus noise std={std}: {err}")))?;

                let slots = ((t_end - t_start) / resolution).ceil().max(0.0);
                if slots >= MAX_NOISE_SAMPLES as f64 {
                    return Err(invalid(format!(
                        "noise grid of {slots} points at {resolution} ms exceeds {MAX_NOISE_SAMPLES} samples"
                    )));
                }
                let points = slots as usize + 1;

                let mut rng = StdRng::seed_from_u64(*seed);
                let samples = normal.sample_iter(&mut rng).take(points).collect();

                Ok(Waveform::Held {
                    t0: t_start,
                    slot: *resolution,
                    samples,
                })
            }
            StimulusSpec::Pattern {
                values,
                slot,
                repeats,
            } => {
                if values.is_empty() {
                    return Err(invalid("stimulus pattern is empty"));
                }
                for value in values {
                    ensure_finite("pattern value", *value)?;
                }
                if !(slot.is_finite() && *slot > 0.0) {
                    return Err(invalid("stimulus slot must be positive"));
                }

                let total = values.len() * *repeats as usize;
                let span = t_end - t_start;
                if total as f64 * slot > span + slot * 1e-9 {
                    return Err(invalid(format!(
                        "pattern of {total} slots x {slot} ms exceeds the {span} ms run"
                    )));
                }

                let samples = values
                    .iter()
                    .copied()
                    .cycle()
                    .take(total)
                    .collect();

                Ok(Waveform::Held {
                    t0: t_start,
                    slot: *slot,
                    samples,
                })
            }
            StimulusSpec::Sum { parts } => parts
                .iter()
                .map(|part| part.build(t_start, t_end))
                .collect::<Result<Vec<_>>>()
                .map(Waveform::Sum),
        }
    }
}

fn angular_per_ms(frequency_hz: f64) -> f64 {
    std::f64::consts::TAU * frequency_hz / 1000.0
}

/// A built, immutable stimulus.
#[derive(Clone, Debug, PartialEq)]
pub enum Waveform {
    Constant(f64),
    Pulse {
        amplitude: f64,
        start: f64,
        stop: f64,
    },
    Sinusoid {
        amplitude: f64,
        omega: f64,
        offset: f64,
    },
    Burst {
        amplitude: f64,
        omega: f64,
    },
    /// Piecewise constant: `samples[i]` on `[t0 + i·slot, t0 + (i+1)·slot)`,
    /// zero outside the sampled range.
    Held {
        t0: f64,
        slot: f64,
        samples: Vec<f64>,
    },
    Sum(Vec<Waveform>),
}

impl Stimulus for Waveform {
    fn sample(&self, t: f64) -> f64 {
        match self {
            Waveform::Constant(amplitude) => *amplitude,
            Waveform::Pulse {
                amplitude,
                start,
                stop,
            } => {
                if t >= *start && t < *stop {
                    *amplitude
                } else {
                    0.0
                }
            }
            Waveform::Sinusoid {
                amplitude,
                omega,
                offset,
            } => offset + amplitude * (omega * t).sin(),
            Waveform::Burst { amplitude, omega } => {
                if (omega * t).sin() > 0.0 {
                    *amplitude
                } else {
                    0.0
                }
            }
            Waveform::Held { t0, slot, samples } => {
                if t < *t0 {
                    return 0.0;
                }
                let index = ((t - t0) / slot).floor() as usize;
                samples.get(index).copied().unwrap_or(0.0)
            }
            Waveform::Sum(parts) => parts.iter().map(|part| part.sample(t)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(spec: StimulusSpec) -> Waveform {
        spec.build(0.0, 100.0).unwrap()
    }

    #[test]
    fn pulse_is_half_open() {
        let w = build(StimulusSpec::Pulse {
            amplitude: 10.0,
            start: 5.0,
            duration: 2.0,
        });
        assert_eq!(w.sample(4.999), 0.0);
        assert_eq!(w.sample(5.0), 10.0);
        assert_eq!(w.sample(6.5), 10.0);
        assert_eq!(w.sample(7.0), 0.0);
    }

    #[test]
    fn sinusoid_frequency_in_hz() {
        let w = build(StimulusSpec::Sinusoid {
            amplitude: 2.0,
            frequency: 10.0,
            offset: 1.0,
        });
        // 10 Hz → quarter period at 25 ms
        assert!((w.sample(25.0) - 3.0).abs() < 1e-12);
        assert!((w.sample(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn burst_follows_sine_sign() {
        let w = build(StimulusSpec::Burst {
            amplitude: 4.0,
            frequency: 10.0,
        });
        assert_eq!(w.sample(10.0), 4.0);
        assert_eq!(w.sample(60.0), 0.0);
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let spec = |seed| StimulusSpec::Noise {
            mean: 1.0,
            std: 0.5,
            seed,
            resolution: 0.1,
        };
        let a = build(spec(7));
        let b = build(spec(7));
        let c = build(spec(8));
        let times: Vec<f64> = (0..500).map(|i| i as f64 * 0.173).collect();
        let sa: Vec<f64> = times.iter().map(|&t| a.sample(t)).collect();
        let sb: Vec<f64> = times.iter().map(|&t| b.sample(t)).collect();
        let sc: Vec<f64> = times.iter().map(|&t| c.sample(t)).collect();
        assert_eq!(sa, sb);
        assert_ne!(sa, sc);
    }

    #[test]
    fn noise_statistics_roughly_match() {
        let w = build(StimulusSpec::Noise {
            mean: 2.0,
            std: 3.0,
            seed: 42,
            resolution: 0.01,
        });
        let Waveform::Held { samples, .. } = &w else {
            panic!("noise builds a held waveform");
        };
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!((mean - 2.0).abs() < 0.1, "mean={mean}");
        assert!((var.sqrt() - 3.0).abs() < 0.1, "std={}", var.sqrt());
    }

    #[test]
    fn noise_is_held_between_grid_points() {
        let w = build(StimulusSpec::Noise {
            mean: 0.0,
            std: 1.0,
            seed: 1,
            resolution: 1.0,
        });
        assert_eq!(w.sample(3.0), w.sample(3.99));
        assert!(w.sample(100.0).is_finite());
    }

    #[test]
    fn noise_rejects_negative_std_and_oversized_grid() {
        let noise = |std, resolution| StimulusSpec::Noise {
            mean: 0.0,
            std,
            seed: 3,
            resolution,
        };
        assert!(noise(-1.0, 0.1).build(0.0, 100.0).is_err());
        assert!(noise(f64::NAN, 0.1).build(0.0, 100.0).is_err());
        assert!(matches!(
            noise(1.0, 1e-12).build(0.0, 100.0),
            Err(crate::error::SimError::InvalidConfiguration(_))
        ));
        noise(0.0, 0.1).build(0.0, 100.0).unwrap();
    }

    #[test]
    fn pattern_repeats_then_goes_quiet() {
        let w = build(StimulusSpec::Pattern {
            values: vec![1.0, 2.0, 3.0],
            slot: 10.0,
            repeats: 2,
        });
        let got: Vec<f64> = (0..8).map(|i| w.sample(i as f64 * 10.0 + 5.0)).collect();
        assert_eq!(got, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn pattern_longer_than_run_is_rejected() {
        let spec = StimulusSpec::Pattern {
            values: vec![1.0; 10],
            slot: 5.0,
            repeats: 3,
        };
        assert!(spec.build(0.0, 100.0).is_err());
    }

    #[test]
    fn sum_adds_parts() {
        let w = build(StimulusSpec::Sum {
            parts: vec![
                StimulusSpec::Constant { amplitude: 1.5 },
                StimulusSpec::Pulse {
                    amplitude: 2.0,
                    start: 0.0,
                    duration: 1.0,
                },
            ],
        });
        assert_eq!(w.sample(0.5), 3.5);
        assert_eq!(w.sample(2.0), 1.5);
    }

    #[test]
    fn spec_parses_from_json() {
        let spec: StimulusSpec =
            serde_json::from_str(r#"{"mode": "pulse", "amplitude": 10, "start": 5, "duration": 1}"#)
                .unwrap();
        assert_eq!(
            spec,
            StimulusSpec::Pulse {
                amplitude: 10.0,
                start: 5.0,
                duration: 1.0
            }
        );
    }

    #[test]
    fn closures_are_stimuli() {
        let ramp = |t: f64| 0.5 * t;
        assert_eq!(Stimulus::sample(&ramp, 4.0), 2.0);
    }
}
