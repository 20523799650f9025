use serde::Serialize;

use crate::error::{Result, invalid};
use crate::neuro::neuron::NeuronState;

/// Receives every committed state, in time order. Never sees trial states.
pub trait RecordingSink {
    fn accept(&mut self, t: f64, state: &NeuronState);
}

impl<S: RecordingSink + ?Sized> RecordingSink for &mut S {
    fn accept(&mut self, t: f64, state: &NeuronState) {
        (**self).accept(t, state)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub t: f64,
    pub state: NeuronState,
}

/// Append-only history of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    variables: Vec<String>,
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(variables: &[&str]) -> Self {
        Self {
            variables: variables.iter().map(|name| name.to_string()).collect(),
            samples: Vec::new(),
        }
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    /// Values of one named variable over time.
    pub fn trace(&self, variable: &str) -> Option<Vec<f64>> {
        let index = self.variables.iter().position(|name| name == variable)?;
        Some(self.column(index))
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.state.as_slice()[index])
            .collect()
    }

    /// Recorded span (ms), zero for fewer than two samples.
    pub fn span(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.t - first.t,
            _ => 0.0,
        }
    }
}

impl RecordingSink for TimeSeries {
    fn accept(&mut self, t: f64, state: &NeuronState) {
        debug_assert!(
            self.samples.last().is_none_or(|last| t > last.t),
            "recorded time must increase"
        );
        self.samples.push(Sample {
            t,
            state: state.clone(),
        });
    }
}

/// Upward threshold crossings of the membrane potential.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpikeTrain {
    pub times: Vec<f64>,
}

impl SpikeTrain {
    /// A spike is recorded at the first sample at or above `threshold`
    /// following a sample below it.
    pub fn detect(series: &TimeSeries, threshold: f64) -> Self {
        let times = series
            .samples()
            .windows(2)
            .filter(|pair| pair[0].state.v() < threshold && pair[1].state.v() >= threshold)
            .map(|pair| pair[1].t)
            .collect();
        Self { times }
    }

    pub fn count(&self) -> usize {
        self.times.len()
    }

    /// Inter-spike intervals (ms).
    pub fn intervals(&self) -> Vec<f64> {
        self.times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Inter-spike intervals binned into `bins` equal-width bins between the
    /// shortest and longest interval.
    pub fn isi_histogram(&self, bins: usize) -> Result<Histogram> {
        if bins == 0 {
            return Err(invalid("histogram needs at least one bin"));
        }
        let intervals = self.intervals();

        let shortest = intervals.iter().copied().reduce(f64::min);
        let longest = intervals.iter().copied().reduce(f64::max);
        let (lo, hi) = match (shortest, longest) {
            (Some(lo), Some(hi)) if hi > lo => (lo, hi),
            (Some(lo), _) => (lo - 0.5, lo + 0.5),
            _ => (0.0, 1.0),
        };

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for isi in intervals {
            // The last bin is closed on the right.
            let index = (((isi - lo) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Ok(Histogram { counts, edges })
    }

    /// Mean firing rate (Hz) over `span_ms`.
    pub fn rate_hz(&self, span_ms: f64) -> f64 {
        if span_ms <= 0.0 {
            return 0.0;
        }
        self.count() as f64 / (span_ms / 1000.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    /// `counts.len() + 1` bin edges (ms)
    pub edges: Vec<f64>,
}
