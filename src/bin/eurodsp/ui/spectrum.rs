//! Spectrum analyzer widget
//!
//! Hann-windowed FFT of one channel, read out at log-spaced frequencies.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of points drawn
const SPECTRUM_BINS: usize = 64;
const LOWEST_FREQUENCY: f64 = 20.0;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// (frequency in Hz, FFT bin) for each displayed point
    bins: Vec<(f64, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (frequency in Hz, magnitude in dB)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(size);
        let denominator = size.saturating_sub(1).max(1) as f32;
        let window = (0..size)
            .map(|i| 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / denominator).cos())
            .collect();

        let sample_rate = f64::from(sample_rate);
        let nyquist = (sample_rate / 2.0).min(20_000.0).max(LOWEST_FREQUENCY);
        let ratio = nyquist / LOWEST_FREQUENCY;
        let last_bin = (size / 2).saturating_sub(1);
        let bins: Vec<(f64, usize)> = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let frequency = LOWEST_FREQUENCY * ratio.powf(t);
                let bin = (frequency * size as f64 / sample_rate).round() as usize;
                (frequency, bin.min(last_bin))
            })
            .collect();

        Self {
            window,
            spectrum: bins.iter().map(|&(f, _)| (f, FLOOR_DB)).collect(),
            bins,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Analyze `samples`, which must be exactly as long as the FFT.
    pub fn update(&mut self, samples: impl ExactSizeIterator<Item = f32>) {
        if samples.len() != self.window.len() {
            return;
        }
        for ((bin, sample), w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (point, &(_, index)) in self.spectrum.iter_mut().zip(&self.bins) {
            let power = f64::from(self.scratch[index].norm_sqr()).max(1e-12);
            point.1 = (10.0 * power.log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum, frequency on a log axis
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)]) {
    let block = Block::default()
        .title(" Spectrum (channel 1) ")
        .borders(Borders::ALL);

    let points: Vec<(f64, f64)> = spectrum.iter().map(|&(f, db)| (f.log10(), db)).collect();
    let low = LOWEST_FREQUENCY.log10();
    let high = points.last().map_or(low + 1.0, |&(x, _)| x.max(low + 1.0));
    let top = points.iter().map(|&(_, db)| db).fold(0.0, f64::max) + 10.0;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, top])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
