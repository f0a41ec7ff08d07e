/// Guesses the next interval of a rhythmic pattern from the recent ones.
///
/// Each candidate period `p` predicts that the next value repeats the one
/// seen `p` observations ago. Every candidate keeps a running error and the
/// best scoring one makes the prediction, so a swung or dotted pattern is
/// followed as well as a steady clock.
#[derive(Debug, Clone)]
pub struct PatternPredictor<const HISTORY: usize = 32, const MAX_PERIOD: usize = 8> {
    history: [u32; HISTORY],
    history_pointer: usize,
    prediction_error: [u32; MAX_PERIOD],
    predicted: [u32; MAX_PERIOD],
}

impl<const HISTORY: usize, const MAX_PERIOD: usize> PatternPredictor<HISTORY, MAX_PERIOD> {
    pub fn new() -> Self {
        Self {
            history: [0; HISTORY],
            history_pointer: 0,
            prediction_error: [0; MAX_PERIOD],
            predicted: [0; MAX_PERIOD],
        }
    }

    pub fn init(&mut self) {
        *self = Self::new();
    }

    /// Record `value` and return the predicted next one.
    pub fn predict(&mut self, value: u32) -> u32 {
        self.history[self.history_pointer] = value;
        let mut best_error = u32::MAX;
        let mut best_period = 0;
        for candidate in 0..MAX_PERIOD {
            let error = self.predicted[candidate].abs_diff(value);
            // Leaky average of the absolute error.
            let smoothed = &mut self.prediction_error[candidate];
            *smoothed = *smoothed - (*smoothed >> 2) + (error >> 2);
            if *smoothed < best_error {
                best_error = *smoothed;
                best_period = candidate;
            }
            // Candidate `candidate` repeats the value `candidate + 1` steps
            // before the one about to arrive.
            let t = (self.history_pointer + HISTORY - candidate) % HISTORY;
            self.predicted[candidate] = self.history[t];
        }
        self.history_pointer = (self.history_pointer + 1) % HISTORY;
        self.predicted[best_period]
    }
}

impl<const HISTORY: usize, const MAX_PERIOD: usize> Default for PatternPredictor<HISTORY, MAX_PERIOD> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_clock_predicts_itself() {
        let mut predictor: PatternPredictor = PatternPredictor::new();
        let mut prediction = 0;
        for _ in 0..16 {
            prediction = predictor.predict(12_000);
        }
        assert_eq!(prediction, 12_000);
    }

    #[test]
    fn alternating_pattern_is_learned() {
        let mut predictor: PatternPredictor = PatternPredictor::new();
        for _ in 0..20 {
            predictor.predict(8_000);
            predictor.predict(16_000);
        }
        assert_eq!(predictor.predict(8_000), 16_000);
        assert_eq!(predictor.predict(16_000), 8_000);
    }
}
