use crate::processors::gate::Control;
use crate::voices::{bipolar, ControlMode, Parameters, SampleVoice, Voice};

/// Top of the position range, 32767 in output units.
const MAX_POSITION: i32 = 32767 << 15;

/// A ball dropped (or thrown) on every trigger, bouncing between the floor
/// and the ceiling of the output range until it runs out of energy.
///
/// Position is kept with 15 extra bits of precision. Each bounce reflects
/// the velocity and scales it by the restitution factor (out of 4096).
#[derive(Debug, Clone)]
pub struct BouncingBall {
    gravity: i32,
    bounce_loss: i32,
    initial_amplitude: i32,
    initial_velocity: i32,
    velocity: i32,
    position: i32,
}

impl BouncingBall {
    pub fn new() -> Self {
        let mut ball = Self {
            gravity: 0,
            bounce_loss: 0,
            initial_amplitude: 0,
            initial_velocity: 0,
            velocity: 0,
            position: 0,
        };
        ball.init();
        ball
    }

    pub fn set_gravity(&mut self, gravity: u16) {
        let g = u32::from(gravity);
        self.gravity = 1 + ((g * g) >> 20) as i32;
    }

    /// 0 keeps nearly all the energy at each bounce, 65535 loses all of it.
    pub fn set_bounce_loss(&mut self, bounce_loss: u16) {
        let remaining = 65535 - u32::from(bounce_loss);
        let remaining = (remaining * remaining) >> 16;
        self.bounce_loss = ((4095 * remaining) >> 16) as i32;
    }

    pub fn set_initial_amplitude(&mut self, amplitude: u16) {
        self.initial_amplitude = (i32::from(amplitude) << 14).min(MAX_POSITION);
    }

    pub fn set_initial_velocity(&mut self, velocity: i16) {
        self.initial_velocity = i32::from(velocity) << 4;
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    fn bounce(&self, speed: i32) -> i32 {
        (((speed - self.gravity).max(0) as i64 * i64::from(self.bounce_loss)) >> 12) as i32
    }
}

impl Default for BouncingBall {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for BouncingBall {
    fn init(&mut self) {
        self.set_gravity(20000);
        self.set_bounce_loss(4096);
        self.set_initial_amplitude(65535);
        self.set_initial_velocity(0);
        self.velocity = 0;
        self.position = 0;
    }

    fn configure(&mut self, parameters: &Parameters, mode: ControlMode) {
        self.set_gravity(parameters[0]);
        self.set_bounce_loss(parameters[1]);
        match mode {
            ControlMode::Half => {
                self.set_initial_amplitude(65535);
                self.set_initial_velocity(0);
            }
            ControlMode::Full => {
                self.set_initial_amplitude(parameters[2]);
                self.set_initial_velocity(bipolar(parameters[3]));
            }
        }
    }
}

impl SampleVoice for BouncingBall {
    fn process(&mut self, control: Control) -> i16 {
        if control.rising() {
            self.velocity = self.initial_velocity;
            self.position = self.initial_amplitude;
        }
        self.velocity -= self.gravity;
        self.position += self.velocity;
        if self.position < 0 {
            self.position = 0;
            self.velocity = self.bounce(-self.velocity);
        }
        if self.position > MAX_POSITION {
            self.position = MAX_POSITION;
            self.velocity = -self.bounce(self.velocity);
        }
        (self.position >> 15) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apexes(ball: &mut BouncingBall, samples: usize) -> Vec<i32> {
        ball.process(Control::GATE_RISING);
        let mut found = Vec::new();
        let mut previous = ball.position();
        let mut rising = false;
        for _ in 0..samples {
            ball.process(Control::NONE);
            let position = ball.position();
            if rising && position < previous {
                found.push(previous);
            }
            rising = position > previous;
            previous = position;
        }
        found
    }

    #[test]
    fn lossless_bounces_never_gain_height() {
        for gravity in [8000, 30000, 65535] {
            let mut ball = BouncingBall::new();
            ball.set_gravity(gravity);
            ball.set_bounce_loss(0);
            let heights = apexes(&mut ball, 200_000);
            assert!(heights.len() > 5, "gravity {gravity}");
            assert!(heights.windows(2).all(|w| w[1] <= w[0]), "gravity {gravity}");
        }
    }

    #[test]
    fn full_loss_stops_the_ball() {
        let mut ball = BouncingBall::new();
        ball.set_gravity(30000);
        ball.set_bounce_loss(65535);
        assert!(apexes(&mut ball, 100_000).is_empty());
        assert_eq!(ball.process(Control::NONE), 0);
    }

    #[test]
    fn output_stays_in_range_when_thrown_up() {
        let mut ball = BouncingBall::new();
        ball.set_initial_velocity(i16::MAX);
        ball.set_bounce_loss(0);
        ball.process(Control::GATE_RISING);
        for _ in 0..100_000 {
            let out = ball.process(Control::NONE);
            assert!((0..=32767).contains(&out));
        }
    }
}
