//! Pulsing speak button shown while audio plays.

use bevy_egui::egui::Color32;
use std::time::Duration;

pub const PULSE_PERIOD: Duration = Duration::from_millis(600);
const PULSE_FROM: f32 = 1.0;
const PULSE_TO: f32 = 0.3;

/// Colors for the speak button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonVisuals {
    pub fill: Color32,
    pub text: Color32,
    pub stroke: Color32,
}

impl ButtonVisuals {
    pub const STATIC: Self = Self {
        fill: Color32::from_rgb(0x5a, 0x5a, 0x5a),
        text: Color32::from_rgb(0xee, 0xee, 0xee),
        stroke: Color32::from_rgb(0x88, 0x88, 0x88),
    };

    pub const HOVER_FILL: Color32 = Color32::from_rgb(0x77, 0x77, 0x77);

    /// Static colors faded to `emphasis` (0.0..=1.0) opacity.
    pub fn faded(emphasis: f32) -> Self {
        let alpha = (emphasis.clamp(0.0, 1.0) * 255.0).round() as u8;
        let fade = |c: Color32| Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha);
        Self {
            fill: fade(Self::STATIC.fill),
            text: fade(Self::STATIC.text),
            stroke: fade(Self::STATIC.stroke),
        }
    }
}

/// Looping opacity animation: 1.0 eases down to 0.3 over one period, then
/// jumps back to 1.0 and repeats until stopped.
#[derive(Debug, Default, Clone)]
pub struct PulseAnimation {
    started_at: Option<Duration>,
}

impl PulseAnimation {
    pub fn start(&mut self, now: Duration) {
        self.started_at = Some(now);
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_oscillating(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn emphasis(&self, now: Duration) -> f32 {
        let Some(started_at) = self.started_at else {
            return PULSE_FROM;
        };
        let period = PULSE_PERIOD.as_secs_f32();
        let phase = (now.saturating_sub(started_at).as_secs_f32() % period) / period;
        PULSE_FROM + (PULSE_TO - PULSE_FROM) * ease_in_out_quad(phase)
    }

    /// `None` while static, so the theme's own colors (including hover) apply.
    pub fn visuals(&self, now: Duration) -> Option<ButtonVisuals> {
        self.is_oscillating()
            .then(|| ButtonVisuals::faded(self.emphasis(now)))
    }
}

fn ease_in_out_quad(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn static_until_started() {
        let pulse = PulseAnimation::default();
        assert!(!pulse.is_oscillating());
        assert_eq!(pulse.emphasis(ms(1234)), 1.0);
        assert_eq!(pulse.visuals(ms(1234)), None);
    }

    #[test]
    fn oscillates_between_bounds_each_period() {
        let mut pulse = PulseAnimation::default();
        pulse.start(ms(1000));

        assert!(approx(pulse.emphasis(ms(1000)), 1.0));
        assert!(approx(pulse.emphasis(ms(1300)), 0.65));
        assert!(approx(pulse.emphasis(ms(1900)), 0.65));
        assert!(approx(pulse.emphasis(ms(1600)), 1.0));

        for step in 0..120 {
            let value = pulse.emphasis(ms(1000 + step * 10));
            assert!((PULSE_TO..=PULSE_FROM).contains(&value), "{value}");
        }
    }

    #[test]
    fn stop_restores_static_visuals() {
        let mut pulse = PulseAnimation::default();
        pulse.start(ms(0));
        let faded = pulse.visuals(ms(300)).unwrap();
        assert!(faded.fill.a() < 255);

        pulse.stop();
        assert!(!pulse.is_oscillating());
        assert_eq!(pulse.visuals(ms(300)), None);
    }

    #[test]
    fn full_emphasis_matches_static_colors() {
        assert_eq!(ButtonVisuals::faded(1.0), ButtonVisuals::STATIC);
    }
}
