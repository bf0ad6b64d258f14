//! Debounced alarm state machine.
//!
//! Activation is immediate: any frame with an intrusion turns the alarm on and
//! cancels a pending shutdown. Deactivation is delayed: the first quiet frame
//! schedules a shutdown `deactivate_delay_secs` later, and the alarm only turns
//! off once a quiet frame arrives at or after that time. The scheduling frame
//! itself counts, so a zero delay turns the alarm off on the first quiet frame.
//!
//! Time is always supplied by the caller (seconds, any origin), so the machine
//! is deterministic and never reads a clock.

use serde::{Deserialize, Serialize};

/// Default quiet period before the alarm may turn off.
pub const DEFAULT_DEACTIVATE_DELAY_SECS: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub deactivate_delay_secs: f64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            deactivate_delay_secs: DEFAULT_DEACTIVATE_DELAY_SECS,
        }
    }
}

/// Alarm state: on/off plus an optional scheduled deactivation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AlarmState {
    pub active: bool,
    pub deactivate_at: Option<f64>,
}

impl AlarmState {
    pub const INACTIVE: AlarmState = AlarmState {
        active: false,
        deactivate_at: None,
    };

    /// Pure transition for one frame.
    pub fn step(self, has_intrusion: bool, now: f64, config: &AlarmConfig) -> AlarmState {
        if has_intrusion {
            return AlarmState {
                active: true,
                deactivate_at: None,
            };
        }
        if !self.active {
            return self;
        }
        match self.deactivate_at {
            None => {
                let at = now + config.deactivate_delay_secs;
                if now >= at {
                    AlarmState::INACTIVE
                } else {
                    AlarmState {
                        active: true,
                        deactivate_at: Some(at),
                    }
                }
            }
            Some(at) if now >= at => AlarmState::INACTIVE,
            Some(_) => self,
        }
    }
}

/// Edge reported when the alarm output changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmTransition {
    Activated,
    Deactivated,
}

/// Stateful wrapper feeding frames through [`AlarmState::step`] in order.
#[derive(Debug)]
pub struct Alarm {
    config: AlarmConfig,
    state: AlarmState,
    last_now: Option<f64>,
}

impl Alarm {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            state: AlarmState::INACTIVE,
            last_now: None,
        }
    }

    /// Apply one frame's intrusion signal.
    ///
    /// `now` must not decrease between calls; a smaller value is clamped to
    /// the previous one. Returns the edge when the alarm turned on or off.
    pub fn update(&mut self, has_intrusion: bool, now: f64) -> Option<AlarmTransition> {
        let now = match self.last_now {
            Some(last) if now.is_nan() || now < last => {
                log::warn!("alarm: time went backwards ({} < {}), clamping", now, last);
                last
            }
            None if now.is_nan() => {
                log::warn!("alarm: non-numeric time on first frame, using t=0");
                0.0
            }
            _ => now,
        };
        self.last_now = Some(now);

        let before = self.state;
        self.state = before.step(has_intrusion, now, &self.config);

        match (before.active, self.state.active) {
            (false, true) => {
                log::info!("alarm: ON at t={:.2}s", now);
                Some(AlarmTransition::Activated)
            }
            (true, false) => {
                log::info!("alarm: OFF at t={:.2}s", now);
                Some(AlarmTransition::Deactivated)
            }
            _ => {
                if before.deactivate_at.is_none() {
                    if let Some(at) = self.state.deactivate_at {
                        log::debug!("alarm: quiet, deactivation scheduled for t={:.2}s", at);
                    }
                }
                None
            }
        }
    }

    /// Force the alarm off and drop any pending deactivation.
    pub fn reset(&mut self) {
        self.state = AlarmState::INACTIVE;
        self.last_now = None;
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new(AlarmConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive() {
        let alarm = Alarm::default();
        assert!(!alarm.is_active());
        assert_eq!(alarm.state(), AlarmState::INACTIVE);
    }

    #[test]
    fn activates_immediately_and_deactivates_after_delay() {
        let mut alarm = Alarm::default();
        assert_eq!(alarm.update(true, 0.0), Some(AlarmTransition::Activated));
        assert!(alarm.is_active());

        assert_eq!(alarm.update(false, 1.0), None);
        assert!(alarm.is_active());
        assert_eq!(alarm.state().deactivate_at, Some(4.0));

        assert_eq!(alarm.update(false, 3.9), None);
        assert!(alarm.is_active());

        assert_eq!(alarm.update(false, 4.0), Some(AlarmTransition::Deactivated));
        assert!(!alarm.is_active());
        assert_eq!(alarm.state().deactivate_at, None);
    }

    #[test]
    fn intrusion_cancels_pending_deactivation() {
        let mut alarm = Alarm::default();
        alarm.update(true, 0.0);
        alarm.update(false, 1.0);
        assert_eq!(alarm.update(true, 2.0), None);
        assert_eq!(alarm.state().deactivate_at, None);

        // The old deadline no longer applies; a new quiet run starts at t=4.
        assert_eq!(alarm.update(false, 4.0), None);
        assert!(alarm.is_active());
        assert_eq!(alarm.state().deactivate_at, Some(7.0));
        assert_eq!(alarm.update(false, 6.9), None);
        assert_eq!(alarm.update(false, 7.0), Some(AlarmTransition::Deactivated));
    }

    #[test]
    fn ongoing_intrusion_never_turns_off() {
        let mut alarm = Alarm::default();
        for t in 0..100 {
            alarm.update(true, t as f64);
            assert!(alarm.is_active());
        }
    }

    #[test]
    fn quiet_frames_while_inactive_are_noops() {
        let mut alarm = Alarm::default();
        for t in 0..10 {
            assert_eq!(alarm.update(false, t as f64), None);
            assert_eq!(alarm.state(), AlarmState::INACTIVE);
        }
    }

    #[test]
    fn first_quiet_frame_after_long_gap_only_schedules() {
        let mut alarm = Alarm::default();
        alarm.update(true, 0.0);
        // Scheduling happens on the first quiet frame regardless of elapsed time.
        assert_eq!(alarm.update(false, 100.0), None);
        assert_eq!(alarm.state().deactivate_at, Some(103.0));
    }

    #[test]
    fn reset_clears_pending_deactivation() {
        let mut alarm = Alarm::default();
        alarm.update(true, 0.0);
        alarm.update(false, 1.0);
        alarm.reset();
        assert_eq!(alarm.state(), AlarmState::INACTIVE);
        // A fresh run may start its clock at zero again.
        assert_eq!(alarm.update(true, 0.0), Some(AlarmTransition::Activated));
    }

    #[test]
    fn time_regression_is_clamped() {
        let mut alarm = Alarm::default();
        alarm.update(true, 10.0);
        alarm.update(false, 5.0);
        assert_eq!(alarm.state().deactivate_at, Some(13.0));
    }

    #[test]
    fn zero_delay_turns_off_on_first_quiet_frame() {
        let zero = AlarmConfig {
            deactivate_delay_secs: 0.0,
        };
        let mut alarm = Alarm::new(zero);
        assert_eq!(alarm.update(true, 0.0), Some(AlarmTransition::Activated));
        assert_eq!(alarm.update(false, 0.5), Some(AlarmTransition::Deactivated));
        assert_eq!(alarm.state(), AlarmState::INACTIVE);

        let stepped = AlarmState::INACTIVE
            .step(true, 1.0, &zero)
            .step(false, 1.0, &zero);
        assert_eq!(stepped, AlarmState::INACTIVE);
    }

    #[test]
    fn step_is_pure() {
        let config = AlarmConfig::default();
        let active = AlarmState::INACTIVE.step(true, 0.0, &config);
        let scheduled = active.step(false, 1.0, &config);
        assert_eq!(scheduled.deactivate_at, Some(4.0));
        assert_eq!(scheduled.step(false, 2.0, &config), scheduled);
        assert_eq!(scheduled.step(false, 4.5, &config), AlarmState::INACTIVE);
        assert!(active.active);
    }
}
