use std::time::Duration;

use crate::channel::{CancelToken, Encoder, TransmitConfig, TxChannel};
use crate::error::{HardwareError, HardwareOp, Result, StripError};

/// Where the engine is in the enable -> transmit -> wait -> disable handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Enabled,
    Transmitting,
    WaitingDone,
    /// Disabling the channel failed; the channel state is unknown
    Faulted,
}

/// Drives one transmit channel through a full refresh cycle
pub struct TransmitEngine {
    channel: Box<dyn TxChannel>,
    encoder: Box<dyn Encoder>,
    state: EngineState,
    wait_timeout: Option<Duration>,
    cancel: CancelToken,
}

impl TransmitEngine {
    pub fn new(
        channel: Box<dyn TxChannel>,
        encoder: Box<dyn Encoder>,
        wait_timeout: Option<Duration>,
    ) -> Self {
        TransmitEngine {
            channel,
            encoder,
            state: EngineState::Idle,
            wait_timeout,
            cancel: CancelToken::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }

    /// Bound the wait for completion. `None` waits forever.
    pub fn set_wait_timeout(&mut self, timeout: Option<Duration>) {
        self.wait_timeout = timeout;
    }

    /// Handle that aborts an in-flight wait from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Push `payload` out once and block until the channel is disabled again.
    ///
    /// Any failure after a successful enable disables the channel before
    /// returning. If disabling itself fails the engine is `Faulted` and
    /// refuses further refreshes.
    pub fn refresh(&mut self, payload: &[u8]) -> Result<()> {
        if self.state == EngineState::Faulted {
            log::error!("refresh refused, channel faulted");
            return Err(StripError::Faulted);
        }

        if let Err(e) = self.channel.enable() {
            log::error!("enable channel failed: {}", e);
            return Err(StripError::hardware(HardwareOp::Enable, e));
        }
        self.transition(EngineState::Enabled);

        let tx_config = TransmitConfig { loop_count: 0 };
        if let Err(e) = self
            .channel
            .transmit(self.encoder.as_mut(), payload, &tx_config)
        {
            return Err(self.abort(HardwareOp::Transmit, e));
        }
        self.transition(EngineState::Transmitting);

        if let Err(e) = self.channel.wait_all_done(self.wait_timeout, &self.cancel) {
            return Err(self.abort(HardwareOp::WaitDone, e));
        }
        self.transition(EngineState::WaitingDone);

        if let Err(e) = self.channel.disable() {
            log::error!("disable channel failed: {}", e);
            self.transition(EngineState::Faulted);
            return Err(StripError::hardware(HardwareOp::Disable, e));
        }
        self.transition(EngineState::Idle);

        Ok(())
    }

    /// Give back the handles for teardown
    pub(crate) fn into_parts(self) -> (Box<dyn TxChannel>, Box<dyn Encoder>) {
        (self.channel, self.encoder)
    }

    // Best-effort disable after a mid-cycle failure
    fn abort(&mut self, op: HardwareOp, source: HardwareError) -> StripError {
        log::error!("{} failed: {}", op, source);
        if let Err(e) = self.channel.disable() {
            log::warn!("disable after failed {} also failed: {}", op, e);
        }
        self.transition(EngineState::Idle);
        StripError::hardware(op, source)
    }

    fn transition(&mut self, next: EngineState) {
        log::debug!("state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelProvider, EncoderProvider};
    use crate::config::{ChannelConfig, EncoderConfig, LedModel, StripConfig};
    use crate::error::ErrorKind;
    use crate::mock::{Call, MockBackend};
    use crate::pixel_format::PixelFormat;

    fn engine(backend: &MockBackend) -> TransmitEngine {
        let strip = StripConfig {
            gpio_num: 2,
            max_leds: 1,
            pixel_format: PixelFormat::Rgb,
            led_model: LedModel::Ws2812,
            invert_output: false,
        };
        let mut provider = backend.clone();
        let channel = provider
            .new_tx_channel(&ChannelConfig::default().resolve(&strip))
            .unwrap();
        let encoder = provider
            .new_encoder(&EncoderConfig {
                resolution_hz: 10_000_000,
                led_model: LedModel::Ws2812,
            })
            .unwrap();
        backend.clear_calls();
        TransmitEngine::new(channel, encoder, None)
    }

    #[test]
    fn test_full_cycle_order() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        engine.refresh(&[1, 2, 3]).unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::Enable, Call::Transmit(vec![1, 2, 3]), Call::WaitDone(None), Call::Disable]
        );
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_enable_failure_skips_transmit_and_disable() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        backend.fail_on(HardwareOp::Enable);
        let err = engine.refresh(&[0; 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HardwareFailure);
        assert_eq!(backend.calls(), vec![Call::Enable]);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_transmit_failure_disables() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        backend.fail_on(HardwareOp::Transmit);
        let err = engine.refresh(&[0; 3]).unwrap_err();
        assert!(matches!(
            err,
            StripError::Hardware {
                op: HardwareOp::Transmit,
                ..
            }
        ));
        assert_eq!(
            backend.calls(),
            vec![Call::Enable, Call::Transmit(vec![0; 3]), Call::Disable]
        );
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_wait_failure_disables() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        backend.fail_on(HardwareOp::WaitDone);
        let err = engine.refresh(&[7]).unwrap_err();
        assert!(matches!(
            err,
            StripError::Hardware {
                op: HardwareOp::WaitDone,
                ..
            }
        ));
        assert_eq!(backend.calls().last(), Some(&Call::Disable));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_failed_best_effort_disable_still_reports_transmit_error() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        backend.fail_on(HardwareOp::Transmit);
        backend.fail_on(HardwareOp::Disable);
        let err = engine.refresh(&[7]).unwrap_err();
        assert!(matches!(
            err,
            StripError::Hardware {
                op: HardwareOp::Transmit,
                ..
            }
        ));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_cancelled_wait_disables() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        engine.cancel_token().cancel();
        let err = engine.refresh(&[7]).unwrap_err();
        assert!(matches!(
            err,
            StripError::Hardware {
                op: HardwareOp::WaitDone,
                source: HardwareError::Cancelled,
            }
        ));
        assert_eq!(backend.calls().last(), Some(&Call::Disable));

        engine.cancel_token().reset();
        backend.clear_calls();
        engine.refresh(&[7]).unwrap();
        assert_eq!(backend.count(|c| *c == Call::Disable), 1);
    }

    #[test]
    fn test_disable_failure_faults_engine() {
        let backend = MockBackend::new();
        let mut engine = engine(&backend);
        backend.fail_on(HardwareOp::Disable);
        let err = engine.refresh(&[7]).unwrap_err();
        assert!(matches!(
            err,
            StripError::Hardware {
                op: HardwareOp::Disable,
                ..
            }
        ));
        assert_eq!(engine.state(), EngineState::Faulted);

        backend.heal();
        backend.clear_calls();
        let err = engine.refresh(&[7]).unwrap_err();
        assert!(matches!(err, StripError::Faulted));
        assert!(backend.calls().is_empty());
    }
}
