//! Recording backend for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::channel::{
    CancelToken, ChannelProvider, Encoder, EncoderProvider, TransmitConfig, TxChannel,
};
use crate::config::{EncoderConfig, TxChannelConfig};
use crate::error::{HardwareError, HardwareOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    NewChannel(TxChannelConfig),
    NewEncoder(EncoderConfig),
    Enable,
    Transmit(Vec<u8>),
    WaitDone(Option<Duration>),
    Disable,
    DeleteChannel,
    DeleteEncoder,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    failing: Vec<HardwareOp>,
}

/// Provides channels and encoders that log every call into one shared list
#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every later `op` call fail
    pub(crate) fn fail_on(&self, op: HardwareOp) {
        self.state.lock().unwrap().failing.push(op);
    }

    pub(crate) fn heal(&self) {
        self.state.lock().unwrap().failing.clear();
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| matches(c)).count()
    }

    fn record(&self, op: HardwareOp, call: Call) -> Result<(), HardwareError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(HardwareError::Device(format!("mock {} failure", op)));
        }
        Ok(())
    }
}

impl ChannelProvider for MockBackend {
    fn new_tx_channel(
        &mut self,
        config: &TxChannelConfig,
    ) -> Result<Box<dyn TxChannel>, HardwareError> {
        self.record(HardwareOp::CreateChannel, Call::NewChannel(config.clone()))?;
        Ok(Box::new(MockChannel {
            backend: self.clone(),
        }))
    }
}

impl EncoderProvider for MockBackend {
    fn new_encoder(&mut self, config: &EncoderConfig) -> Result<Box<dyn Encoder>, HardwareError> {
        self.record(HardwareOp::CreateEncoder, Call::NewEncoder(*config))?;
        Ok(Box::new(MockEncoder {
            backend: self.clone(),
        }))
    }
}

struct MockChannel {
    backend: MockBackend,
}

impl TxChannel for MockChannel {
    fn enable(&mut self) -> Result<(), HardwareError> {
        self.backend.record(HardwareOp::Enable, Call::Enable)
    }

    fn transmit(
        &mut self,
        encoder: &mut dyn Encoder,
        payload: &[u8],
        config: &TransmitConfig,
    ) -> Result<(), HardwareError> {
        assert_eq!(config.loop_count, 0);
        let mut encoded = Vec::new();
        encoder.encode(payload, &mut encoded);
        self.backend.record(HardwareOp::Transmit, Call::Transmit(encoded))
    }

    fn wait_all_done(
        &mut self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<(), HardwareError> {
        self.backend.record(HardwareOp::WaitDone, Call::WaitDone(timeout))?;
        if cancel.is_cancelled() {
            return Err(HardwareError::Cancelled);
        }
        Ok(())
    }

    fn disable(&mut self) -> Result<(), HardwareError> {
        self.backend.record(HardwareOp::Disable, Call::Disable)
    }

    fn delete(self: Box<Self>) -> Result<(), HardwareError> {
        self.backend.record(HardwareOp::DeleteChannel, Call::DeleteChannel)
    }
}

/// Passes pixel bytes through unchanged
struct MockEncoder {
    backend: MockBackend,
}

impl Encoder for MockEncoder {
    fn encode(&mut self, payload: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(payload);
    }

    fn delete(self: Box<Self>) -> Result<(), HardwareError> {
        self.backend.record(HardwareOp::DeleteEncoder, Call::DeleteEncoder)
    }
}
