//! Transmit backend for LED controllers attached over a serial port.
//!
//! The controller firmware (HyperSerialPico, Adalight sketches, ...) does the
//! bit timing on its side; this backend frames the pixel bytes and streams
//! them from a dedicated writer thread.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serialport::SerialPort;

use crate::channel::{
    CancelToken, ChannelProvider, Encoder, EncoderProvider, TransmitConfig, TxChannel,
};
use crate::config::{EncoderConfig, TxChannelConfig};
use crate::error::{HardwareError, Result};
use crate::pixel_format::PixelFormat;
use crate::protocol::FrameProtocol;

// How often a blocked wait re-checks its deadline and cancel token
const WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    #[serde(default)]
    pub protocol: FrameProtocol,
}

/// Opens serial ports as transmit channels
pub struct SerialChannelProvider {
    config: SerialConfig,
}

impl SerialChannelProvider {
    pub fn new(config: SerialConfig) -> Self {
        SerialChannelProvider { config }
    }

    fn open_port(&self) -> std::result::Result<Box<dyn SerialPort>, HardwareError> {
        let mut port = serialport::new(&self.config.port, self.config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(1000))
            .open()?;

        if let Err(e) = port.write_data_terminal_ready(true) {
            log::warn!("Failed to set DTR on {}: {}", self.config.port, e);
        }

        // Allow device to initialize
        thread::sleep(Duration::from_millis(100));

        Ok(port)
    }
}

impl ChannelProvider for SerialChannelProvider {
    fn new_tx_channel(
        &mut self,
        config: &TxChannelConfig,
    ) -> std::result::Result<Box<dyn TxChannel>, HardwareError> {
        let port = self.open_port()?;
        log::info!(
            "Opened {} @ {} baud ({:?} framing, queue depth {})",
            self.config.port,
            self.config.baud_rate,
            self.config.protocol,
            config.trans_queue_depth
        );
        log::debug!(
            "{}: pin, clock and memory-block settings are handled by the controller",
            self.config.port
        );
        Ok(Box::new(SerialTxChannel::new(
            self.config.port.clone(),
            port,
            config.trans_queue_depth,
        )))
    }
}

struct Writer<W> {
    frames: SyncSender<Vec<u8>>,
    done: Receiver<std::result::Result<(), String>>,
    handle: thread::JoinHandle<W>,
}

/// Channel that streams encoded frames to a byte sink on a writer thread.
///
/// The sink is owned by the channel while disabled and by the writer
/// thread while enabled.
pub struct SerialTxChannel<W = Box<dyn SerialPort>> {
    name: String,
    port: Option<W>,
    writer: Option<Writer<W>>,
    queue_depth: usize,
    pending: usize,
}

impl<W: Write + Send + 'static> SerialTxChannel<W> {
    pub fn new(name: String, port: W, queue_depth: usize) -> Self {
        SerialTxChannel {
            name,
            port: Some(port),
            writer: None,
            queue_depth: queue_depth.max(1),
            pending: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}

impl<W: Write + Send + 'static> TxChannel for SerialTxChannel<W> {
    fn enable(&mut self) -> std::result::Result<(), HardwareError> {
        if self.writer.is_some() {
            return Err(HardwareError::Device(format!("{} already enabled", self.name)));
        }
        let port = self
            .port
            .take()
            .ok_or_else(|| HardwareError::Device(format!("{} lost its port", self.name)))?;

        // Bounded queue: transmit blocks once queue_depth frames are in flight
        let (frames, frame_rx) = mpsc::sync_channel::<Vec<u8>>(self.queue_depth);
        let (done_tx, done) = mpsc::channel();
        let name = self.name.clone();
        let handle = thread::spawn(move || writer_thread(name, port, frame_rx, done_tx));

        self.writer = Some(Writer {
            frames,
            done,
            handle,
        });
        self.pending = 0;
        Ok(())
    }

    fn transmit(
        &mut self,
        encoder: &mut dyn Encoder,
        payload: &[u8],
        config: &TransmitConfig,
    ) -> std::result::Result<(), HardwareError> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| HardwareError::Device(format!("{} not enabled", self.name)))?;

        let mut frame = Vec::new();
        encoder.encode(payload, &mut frame);

        for _ in 0..=config.loop_count {
            writer
                .frames
                .send(frame.clone())
                .map_err(|_| HardwareError::Device(format!("{} writer exited", self.name)))?;
            self.pending += 1;
        }
        Ok(())
    }

    fn wait_all_done(
        &mut self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> std::result::Result<(), HardwareError> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| HardwareError::Device(format!("{} not enabled", self.name)))?;
        let deadline = timeout.map(|t| Instant::now() + t);

        while self.pending > 0 {
            if cancel.is_cancelled() {
                return Err(HardwareError::Cancelled);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(HardwareError::Timeout);
                    }
                    remaining.min(WAIT_SLICE)
                }
                None => WAIT_SLICE,
            };

            match writer.done.recv_timeout(slice) {
                Ok(result) => {
                    self.pending -= 1;
                    result.map_err(HardwareError::Device)?;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(HardwareError::Device(format!("{} writer exited", self.name)));
                }
            }
        }
        Ok(())
    }

    fn disable(&mut self) -> std::result::Result<(), HardwareError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| HardwareError::Device(format!("{} not enabled", self.name)))?;
        self.pending = 0;

        // Closing the queue lets the writer drain and hand the port back
        drop(writer.frames);
        let port = writer
            .handle
            .join()
            .map_err(|_| HardwareError::Device(format!("{} writer panicked", self.name)))?;
        self.port = Some(port);
        Ok(())
    }

    fn delete(self: Box<Self>) -> std::result::Result<(), HardwareError> {
        if self.writer.is_some() {
            return Err(HardwareError::Device(format!("{} still enabled", self.name)));
        }
        log::debug!("Closing {}", self.name);
        Ok(())
    }
}

/// Writer thread - blocks on the frame queue, writes each frame to the port
fn writer_thread<W: Write>(
    name: String,
    mut port: W,
    frames: Receiver<Vec<u8>>,
    done: mpsc::Sender<std::result::Result<(), String>>,
) -> W {
    for frame in frames {
        if log::log_enabled!(log::Level::Trace) {
            let hex: String = frame
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            log::trace!("{}: sending {} bytes: {}", name, frame.len(), hex);
        }

        let result = port
            .write_all(&frame)
            .and_then(|()| port.flush())
            .map_err(|e| format!("serial error on {}: {}", name, e));
        if let Err(e) = &result {
            log::error!("{}", e);
        }
        if done.send(result).is_err() {
            break;
        }
    }
    port
}

/// Builds [`FrameEncoder`]s for one strip
pub struct FrameEncoderProvider {
    protocol: FrameProtocol,
    stride: usize,
}

impl FrameEncoderProvider {
    pub fn new(protocol: FrameProtocol, format: PixelFormat) -> Result<Self> {
        Ok(FrameEncoderProvider {
            protocol,
            stride: format.bytes_per_pixel()?,
        })
    }
}

impl EncoderProvider for FrameEncoderProvider {
    fn new_encoder(
        &mut self,
        config: &EncoderConfig,
    ) -> std::result::Result<Box<dyn Encoder>, HardwareError> {
        log::debug!(
            "{:?} encoder for {:?} LEDs, controller handles the {} Hz timing",
            self.protocol,
            config.led_model,
            config.resolution_hz
        );
        Ok(Box::new(FrameEncoder {
            protocol: self.protocol,
            stride: self.stride,
        }))
    }
}

/// Wraps pixel bytes in a serial controller frame
pub struct FrameEncoder {
    protocol: FrameProtocol,
    stride: usize,
}

impl Encoder for FrameEncoder {
    fn encode(&mut self, payload: &[u8], out: &mut Vec<u8>) {
        self.protocol.write_frame(payload, self.stride, out);
    }

    fn delete(self: Box<Self>) -> std::result::Result<(), HardwareError> {
        Ok(())
    }
}
