use log::{info, warn};

use crate::encoder::Encoder;
use crate::error::Result;
use crate::framing::DecodedPacket;
use crate::receiver::{AudioSource, ReceiveProgress, StreamingReceiver};

/// Session states of the half-duplex channel discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    Idle,
    TxReady,
    TxSending,
    RxWaitPreamble,
    RxReceiving,
    RxFinished,
}

/// Operator commands accepted while idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Transmit { message: String, target_id: u8 },
    Receive,
    Quit,
}

/// Happenings that advance the session state: operator commands entering
/// the machine, and internal milestones from the transmit/receive paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemEvent {
    TransmitRequested,
    ReceiveRequested,
    EncodeOk,
    EncodeFailed,
    PlaybackDone,
    SyncDetected,
    DecodeDone,
    /// Source error, timeout, or operator cancellation mid-receive.
    ReceiveAborted,
    /// RxFinished unwinds back to Idle once the result is reported.
    SessionFinished,
}

/// Pure transition function over the half-duplex state machine.
///
/// Pairs outside the transition table leave the state unchanged, so a
/// stray event can never derail an active session.
pub fn next_state(state: ModemState, event: ModemEvent) -> ModemState {
    use ModemEvent::*;
    use ModemState::*;

    match (state, event) {
        (Idle, TransmitRequested) => TxReady,
        (Idle, ReceiveRequested) => RxWaitPreamble,
        (TxReady, EncodeOk) => TxSending,
        (TxReady, EncodeFailed) => Idle,
        (TxSending, PlaybackDone) => Idle,
        (RxWaitPreamble, SyncDetected) => RxReceiving,
        (RxWaitPreamble, ReceiveAborted) => Idle,
        (RxReceiving, DecodeDone) => RxFinished,
        (RxReceiving, ReceiveAborted) => Idle,
        (RxFinished, SessionFinished) => Idle,
        (unchanged, _) => unchanged,
    }
}

/// Blocking audio output collaborator; returns once playback completes.
pub trait AudioSink {
    fn play(&mut self, samples: &[f32]) -> Result<()>;
}

/// What a completed command did, reported back to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    /// Signal handed to the sink and playback finished.
    Sent { samples: usize },
    /// One packet received (any status: ok, crc-fail, not addressed).
    Received(DecodedPacket),
}

/// Sequences transmit and receive activity over the shared acoustic
/// channel.
///
/// One command runs to completion at a time; the controller blocks on the
/// audio collaborators for the duration, so transmit and receive are never
/// concurrently active within a session. Every exit path, including
/// failures, lands the state back in Idle.
pub struct HalfDuplexController {
    local_id: u8,
    state: ModemState,
    encoder: Encoder,
    receiver: StreamingReceiver,
}

impl HalfDuplexController {
    pub fn new(local_id: u8) -> Self {
        Self {
            local_id,
            state: ModemState::Idle,
            encoder: Encoder::new(),
            receiver: StreamingReceiver::new(),
        }
    }

    pub fn local_id(&self) -> u8 {
        self.local_id
    }

    pub fn state(&self) -> ModemState {
        self.state
    }

    /// Encode a message for `target_id` and play it through the sink,
    /// blocking until playback completes.
    pub fn transmit(
        &mut self,
        message: &str,
        target_id: u8,
        sink: &mut dyn AudioSink,
    ) -> Result<SessionReport> {
        self.advance(ModemEvent::TransmitRequested);

        let samples = match self.encoder.encode(message, self.local_id, target_id) {
            Ok(samples) => {
                self.advance(ModemEvent::EncodeOk);
                samples
            }
            Err(err) => {
                warn!("packet build failed: {err}");
                self.advance(ModemEvent::EncodeFailed);
                return Err(err);
            }
        };

        info!(
            "transmitting {} samples to endpoint {target_id}",
            samples.len()
        );
        let played = sink.play(&samples);
        // The sink has returned either way; the channel is free again
        self.advance(ModemEvent::PlaybackDone);
        played?;

        Ok(SessionReport::Sent {
            samples: samples.len(),
        })
    }

    /// Listen on the source until one packet arrives or the session
    /// aborts (timeout, overflow, device failure).
    pub fn receive(&mut self, source: &mut dyn AudioSource) -> Result<SessionReport> {
        self.advance(ModemEvent::ReceiveRequested);

        let state = &mut self.state;
        let result = self
            .receiver
            .receive_with(source, self.local_id, |milestone| {
                if milestone == ReceiveProgress::SyncDetected {
                    *state = next_state(*state, ModemEvent::SyncDetected);
                }
            });

        match result {
            Ok(packet) => {
                self.advance(ModemEvent::DecodeDone);
                self.advance(ModemEvent::SessionFinished);
                Ok(SessionReport::Received(packet))
            }
            Err(err) => {
                warn!("receive aborted: {err}");
                self.advance(ModemEvent::ReceiveAborted);
                Err(err)
            }
        }
    }

    fn advance(&mut self, event: ModemEvent) {
        self.state = next_state(self.state, event);
    }
}
