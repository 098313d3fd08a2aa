use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use log::error;
use tonelink_core::{AudioSink, AudioSource, ModemError, Result, SAMPLE_RATE};

fn mono_config() -> StreamConfig {
    StreamConfig {
        channels: 1,
        sample_rate: SampleRate(SAMPLE_RATE as u32),
        buffer_size: BufferSize::Default,
    }
}

fn device_err(err: impl std::fmt::Display) -> ModemError {
    ModemError::AudioSource(err.to_string())
}

/// Live capture from the default input device.
///
/// The cpal callback pushes each buffer into a bounded channel; when the
/// consumer falls behind and the channel fills, the dropped buffer sets a
/// sticky overflow flag that is reported on the next read. Dropping the
/// source stops the capture stream.
pub struct CpalSource {
    _stream: cpal::Stream,
    chunks: Receiver<Vec<f32>>,
    pending: VecDeque<f32>,
    overflowed: Arc<AtomicBool>,
}

impl CpalSource {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ModemError::AudioSource("no input device".into()))?;

        let (sender, chunks): (SyncSender<Vec<f32>>, _) = mpsc::sync_channel(64);
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = Arc::clone(&overflowed);

        let stream = device
            .build_input_stream(
                &mono_config(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if sender.try_send(data.to_vec()).is_err() {
                        overflow_flag.store(true, Ordering::Relaxed);
                    }
                },
                |err| error!("input stream error: {err}"),
                None,
            )
            .map_err(device_err)?;
        stream.play().map_err(device_err)?;

        Ok(Self {
            _stream: stream,
            chunks,
            pending: VecDeque::new(),
            overflowed,
        })
    }
}

impl AudioSource for CpalSource {
    fn read(&mut self, n: usize) -> Result<(Vec<f32>, bool)> {
        while self.pending.len() < n {
            let chunk = self
                .chunks
                .recv()
                .map_err(|_| ModemError::AudioSource("capture stream closed".into()))?;
            self.pending.extend(chunk);
        }

        let samples: Vec<f32> = self.pending.drain(..n).collect();
        Ok((samples, self.overflowed.swap(false, Ordering::Relaxed)))
    }
}

/// Playback through the default output device, blocking until the whole
/// signal has been consumed by the device callback.
pub struct CpalSink;

impl CpalSink {
    pub fn open() -> Result<Self> {
        // The device is acquired per play call and released when the
        // stream drops at the end of it
        Ok(Self)
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, samples: &[f32]) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ModemError::AudioSource("no output device".into()))?;

        let buffer: Arc<Vec<f32>> = Arc::new(samples.to_vec());
        let position = Arc::new(AtomicUsize::new(0));
        let feed = Arc::clone(&buffer);
        let cursor = Arc::clone(&position);

        let stream = device
            .build_output_stream(
                &mono_config(),
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut index = cursor.load(Ordering::Relaxed);
                    for slot in out.iter_mut() {
                        *slot = feed.get(index).copied().unwrap_or(0.0);
                        index += 1;
                    }
                    cursor.store(index.min(feed.len()), Ordering::Relaxed);
                },
                |err| error!("output stream error: {err}"),
                None,
            )
            .map_err(device_err)?;
        stream.play().map_err(device_err)?;

        while position.load(Ordering::Relaxed) < buffer.len() {
            thread::sleep(Duration::from_millis(20));
        }
        // Let the device drain its internal buffer before the stream drops
        thread::sleep(Duration::from_millis(100));

        Ok(())
    }
}
