//! Audio output: cpal stream fed through a bounded ring buffer.
//!
//! The emulation thread enqueues frame batches with `try_push`; a full
//! ring drops the newest samples rather than ever blocking the core. The
//! device callback drains at its own pace and substitutes silence on
//! underrun so gaps don't click.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapRb,
};

/// A running mono output stream and the feed side of its sample queue.
pub struct AudioOutput {
    _stream: Stream,
    feed: ringbuf::HeapProd<f32>,
}

impl AudioOutput {
    /// Open the default output device at `sample_rate`, or `None` when the
    /// host has no usable audio.
    pub fn start(sample_rate: u32) -> Option<Self> {
        let device = cpal::default_host().default_output_device()?;

        // An eighth of a second of queue: enough slack for scheduling
        // jitter, small enough to keep latency unnoticeable. Half is
        // pre-filled so playback survives the first frames.
        let capacity = (sample_rate / 8) as usize;
        let (mut feed, mut drain) = HeapRb::<f32>::new(capacity).split();
        for _ in 0..capacity / 2 {
            let _ = feed.try_push(0.0);
        }

        let stream = device
            .build_output_stream(
                &StreamConfig {
                    channels: 1,
                    sample_rate: SampleRate(sample_rate),
                    buffer_size: BufferSize::Default,
                },
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for slot in out {
                        *slot = drain.try_pop().unwrap_or(0.0);
                    }
                },
                |e| eprintln!("nes-runner: audio stream: {e}"),
                None,
            )
            .ok()?;
        stream.play().ok()?;

        Some(Self { _stream: stream, feed })
    }

    /// Enqueue a batch, dropping whatever the ring cannot take.
    pub fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            let _ = self.feed.try_push(sample);
        }
    }
}
