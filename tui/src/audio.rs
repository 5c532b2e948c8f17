//! Ambient Audio Output
//!
//! With the `audio` feature, the celebration's track plays through the
//! default output device via rodio. Without it, or without a device or
//! track, a [`SilentOutput`] stands in and the retry loop gives up quietly.

use std::path::Path;

use countdown_core::{AudioOutput, SilentOutput};

/// Open the best available output for `track`
pub fn open_output(track: Option<&Path>) -> Box<dyn AudioOutput> {
    let Some(track) = track else {
        tracing::debug!("No ambient audio track configured");
        return Box::new(SilentOutput);
    };

    #[cfg(feature = "audio")]
    match device::RodioOutput::open(track) {
        Ok(output) => return Box::new(output),
        Err(e) => tracing::warn!(error = %e, path = %track.display(), "Ambient audio disabled"),
    }

    #[cfg(not(feature = "audio"))]
    tracing::debug!(path = %track.display(), "Built without audio support, track ignored");

    Box::new(SilentOutput)
}

#[cfg(feature = "audio")]
mod device {
    use std::io::Cursor;
    use std::path::Path;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use countdown_core::{AudioOutput, PlaybackError};

    /// Looped track on the default output device
    pub struct RodioOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
        track: Vec<u8>,
        volume: f32,
        looping: bool,
    }

    impl RodioOutput {
        /// Open the default device and read the track into memory
        pub fn open(path: &Path) -> anyhow::Result<Self> {
            let track = std::fs::read(path)?;
            let (stream, handle) = OutputStream::try_default()?;
            Ok(Self {
                _stream: stream,
                handle,
                sink: None,
                track,
                volume: 1.0,
                looping: false,
            })
        }
    }

    impl AudioOutput for RodioOutput {
        fn is_playing(&self) -> bool {
            self.sink
                .as_ref()
                .is_some_and(|sink| !sink.empty() && !sink.is_paused())
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            if let Some(sink) = &self.sink {
                sink.play();
                return Ok(());
            }

            let sink = Sink::try_new(&self.handle)
                .map_err(|e| PlaybackError::Blocked(e.to_string()))?;
            let source = Decoder::new(Cursor::new(self.track.clone()))
                .map_err(|e| PlaybackError::Unavailable(e.to_string()))?;

            sink.set_volume(self.volume);
            if self.looping {
                sink.append(source.repeat_infinite());
            } else {
                sink.append(source);
            }
            self.sink = Some(sink);
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
            if let Some(sink) = &self.sink {
                sink.set_volume(volume);
            }
        }

        fn set_looping(&mut self, looping: bool) {
            self.looping = looping;
        }
    }
}
