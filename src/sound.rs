use std::io::Write;

use log::{info, warn};

use crate::alarm::ChimeStyle;

/// Something that can make a noise when a countdown runs out.
pub trait Chime {
    fn play(&mut self, style: ChimeStyle);

    /// Blocks until whatever is playing has finished.
    fn wait(&mut self) {}
}

/// Rings the terminal bell, the fallback when there's no audio output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&mut self, style: ChimeStyle) {
        info!("ringing the bell for {style}");
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|()| stdout.flush()) {
            warn!("couldn't ring the terminal bell: {e}");
        }
    }
}

/// Plays `<chime>.mp3` from the sounds directory.
#[cfg(feature = "sound")]
pub struct RodioChime {
    sounds: std::path::PathBuf,
    stream: Option<rodio::OutputStream>,
    sinks: Vec<rodio::Sink>,
}

#[cfg(feature = "sound")]
impl RodioChime {
    #[must_use]
    pub fn new(sounds: std::path::PathBuf) -> Self {
        let stream = match rodio::OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                warn!("no audio output, falling back to the terminal bell: {e}");
                None
            }
        };
        Self {
            sounds,
            stream,
            sinks: Vec::new(),
        }
    }

    fn try_play(&mut self, style: ChimeStyle) -> Result<(), Box<dyn std::error::Error>> {
        let Some(stream) = &self.stream else {
            return Err("no audio output".into());
        };
        let path = self.sounds.join(style.file_name());
        let file = std::io::BufReader::new(std::fs::File::open(&path)?);
        let source = rodio::Decoder::new(file)?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.append(source);
        sink.play();
        self.sinks.push(sink);
        info!("playing {}", path.display());
        Ok(())
    }
}

#[cfg(feature = "sound")]
impl Chime for RodioChime {
    fn play(&mut self, style: ChimeStyle) {
        if let Err(e) = self.try_play(style) {
            warn!("couldn't play {style}: {e}");
            TerminalBell.play(style);
        }
    }

    fn wait(&mut self) {
        self.sinks.drain(..).for_each(|sink| sink.sleep_until_end());
    }
}
