// wayfinder_sim/src/simulation/sensors/console.rs

use wayfinder_core::callouts::AudioSink;
use wayfinder_core::messages::{AudioType, PositionedString};

/// Prints each callout batch instead of speaking it.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    batches: usize,
    lines: usize,
}

impl ConsoleSink {
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn lines(&self) -> usize {
        self.lines
    }
}

impl AudioSink for ConsoleSink {
    fn play(&mut self, batch: &[PositionedString]) {
        self.batches += 1;
        for line in batch {
            self.lines += 1;
            let earcon = line.earcon.map(|e| format!("[{e:?}] ")).unwrap_or_default();
            match (line.audio_type, line.heading) {
                (AudioType::Compass, Some(heading)) => println!("  {earcon}{} ({heading:.0}°)", line.text),
                _ => println!("  {earcon}{}", line.text),
            }
        }
    }

    fn clear(&mut self) {
        tracing::info!("audio cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_core::messages::Earcon;
    use wayfinder_core::types::LngLatAlt;

    #[test]
    fn test_counts_batches_and_lines() {
        let mut sink = ConsoleSink::default();
        sink.play(&[
            PositionedString::standard("Approaching intersection").with_earcon(Earcon::Intersection),
            PositionedString::compass("Oak St goes left", LngLatAlt::new(0.0, 0.0), 270.0),
        ]);
        sink.play(&[PositionedString::standard("Ahead Elm St")]);

        assert_eq!(sink.batches(), 2);
        assert_eq!(sink.lines(), 3);
    }
}
