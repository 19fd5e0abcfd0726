//! Composition stages: agent prompts and MIDI rendering

pub mod midi;
pub mod prompt;

pub use midi::{Composition, MidiSettings, MidiStage, Scale, MIN_TEMPO_BPM};
pub use prompt::{placeholders, render_template, PromptStage};

/// Field holding the musician's description of the desired music
pub const MUSICIAN_INPUT: &str = "musician_input";

/// Field holding the selected musical style
pub const STYLE: &str = "style";

/// Musical styles offered for composition
pub const STYLES: [&str; 4] = ["Classical", "Romantic", "Jazz", "Pop"];
