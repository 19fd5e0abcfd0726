//! MIDI stage - renders a short piece to a Standard MIDI File
//!
//! The notes are drawn at random from a C major or C minor scale, chosen by
//! whether the musician's description mentions "major". The text produced
//! by the earlier prompt stages is not interpreted here.

use crate::core::{Stage, StageError, StageSpec, StateRecord, Update};
use async_trait::async_trait;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Slowest tempo whose microseconds per quarter note fit the 24-bit tempo event
pub const MIN_TEMPO_BPM: u32 = 4;

const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;
const MAX_TEMPO_MICROSECONDS: u32 = 0x00FF_FFFF;
const MIDDLE_C: u8 = 60;
const MELODY_VELOCITY: u8 = 90;
const HARMONY_VELOCITY: u8 = 70;
const MELODY_CHANNEL: u8 = 0;
const HARMONY_CHANNEL: u8 = 1;

/// Scale the melody is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    CMajor,
    CMinor,
}

impl Scale {
    /// C major if the description mentions "major", otherwise C minor
    pub fn from_description(description: &str) -> Self {
        if description.to_lowercase().contains("major") {
            Scale::CMajor
        } else {
            Scale::CMinor
        }
    }

    /// Semitone offsets from the tonic
    fn semitones(self) -> &'static [u8] {
        match self {
            Scale::CMajor => &[0, 2, 4, 5, 7, 9, 11],
            Scale::CMinor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Scale notes in the fourth octave
    pub fn notes(self) -> Vec<u8> {
        self.semitones().iter().map(|s| MIDDLE_C + s).collect()
    }

    /// Tonic triad in the fourth octave
    pub fn triad(self) -> [u8; 3] {
        match self {
            Scale::CMajor => [60, 64, 67],
            Scale::CMinor => [60, 63, 67],
        }
    }
}

/// A short two-part piece: one note and one chord per beat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub scale: Scale,
    pub tempo_bpm: u32,
    pub melody: Vec<u8>,
    pub chords: Vec<[u8; 3]>,
}

impl Composition {
    /// Draw `beats` melody notes from `scale` and `beats` tonic triads
    /// (major or minor, independently of the scale)
    pub fn generate<R: Rng>(rng: &mut R, scale: Scale, beats: usize, tempo_bpm: u32) -> Self {
        let notes = scale.notes();
        let melody = (0..beats)
            .map(|_| notes[rng.gen_range(0..notes.len())])
            .collect();

        let triads = [Scale::CMajor.triad(), Scale::CMinor.triad()];
        let chords = (0..beats)
            .map(|_| triads[rng.gen_range(0..triads.len())])
            .collect();

        Self {
            scale,
            tempo_bpm,
            melody,
            chords,
        }
    }

    /// Convert to an SMF format 1 file: tempo track, melody track, harmony track
    pub fn to_smf(&self) -> Smf<'static> {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));

        let tempo_microseconds = tempo_microseconds(self.tempo_bpm);
        smf.tracks.push(vec![
            meta(0, MetaMessage::Tempo(u24::new(tempo_microseconds))),
            meta(0, MetaMessage::EndOfTrack),
        ]);

        let melody: Vec<&[u8]> = self.melody.iter().map(std::slice::from_ref).collect();
        smf.tracks.push(part_track(b"Melody", MELODY_CHANNEL, MELODY_VELOCITY, &melody));

        let chords: Vec<&[u8]> = self.chords.iter().map(|c| c.as_slice()).collect();
        smf.tracks.push(part_track(b"Harmony", HARMONY_CHANNEL, HARMONY_VELOCITY, &chords));

        smf
    }
}

/// Microseconds per quarter note, clamped to what a tempo event can hold
fn tempo_microseconds(tempo_bpm: u32) -> u32 {
    (MICROSECONDS_PER_MINUTE / tempo_bpm.max(1)).min(MAX_TEMPO_MICROSECONDS)
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn midi(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(channel),
            message,
        },
    }
}

/// One quarter note per beat; every key in a beat sounds together
fn part_track(name: &'static [u8], channel: u8, velocity: u8, beats: &[&[u8]]) -> Track<'static> {
    let mut track = vec![
        meta(0, MetaMessage::TrackName(name)),
        // Acoustic Grand Piano
        midi(0, channel, MidiMessage::ProgramChange { program: u7::new(0) }),
    ];

    for keys in beats {
        for key in keys.iter() {
            track.push(midi(
                0,
                channel,
                MidiMessage::NoteOn {
                    key: u7::new(*key),
                    vel: u7::new(velocity),
                },
            ));
        }
        for (i, key) in keys.iter().enumerate() {
            let delta = if i == 0 { TICKS_PER_QUARTER as u32 } else { 0 };
            track.push(midi(
                delta,
                channel,
                MidiMessage::NoteOff {
                    key: u7::new(*key),
                    vel: u7::new(0),
                },
            ));
        }
    }

    track.push(meta(0, MetaMessage::EndOfTrack));
    track
}

/// Serialize a composition to `path`
pub async fn write_midi(composition: &Composition, path: &Path) -> Result<(), StageError> {
    let smf = composition.to_smf();
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| StageError::Midi(e.to_string()))?;
    tokio::fs::write(path, &buf).await?;
    Ok(())
}

/// Where and how the MIDI stage writes its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiSettings {
    /// Directory for generated files
    pub output_dir: PathBuf,

    /// Fixed RNG seed; a random seed is drawn (and logged) when absent
    pub seed: Option<u64>,

    /// Number of quarter-note beats
    pub beats: usize,

    pub tempo_bpm: u32,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            seed: None,
            beats: 7,
            tempo_bpm: 60,
        }
    }
}

/// Stage that writes the composition file and records its path
pub struct MidiStage {
    spec: StageSpec,
    description_field: String,
    output: String,
    settings: MidiSettings,
}

impl MidiStage {
    pub fn new(
        name: impl Into<String>,
        description_field: impl Into<String>,
        output: impl Into<String>,
        settings: MidiSettings,
    ) -> Self {
        let description_field = description_field.into();
        let output = output.into();
        Self {
            spec: StageSpec::new(name)
                .reads([description_field.clone()])
                .writes([output.clone()]),
            description_field,
            output,
            settings,
        }
    }

    pub fn settings(&self) -> &MidiSettings {
        &self.settings
    }
}

#[async_trait]
impl Stage for MidiStage {
    fn spec(&self) -> &StageSpec {
        &self.spec
    }

    async fn run(&self, record: &StateRecord) -> Result<Update, StageError> {
        let description = record.text(&self.description_field)?;
        let scale = Scale::from_description(description);

        let seed = self.settings.seed.unwrap_or_else(rand::random);
        debug!("MIDI stage {} using seed {}", self.spec.name, seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let composition =
            Composition::generate(&mut rng, scale, self.settings.beats, self.settings.tempo_bpm);

        tokio::fs::create_dir_all(&self.settings.output_dir).await?;
        let path = self
            .settings
            .output_dir
            .join(format!("composition-{}.mid", Uuid::new_v4()));
        write_midi(&composition, &path).await?;

        info!(
            "Wrote {:?} composition ({} beats at {} BPM) to {}",
            scale,
            self.settings.beats,
            self.settings.tempo_bpm,
            path.display()
        );
        Ok(Update::new().path(self.output.clone(), path))
    }
}
