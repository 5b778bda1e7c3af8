//! Montage render pipeline: preflight, beat report, encoder run.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    analysis, build_command, preflight, BeatAnalysis, CommandRunner, EncodeSettings,
    MontagePaths, ProcessRunner, Result,
};

/// Source of the beat report printed before encoding.
pub trait BeatSource {
    fn analyze(&self, audio: &Path) -> Result<BeatAnalysis>;
}

/// Decodes the file and runs the spectral-flux beat tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBeatSource;

impl BeatSource for FileBeatSource {
    fn analyze(&self, audio: &Path) -> Result<BeatAnalysis> {
        analysis::analyze_file(audio)
    }
}

/// How the encoder run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed { output: PathBuf },
    EncoderFailed { exit_code: i32 },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug)]
pub struct MontageRenderer<B = FileBeatSource, R = ProcessRunner> {
    paths: MontagePaths,
    settings: EncodeSettings,
    beats: B,
    runner: R,
}

impl MontageRenderer {
    pub fn new(paths: MontagePaths, settings: EncodeSettings) -> Self {
        Self::with_parts(paths, settings, FileBeatSource, ProcessRunner)
    }
}

impl<B: BeatSource, R: CommandRunner> MontageRenderer<B, R> {
    pub fn with_parts(paths: MontagePaths, settings: EncodeSettings, beats: B, runner: R) -> Self {
        Self {
            paths,
            settings,
            beats,
            runner,
        }
    }

    pub fn paths(&self) -> &MontagePaths {
        &self.paths
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs the pipeline, writing progress lines to `out`.
    ///
    /// Missing inputs and a missing encoder binary are errors; a non-zero
    /// encoder exit is reported as [`RenderOutcome::EncoderFailed`].
    pub fn render(&self, out: &mut impl Write) -> Result<RenderOutcome> {
        writeln!(out, "🎵 Analyzing beats...")?;

        preflight::require_all(self.paths.required_inputs())?;

        let beats = self.beats.analyze(&self.paths.audio)?;
        writeln!(
            out,
            "Detected {} beats at {:.1} BPM",
            beats.beat_count(),
            beats.tempo_bpm
        )?;
        writeln!(out, "✅ Using filters file: {}\n", self.paths.filters.display())?;

        let command = build_command(&self.paths, &self.settings);
        writeln!(out, "⚙️ Running FFmpeg command:")?;
        writeln!(out, "{}", command.display())?;
        out.flush()?;

        let exit_code = self.runner.run(&command)?;
        if exit_code == 0 {
            writeln!(out, "✅ Render complete! Saved as: {}", self.paths.output.display())?;
            tracing::info!(output = %self.paths.output.display(), "montage rendered");
            Ok(RenderOutcome::Completed {
                output: self.paths.output.clone(),
            })
        } else {
            let filters = self
                .paths
                .filters
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.paths.filters.display().to_string());
            writeln!(out, "❌ FFmpeg failed. Please check your {filters} formatting.")?;
            tracing::warn!(exit_code, "encoder exited with an error");
            Ok(RenderOutcome::EncoderFailed { exit_code })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs};

    use super::*;
    use crate::{EncoderCommand, MontageConfig, ToolkitError};

    struct FixedBeats(BeatAnalysis);

    impl BeatSource for FixedBeats {
        fn analyze(&self, _audio: &Path) -> Result<BeatAnalysis> {
            Ok(self.0.clone())
        }
    }

    struct RecordingRunner {
        exit_code: i32,
        calls: RefCell<Vec<EncoderCommand>>,
    }

    impl RecordingRunner {
        fn exiting_with(exit_code: i32) -> Self {
            Self {
                exit_code,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &EncoderCommand) -> Result<i32> {
            self.calls.borrow_mut().push(command.clone());
            Ok(self.exit_code)
        }
    }

    fn workspace(files: &[&str]) -> (tempfile::TempDir, MontagePaths) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(dir.path().join(file), b"").unwrap();
        }
        let paths = MontagePaths::in_dir(dir.path(), &MontageConfig::default());
        (dir, paths)
    }

    fn renderer(
        paths: MontagePaths,
        beats: BeatAnalysis,
        exit_code: i32,
    ) -> MontageRenderer<FixedBeats, RecordingRunner> {
        MontageRenderer::with_parts(
            paths,
            EncodeSettings::default(),
            FixedBeats(beats),
            RecordingRunner::exiting_with(exit_code),
        )
    }

    const ALL_INPUTS: [&str; 3] = ["gameplay.mp4", "audio.mp3", "filters_pro.txt"];

    #[test]
    fn missing_input_halts_before_encoding() {
        let (_dir, paths) = workspace(&["gameplay.mp4", "filters_pro.txt"]);
        let expected = paths.audio.clone();
        let renderer = renderer(paths, BeatAnalysis::default(), 0);

        let mut out = Vec::new();
        let err = renderer.render(&mut out).unwrap_err();

        match err {
            ToolkitError::MissingFile { path } => assert_eq!(path, expected),
            other => panic!("unexpected error: {other}"),
        }
        assert!(renderer.runner().calls.borrow().is_empty());
    }

    #[test]
    fn reports_success_with_output_path() {
        let (_dir, paths) = workspace(&ALL_INPUTS);
        let output = paths.output.clone();
        let beats = BeatAnalysis {
            tempo_bpm: 123.456,
            beats: vec![0.5, 1.0, 1.5],
        };
        let renderer = renderer(paths, beats, 0);

        let mut out = Vec::new();
        let outcome = renderer.render(&mut out).unwrap();
        let console = String::from_utf8(out).unwrap();

        assert_eq!(outcome, RenderOutcome::Completed { output: output.clone() });
        assert!(console.contains("Detected 3 beats at 123.5 BPM"));
        assert!(console.contains(&format!("Saved as: {}", output.display())));
        assert_eq!(renderer.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn non_zero_exit_points_at_filter_script() {
        let (_dir, paths) = workspace(&ALL_INPUTS);
        let renderer = renderer(paths, BeatAnalysis::default(), 1);

        let mut out = Vec::new();
        let outcome = renderer.render(&mut out).unwrap();
        let console = String::from_utf8(out).unwrap();

        assert_eq!(outcome, RenderOutcome::EncoderFailed { exit_code: 1 });
        assert!(!outcome.is_success());
        assert!(console.contains("❌ FFmpeg failed. Please check your filters_pro.txt formatting."));
    }

    #[test]
    fn beat_report_does_not_change_command() {
        let (_dir, paths) = workspace(&ALL_INPUTS);
        let slow = renderer(
            paths.clone(),
            BeatAnalysis {
                tempo_bpm: 60.0,
                beats: vec![1.0],
            },
            0,
        );
        let fast = renderer(
            paths,
            BeatAnalysis {
                tempo_bpm: 180.0,
                beats: vec![0.1, 0.4, 0.7, 1.0],
            },
            0,
        );

        slow.render(&mut std::io::sink()).unwrap();
        fast.render(&mut std::io::sink()).unwrap();

        assert_eq!(
            slow.runner().calls.borrow()[0],
            fast.runner().calls.borrow()[0]
        );
    }

    #[test]
    fn prints_the_command_before_running() {
        let (_dir, paths) = workspace(&ALL_INPUTS);
        let expected = build_command(&paths, &EncodeSettings::default()).display();
        let renderer = renderer(paths, BeatAnalysis::default(), 0);

        let mut out = Vec::new();
        renderer.render(&mut out).unwrap();
        let console = String::from_utf8(out).unwrap();

        assert!(console.starts_with("🎵 Analyzing beats..."));
        assert!(console.contains(&format!("⚙️ Running FFmpeg command:\n{expected}\n")));
    }
}
