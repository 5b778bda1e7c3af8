use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::MontageConfig;

/// Codec and quality options passed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeSettings {
    pub program: String,
    pub video_label: String,
    pub audio_label: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            video_label: "[vout]".to_string(),
            audio_label: "[aout]".to_string(),
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 18,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Input and output locations for one montage render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MontagePaths {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub filters: PathBuf,
    pub output: PathBuf,
}

impl MontagePaths {
    /// Resolves the configured file names against `base`.
    pub fn in_dir(base: &Path, config: &MontageConfig) -> Self {
        Self {
            video: base.join(&config.video_file),
            audio: base.join(&config.audio_file),
            filters: base.join(&config.filters_file),
            output: base.join(&config.output_file),
        }
    }

    /// Inputs that must exist before rendering, in check order.
    pub fn required_inputs(&self) -> [&Path; 3] {
        [
            self.video.as_path(),
            self.audio.as_path(),
            self.filters.as_path(),
        ]
    }
}

/// Program name plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncoderCommand {
    /// Space-joined form used for console output.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builds the encoder invocation. The filter script must expose `[vout]`
/// and `[aout]` outputs; both are mapped explicitly.
pub fn build_command(paths: &MontagePaths, settings: &EncodeSettings) -> EncoderCommand {
    let path = |path: &Path| path.display().to_string();
    let args = vec![
        "-y".to_string(),
        "-i".to_string(),
        path(&paths.video),
        "-i".to_string(),
        path(&paths.audio),
        "-filter_complex_script".to_string(),
        path(&paths.filters),
        "-map".to_string(),
        settings.video_label.clone(),
        "-map".to_string(),
        settings.audio_label.clone(),
        "-shortest".to_string(),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-b:a".to_string(),
        settings.audio_bitrate.clone(),
        path(&paths.output),
    ];

    EncoderCommand {
        program: settings.program.clone(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> MontagePaths {
        MontagePaths::in_dir(Path::new("/work"), &MontageConfig::default())
    }

    #[test]
    fn builds_fixed_invocation() {
        let command = build_command(&paths(), &EncodeSettings::default());

        assert_eq!(command.program, "ffmpeg");
        assert_eq!(
            command.args,
            vec![
                "-y",
                "-i",
                "/work/gameplay.mp4",
                "-i",
                "/work/audio.mp3",
                "-filter_complex_script",
                "/work/filters_pro.txt",
                "-map",
                "[vout]",
                "-map",
                "[aout]",
                "-shortest",
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-crf",
                "18",
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "/work/bedwars_montage_pro.mp4",
            ]
        );
    }

    #[test]
    fn building_is_deterministic() {
        let settings = EncodeSettings::default();
        assert_eq!(
            build_command(&paths(), &settings),
            build_command(&paths(), &settings)
        );
    }

    #[test]
    fn display_joins_program_and_args() {
        let command = EncoderCommand {
            program: "ffmpeg".to_string(),
            args: vec!["-y".to_string(), "out.mp4".to_string()],
        };
        assert_eq!(command.display(), "ffmpeg -y out.mp4");
    }

    #[test]
    fn required_inputs_are_ordered() {
        let paths = paths();
        let inputs = paths.required_inputs();
        assert_eq!(inputs[0], Path::new("/work/gameplay.mp4"));
        assert_eq!(inputs[1], Path::new("/work/audio.mp3"));
        assert_eq!(inputs[2], Path::new("/work/filters_pro.txt"));
    }
}
