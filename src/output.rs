//! Run artifact persistence.
//!
//! Each run writes a timestamped directory containing a copy of the job
//! file, one JSON artifact per completed stage, and a human-readable
//! summary.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::fountain;
use crate::pipeline::{Job, PipelineRun, StageResult};

/// Errors that can occur while writing run artifacts.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Writes pipeline run artifacts under a timestamped directory.
pub struct RunWriter {
    dir: PathBuf,
    saved: Vec<String>,
}

impl RunWriter {
    /// Create the run directory under `root`.
    ///
    /// The directory is named `<pipeline>_<YYYY-MM-DD_HH-MM-SS>`.
    pub fn create(root: &Path, pipeline_name: &str) -> Result<Self, OutputError> {
        let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
        let dir = root.join(format!("{}_{}", pipeline_name, stamp));
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            saved: Vec::new(),
        })
    }

    /// Directory this run writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a copy of the job for reference.
    pub fn save_job(&self, job: &Job) -> Result<(), OutputError> {
        let yaml = serde_yaml::to_string(job)?;
        fs::write(self.dir.join("job.yaml"), yaml)?;
        Ok(())
    }

    /// Save a stage result as `NN_<stage>.json`.
    pub fn save_stage(&mut self, number: usize, result: &StageResult) -> Result<(), OutputError> {
        let filename = format!("{:02}_{}.json", number, result.stage);
        let json = serde_json::to_string_pretty(result)?;
        fs::write(self.dir.join(&filename), json)?;
        tracing::debug!(file = %filename, "Saved stage artifact");
        self.saved.push(filename);
        Ok(())
    }

    /// Write a human-readable summary of a completed run.
    pub fn write_summary(&self, run: &PipelineRun) -> Result<(), OutputError> {
        let episode_title = run.context.get("episode_title").unwrap_or("N/A");
        let pitch_paragraph = run.context.get("pitch_paragraph").unwrap_or("N/A");
        let script = run.context.get("script").unwrap_or("");
        let tagged = run.context.get("script_tagged").unwrap_or("");

        let word_count = script.split_whitespace().count();
        let scene_count = fountain::split_scenes(tagged).len();
        let sfx_count = fountain::count_sfx_tags(tagged);
        let usage = run.total_usage();

        let mut summary = format!(
            "Pipeline Run Summary\nRun id: {}\nStarted: {}\nFinished: {}\n\nEpisode: {}\n\nPitch:\n{}\n\nScript Stats:\n- Word count: {}\n- Scenes: {}\n- SFX annotations: {}\n- Tokens: {} in / {} out\n\nFiles Generated:\n",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.finished_at.format("%Y-%m-%d %H:%M:%S"),
            episode_title,
            pitch_paragraph,
            word_count,
            scene_count,
            sfx_count,
            usage.input_tokens,
            usage.output_tokens,
        );

        for filename in &self.saved {
            summary.push_str(&format!("  {}\n", filename));
        }

        fs::write(self.dir.join("summary.txt"), summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;
    use crate::template::Context;
    use chrono::Utc;

    fn stage_result(stage: &str, output: &str) -> StageResult {
        StageResult {
            stage: stage.to_string(),
            output: output.to_string(),
            raw_response: format!("```fountain\n{}\n```", output),
            usage: Usage {
                input_tokens: 100,
                output_tokens: 200,
            },
            attempts: 1,
            completed_at: Utc::now(),
        }
    }

    fn completed_run() -> PipelineRun {
        let context = Context::new()
            .bind("episode_title", "The Soup Rebellion")
            .bind("pitch_paragraph", "Kiddo refuses soup.")
            .bind("script", "INT. KITCHEN - DAY\n\nKIDDO\nNo soup!")
            .bind(
                "script_tagged",
                "INT. KITCHEN - DAY\n\n{{SFX: spoon clatter, 1 second}}\n\nKIDDO\n[defiant] No soup!",
            );

        PipelineRun {
            id: uuid::Uuid::new_v4(),
            results: vec![
                stage_result("pitch", "Episode Title: The Soup Rebellion"),
                stage_result("script", "INT. KITCHEN - DAY"),
            ],
            context,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_makes_timestamped_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let writer = RunWriter::create(root.path(), "pitch_to_tagged_script").expect("create");

        assert!(writer.dir().exists());
        let name = writer
            .dir()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("dir name");
        assert!(name.starts_with("pitch_to_tagged_script_"));
    }

    #[test]
    fn test_save_stage_writes_numbered_json() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut writer = RunWriter::create(root.path(), "run").expect("create");

        writer
            .save_stage(1, &stage_result("pitch", "out"))
            .expect("save");
        writer
            .save_stage(2, &stage_result("script", "out"))
            .expect("save");

        let pitch_path = writer.dir().join("01_pitch.json");
        assert!(pitch_path.exists());
        assert!(writer.dir().join("02_script.json").exists());

        let raw = fs::read_to_string(pitch_path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["stage"], "pitch");
        assert_eq!(value["usage"]["output_tokens"], 200);
    }

    #[test]
    fn test_save_job_round_trips() {
        let root = tempfile::tempdir().expect("tempdir");
        let writer = RunWriter::create(root.path(), "run").expect("create");

        let job = Job {
            bible: "The treehouse gang.".to_string(),
            pitch_user_message: "A pitch.".to_string(),
            script_user_message: "A script.".to_string(),
            ..Job::default()
        };
        writer.save_job(&job).expect("save");

        let raw = fs::read_to_string(writer.dir().join("job.yaml")).expect("read");
        let loaded: Job = serde_yaml::from_str(&raw).expect("valid yaml");
        assert_eq!(loaded.bible, "The treehouse gang.");
    }

    #[test]
    fn test_write_summary() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut writer = RunWriter::create(root.path(), "run").expect("create");
        let run = completed_run();

        for (i, result) in run.results.iter().enumerate() {
            writer.save_stage(i + 1, result).expect("save");
        }
        writer.write_summary(&run).expect("summary");

        let summary = fs::read_to_string(writer.dir().join("summary.txt")).expect("read");
        assert!(summary.contains("The Soup Rebellion"));
        assert!(summary.contains("Scenes: 1"));
        assert!(summary.contains("SFX annotations: 1"));
        assert!(summary.contains("01_pitch.json"));
        assert!(summary.contains("02_script.json"));
        assert!(summary.contains("400 out"));
    }
}
