use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use coast_common::{Metadata, RoiSettings, ShorelineSettings, ShorelineTimeSeries};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{Detector, DetectorError, DetectorStep, ExtractRequest, Result};

/// How to launch the external detection program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectorConfig {
    /// Executable name (looked up on `PATH`) or path
    pub program: String,
    /// Arguments placed before the step name
    #[serde(default)]
    pub args: Vec<String>,
}

impl DetectorConfig {
    pub fn build(&self) -> Result<ProcessDetector> {
        Ok(ProcessDetector::new(&self.program)?.with_args(self.args.clone()))
    }
}

/// Detector backed by an external program.
///
/// Each step runs `<program> <args..> <step>`, with the request as JSON on
/// stdin and the response expected as JSON on stdout.
#[derive(Debug, Clone)]
pub struct ProcessDetector {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessDetector {
    pub fn new(program: impl AsRef<str>) -> Result<Self> {
        let program = Self::find_executable(program.as_ref())?;
        Ok(Self {
            program,
            args: Vec::new(),
        })
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn find_executable(program: &str) -> Result<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            // Explicit path, verify it exists
            return if candidate.exists() {
                Ok(candidate.to_path_buf())
            } else {
                Err(DetectorError::Initialization(format!(
                    "Detector executable not found at: {program}"
                )))
            };
        }

        std::env::var_os("PATH")
            .iter()
            .flat_map(std::env::split_paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                DetectorError::Initialization(format!(
                    "Detector executable '{program}' not found on PATH"
                ))
            })
    }

    fn build_command(&self, step: DetectorStep) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(step.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn run<Req, Resp>(&self, step: DetectorStep, request: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;
        let mut cmd = self.build_command(step);
        debug!("Running detector step '{}': {:?}", step, cmd);

        let mut child = cmd.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DetectorError::Execution("Detector stdin unavailable".to_string()))?;
        // Feed stdin from its own thread so a chatty child cannot block on a full stdout pipe
        let writer = std::thread::spawn(move || stdin.write_all(&payload));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            // The program may legitimately exit without reading its input
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(DetectorError::Execution("Detector stdin writer panicked".to_string()));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DetectorError::Execution(format!(
                "step '{}' exited with {}: {}",
                step,
                output.status,
                stderr.trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl Detector for ProcessDetector {
    fn get_metadata(&self, inputs: &RoiSettings) -> Result<Metadata> {
        let metadata: Metadata = self.run(DetectorStep::Metadata, inputs)?;
        info!(
            "Detector returned metadata for {} satellite(s) of {}",
            metadata.len(),
            inputs.sitename
        );
        Ok(metadata)
    }

    fn extract_shorelines(
        &self,
        metadata: &Metadata,
        settings: &ShorelineSettings,
    ) -> Result<ShorelineTimeSeries> {
        let request = ExtractRequest { metadata, settings };
        let series: ShorelineTimeSeries = self.run(DetectorStep::Extract, &request)?;
        info!("Detector returned {} shoreline(s)", series.len());
        Ok(series)
    }

    fn description(&self) -> String {
        format!("Process detector: {} {}", self.program.display(), self.args.join(" "))
    }
}
