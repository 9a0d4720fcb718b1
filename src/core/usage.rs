use std::fmt;
use std::io;
use std::process::Command;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// Shell pipeline scraping system-wide CPU and memory figures from `top`.
pub const TOP_PIPELINE: &str = "top -bn1 | grep '%Cpu' | awk '{print $2}' && top -bn1 | grep 'KiB Mem' | awk '{print $5}'";

pub const CPU_LABEL_PLACEHOLDER: &str = "CPU Usage: ";
pub const MEMORY_LABEL_PLACEHOLDER: &str = "Memory Usage: ";

#[derive(Debug, Clone, PartialEq)]
pub struct UsageSnapshot {
    pub cpu: String,     // percentage, no unit
    pub memory: String,  // kilobytes, no unit
}

impl UsageSnapshot {
    pub fn cpu_label(&self) -> String {
        format!("CPU Usage: {}%", self.cpu)
    }

    pub fn memory_label(&self) -> String {
        format!("Memory Usage: {} KB", self.memory)
    }
}

#[derive(Debug)]
pub enum SampleError {
    Command(io::Error),
    MissingToken(&'static str),
    Malformed { field: &'static str, value: String },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Command(err) => write!(f, "usage command failed to run: {}", err),
            SampleError::MissingToken(field) => write!(f, "usage output has no {} value", field),
            SampleError::Malformed { field, value } => {
                write!(f, "usage output has malformed {} value '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Command(err) => Some(err),
            _ => None,
        }
    }
}

/// Blocking, uncached source of usage figures. Every call re-reads the system.
pub trait UsageSource {
    fn sample(&mut self) -> Result<UsageSnapshot, SampleError>;
}

/// Takes the first two whitespace-separated tokens: CPU then memory.
pub fn parse_usage_output(output: &str) -> Result<UsageSnapshot, SampleError> {
    let mut tokens = output.split_whitespace();
    let cpu = tokens.next().ok_or(SampleError::MissingToken("cpu"))?;
    let memory = tokens.next().ok_or(SampleError::MissingToken("memory"))?;

    Ok(UsageSnapshot {
        cpu: check_numeric("cpu", cpu)?,
        memory: check_numeric("memory", memory)?,
    })
}

fn check_numeric(field: &'static str, token: &str) -> Result<String, SampleError> {
    // Some locales print a decimal comma.
    let normalized = token.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(_) => Ok(token.to_string()),
        Err(_) => Err(SampleError::Malformed {
            field,
            value: token.to_string(),
        }),
    }
}

/// Runs a shell pipeline and parses its stdout.
pub struct TopUsageSource {
    pipeline: String,
}

impl TopUsageSource {
    pub fn new() -> Self {
        Self::with_pipeline(TOP_PIPELINE)
    }

    pub fn with_pipeline(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
        }
    }
}

impl Default for TopUsageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for TopUsageSource {
    fn sample(&mut self) -> Result<UsageSnapshot, SampleError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.pipeline)
            .output()
            .map_err(SampleError::Command)?;

        parse_usage_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads the same figures through `sysinfo` instead of shelling out.
pub struct SysinfoUsageSource {
    system: System,
}

impl SysinfoUsageSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());
        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for SysinfoUsageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for SysinfoUsageSource {
    fn sample(&mut self) -> Result<UsageSnapshot, SampleError> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        Ok(UsageSnapshot {
            cpu: format!("{:.1}", self.system.global_cpu_usage()),
            memory: (self.system.used_memory() / 1024).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cpu_and_memory_tokens() {
        let snapshot = parse_usage_output("3.1\n8042164\n").unwrap();
        assert_eq!(snapshot.cpu, "3.1");
        assert_eq!(snapshot.memory, "8042164");
        assert_eq!(snapshot.cpu_label(), "CPU Usage: 3.1%");
        assert_eq!(snapshot.memory_label(), "Memory Usage: 8042164 KB");
    }

    #[test]
    fn missing_memory_token_is_an_error() {
        match parse_usage_output("12.5\n") {
            Err(SampleError::MissingToken("memory")) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match parse_usage_output("   ") {
            Err(SampleError::MissingToken("cpu")) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_numeric_token_is_malformed() {
        match parse_usage_output("us, 2048") {
            Err(SampleError::Malformed { field: "cpu", value }) => assert_eq!(value, "us,"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn decimal_comma_is_accepted_verbatim() {
        let snapshot = parse_usage_output("4,7 1024").unwrap();
        assert_eq!(snapshot.cpu, "4,7");
    }

    #[test]
    fn top_source_reads_pipeline_stdout() {
        let mut source = TopUsageSource::with_pipeline("echo 7.5 && echo 2048");
        let snapshot = source.sample().unwrap();
        assert_eq!(snapshot.cpu, "7.5");
        assert_eq!(snapshot.memory, "2048");
    }

    #[test]
    fn top_source_reports_empty_output() {
        let mut source = TopUsageSource::with_pipeline("true");
        assert!(matches!(source.sample(), Err(SampleError::MissingToken("cpu"))));
    }

    #[test]
    fn sysinfo_source_yields_numeric_figures() {
        let mut source = SysinfoUsageSource::new();
        let snapshot = source.sample().unwrap();
        assert!(snapshot.cpu.parse::<f32>().is_ok());
        assert!(snapshot.memory.parse::<u64>().is_ok());
    }
}
