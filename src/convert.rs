//! Conversion of instance files into MiniZinc data files.

use std::{fs, io::{self, Write}, path::{Path, PathBuf}};

use clap::{Args, ValueEnum};

use crate::config::Config;
use crate::error::{MinPolError, MinPolResult};
use crate::instance::InstanceSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// The positional plain-text layout
    Txt,
    /// A serialized instance, as produced by `generate --format json`
    Json,
}

impl InputFormat {
    fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Txt,
        }
    }
}

#[derive(Debug, Args)]
pub struct Convert {
    /// The instance file to convert (looked up in the instances directory if not found)
    pub input: PathBuf,
    /// Where to write the data file (defaults to the configured data file)
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Input format, guessed from the file extension when absent
    #[clap(short, long, value_enum)]
    pub format: Option<InputFormat>,
}

impl Convert {
    pub fn convert(&self, config: &Config) -> MinPolResult<InstanceSpec> {
        let input = config.instance_path(&self.input);
        let output = self.output.as_deref().unwrap_or(&config.paths.data);
        match self.format.unwrap_or_else(|| InputFormat::detect(&input)) {
            InputFormat::Txt => convert_file(&input, output),
            format => convert_file_as(&input, output, format),
        }
    }
}

/// Parses a plain-text instance and renders its data file.
pub fn convert_str(content: &str) -> MinPolResult<(InstanceSpec, String)> {
    let instance = InstanceSpec::parse_txt(content)?;
    let dzn = instance.to_dzn();
    Ok((instance, dzn))
}

/// Converts the plain-text instance at `input` into a data file at `output`.
pub fn convert_file(input: &Path, output: &Path) -> MinPolResult<InstanceSpec> {
    convert_file_as(input, output, InputFormat::Txt)
}

pub fn convert_file_as(input: &Path, output: &Path, format: InputFormat) -> MinPolResult<InstanceSpec> {
    let result = read_instance(input, format).and_then(|instance| {
        write_atomically(output, &instance.to_dzn())?;
        Ok(instance)
    });

    match &result {
        Ok(instance) => log::info!("{} written from {}\n{}", output.display(), input.display(), instance.summary()),
        Err(e) => log::error!("conversion of {} failed: {e}", input.display()),
    }
    result
}

/// Converts an in-memory plain-text document, writing the data file to `output`.
pub fn convert_buffer(content: &str, output: &Path) -> MinPolResult<InstanceSpec> {
    let result = convert_str(content).and_then(|(instance, dzn)| {
        write_atomically(output, &dzn)?;
        Ok(instance)
    });

    match &result {
        Ok(instance) => log::info!("{} written\n{}", output.display(), instance.summary()),
        Err(e) => log::error!("conversion failed: {e}"),
    }
    result
}

fn read_instance(path: &Path, format: InputFormat) -> MinPolResult<InstanceSpec> {
    let content = read_to_string(path)?;
    match format {
        InputFormat::Txt => InstanceSpec::parse_txt(&content),
        InputFormat::Json => {
            let instance: InstanceSpec = serde_json::from_str(&content)
                .map_err(|e| MinPolError::value("instance", e.line(), &path.to_string_lossy(), e))?;
            instance.validate()?;
            Ok(instance)
        }
    }
}

fn read_to_string(path: &Path) -> MinPolResult<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MinPolError::FileNotFound { path: path.to_path_buf() },
        _ => MinPolError::Io(e),
    })
}

/// Writes the whole document to a sibling temporary file, then renames it
/// over `path`. Readers see either the old file or the complete new one.
pub fn write_atomically(path: &Path, content: &str) -> MinPolResult<()> {
    let file_name = path.file_name().ok_or_else(|| {
        MinPolError::Io(io::Error::new(io::ErrorKind::InvalidInput, format!("'{}' is not a file path", path.display())))
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp = path.with_file_name(tmp_name);

    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    let result = written.and_then(|_| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}
