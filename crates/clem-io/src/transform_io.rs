//! ITK text transform files (`#Insight Transform File V1.0`).

use anyhow::{anyhow, bail, Context, Result};
use clem_core::transform::{SpatialTransform, TransformKind};
use std::fmt::Write as _;
use std::path::Path;

const HEADER: &str = "#Insight Transform File V1.0";

/// Render a transform as ITK text.
///
/// Values use Rust's shortest round-trip float formatting, so parsing the
/// text back gives bit-identical parameters.
pub fn format_transform(transform: &SpatialTransform) -> String {
    let join = |values: &[f64]| {
        values
            .iter()
            .map(|v| format!("{}", v))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(text, "{}", HEADER);
    let _ = writeln!(text, "#Transform 0");
    let _ = writeln!(text, "Transform: {}", transform.kind().itk_name());
    let _ = writeln!(text, "Parameters: {}", join(transform.parameters()));
    let _ = writeln!(text, "FixedParameters: {}", join(transform.fixed_parameters()));
    text
}

fn parse_values(line: &str, key: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("Invalid {} value `{}`", key, token))
        })
        .collect()
}

/// Parse ITK text holding a single 2D transform.
pub fn parse_transform(text: &str) -> Result<SpatialTransform> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some(first) if first.starts_with("#Insight Transform File") => {}
        _ => bail!("Missing `{}` header", HEADER),
    }

    let mut kind = None;
    let mut parameters = None;
    let mut fixed_parameters = None;

    for line in lines {
        if line.starts_with('#') {
            if kind.is_some() && line.starts_with("#Transform") {
                tracing::warn!("transform file holds more than one transform, using the first");
                break;
            }
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| anyhow!("Malformed transform line `{}`", line))?;
        let value = value.trim();
        match key.trim() {
            "Transform" => {
                kind = Some(
                    TransformKind::from_itk_name(value)
                        .ok_or_else(|| anyhow!("Unsupported transform type `{}`", value))?,
                );
            }
            "Parameters" => parameters = Some(parse_values(value, "parameter")?),
            "FixedParameters" => fixed_parameters = Some(parse_values(value, "fixed parameter")?),
            other => tracing::debug!(key = other, "ignoring transform file entry"),
        }
    }

    let kind = kind.ok_or_else(|| anyhow!("Transform file has no `Transform:` entry"))?;
    let parameters = parameters.ok_or_else(|| anyhow!("Transform file has no `Parameters:` entry"))?;
    let fixed_parameters = fixed_parameters.unwrap_or_default();

    Ok(SpatialTransform::new(kind, parameters, fixed_parameters)?)
}

/// Read a transform from an ITK text file.
pub fn read_transform<P: AsRef<Path>>(path: P) -> Result<SpatialTransform> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transform file {}", path.display()))?;
    let transform = parse_transform(&text).with_context(|| format!("Invalid transform file {}", path.display()))?;
    tracing::debug!(path = %path.display(), kind = %transform.kind(), "read transform");
    Ok(transform)
}

/// Write a transform as an ITK text file.
pub fn write_transform<P: AsRef<Path>>(path: P, transform: &SpatialTransform) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_transform(transform))
        .with_context(|| format!("Failed to write transform file {}", path.display()))?;
    tracing::debug!(path = %path.display(), kind = %transform.kind(), "wrote transform");
    Ok(())
}
