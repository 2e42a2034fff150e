//! ITK transform file I/O.
//!
//! `antsRegistration` writes rigid/affine results as `.mat` files: a MATLAB
//! level-4 container holding two double matrices, `AffineTransform_double_3_3`
//! (the 3×3 matrix row-major followed by the translation) and `fixed` (the
//! center of rotation). Initial transforms are exchanged the same way, or in
//! the `#Insight Transform File V1.0` ASCII form (`.txt`/`.tfm`).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};

use atlasprep_core::transform::AffineTransform;

const AFFINE_VARIABLE: &str = "AffineTransform_double_3_3";
const FIXED_VARIABLE: &str = "fixed";
const INSIGHT_MAGIC: &str = "#Insight Transform File V1.0";

/// Read an affine transform from an ITK transform file.
///
/// Supports the binary `.mat` form and the ASCII `.txt`/`.tfm` form,
/// dispatching on the file extension.
pub fn read_itk_affine<P: AsRef<Path>>(path: P) -> Result<AffineTransform<3>> {
    let path = path.as_ref();
    match extension(path) {
        Some("mat") => read_mat(path),
        Some("txt") | Some("tfm") => read_ascii(path),
        _ => bail!(
            "Unsupported transform file extension: {}",
            path.display()
        ),
    }
}

/// Write an affine transform to an ITK transform file.
///
/// The format is chosen from the file extension, mirroring
/// [`read_itk_affine`].
pub fn write_itk_affine<P: AsRef<Path>>(path: P, transform: &AffineTransform<3>) -> Result<()> {
    let path = path.as_ref();
    match extension(path) {
        Some("mat") => write_mat(path, transform),
        Some("txt") | Some("tfm") => write_ascii(path, transform),
        _ => bail!(
            "Unsupported transform file extension: {}",
            path.display()
        ),
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

// ---------------------------------------------------------------------------
// MATLAB level-4 container
// ---------------------------------------------------------------------------

fn read_mat(path: &Path) -> Result<AffineTransform<3>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read transform file {}", path.display()))?;
    let variables = parse_mat4(&bytes)
        .with_context(|| format!("Malformed .mat transform file {}", path.display()))?;

    let parameters = variables
        .get(AFFINE_VARIABLE)
        .with_context(|| format!("Transform file is missing {AFFINE_VARIABLE}"))?;
    let fixed = variables
        .get(FIXED_VARIABLE)
        .with_context(|| format!("Transform file is missing {FIXED_VARIABLE}"))?;

    AffineTransform::<3>::from_parameters(parameters, fixed).with_context(|| {
        format!(
            "Unexpected parameter counts: {} parameters, {} fixed",
            parameters.len(),
            fixed.len()
        )
    })
}

fn write_mat(path: &Path, transform: &AffineTransform<3>) -> Result<()> {
    let mut bytes = Vec::new();
    append_mat4_variable(&mut bytes, AFFINE_VARIABLE, &transform.parameters());
    append_mat4_variable(&mut bytes, FIXED_VARIABLE, &transform.fixed_parameters());
    fs::write(path, bytes)
        .with_context(|| format!("Failed to write transform file {}", path.display()))
}

/// Parse a MATLAB level-4 file into named double vectors.
///
/// Only the little-endian full-double layout ITK writes is accepted.
fn parse_mat4(bytes: &[u8]) -> Result<HashMap<String, Vec<f64>>> {
    let mut variables = HashMap::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        ensure!(bytes.len() - offset >= 20, "Truncated matrix header");
        let type_code = read_i32(bytes, offset);
        let mrows = read_i32(bytes, offset + 4);
        let ncols = read_i32(bytes, offset + 8);
        let imagf = read_i32(bytes, offset + 12);
        let namlen = read_i32(bytes, offset + 16);
        offset += 20;

        ensure!(
            type_code == 0,
            "Unsupported matrix type code {type_code} (expected little-endian doubles)"
        );
        ensure!(imagf == 0, "Complex matrices are not supported");
        ensure!(
            mrows >= 0 && ncols >= 0 && namlen > 0,
            "Invalid matrix dimensions"
        );

        let namlen = namlen as usize;
        ensure!(bytes.len() - offset >= namlen, "Truncated matrix name");
        let name_bytes = &bytes[offset..offset + namlen];
        let name = std::str::from_utf8(name_bytes)
            .context("Matrix name is not UTF-8")?
            .trim_end_matches('\0')
            .to_string();
        offset += namlen;

        let count = (mrows as usize) * (ncols as usize);
        ensure!(
            bytes.len() - offset >= count * 8,
            "Truncated matrix payload for {name}"
        );
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            let start = offset + i * 8;
            let raw: [u8; 8] = bytes[start..start + 8].try_into().expect("8-byte slice");
            values.push(f64::from_le_bytes(raw));
        }
        offset += count * 8;

        variables.insert(name, values);
    }

    Ok(variables)
}

fn append_mat4_variable(out: &mut Vec<u8>, name: &str, values: &[f64]) {
    // Header: type, mrows, ncols, imagf, namlen. Type 0 is the
    // little-endian full-double layout. Column vector layout matches ITK.
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&(values.len() as i32).to_le_bytes());
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&((name.len() + 1) as i32).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let raw: [u8; 4] = bytes[offset..offset + 4].try_into().expect("4-byte slice");
    i32::from_le_bytes(raw)
}

// ---------------------------------------------------------------------------
// Insight ASCII form
// ---------------------------------------------------------------------------

fn read_ascii(path: &Path) -> Result<AffineTransform<3>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transform file {}", path.display()))?;

    ensure!(
        text.lines()
            .next()
            .map(|l| l.trim() == INSIGHT_MAGIC)
            .unwrap_or(false),
        "Not an Insight transform file: {}",
        path.display()
    );

    let mut parameters: Option<Vec<f64>> = None;
    let mut fixed: Option<Vec<f64>> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Transform:") {
            let kind = rest.trim();
            ensure!(
                kind == AFFINE_VARIABLE,
                "Unsupported transform type: {kind}"
            );
        } else if let Some(rest) = line.strip_prefix("Parameters:") {
            parameters = Some(parse_floats(rest)?);
        } else if let Some(rest) = line.strip_prefix("FixedParameters:") {
            fixed = Some(parse_floats(rest)?);
        }
    }

    let parameters = parameters.context("Transform file has no Parameters line")?;
    let fixed = fixed.context("Transform file has no FixedParameters line")?;

    AffineTransform::<3>::from_parameters(&parameters, &fixed).with_context(|| {
        format!(
            "Unexpected parameter counts: {} parameters, {} fixed",
            parameters.len(),
            fixed.len()
        )
    })
}

fn write_ascii(path: &Path, transform: &AffineTransform<3>) -> Result<()> {
    let mut text = String::new();
    text.push_str(INSIGHT_MAGIC);
    text.push('\n');
    text.push_str("#Transform 0\n");
    text.push_str(&format!("Transform: {AFFINE_VARIABLE}\n"));
    text.push_str(&format!(
        "Parameters: {}\n",
        join_floats(&transform.parameters())
    ));
    text.push_str(&format!(
        "FixedParameters: {}\n",
        join_floats(&transform.fixed_parameters())
    ));
    fs::write(path, text)
        .with_context(|| format!("Failed to write transform file {}", path.display()))
}

fn parse_floats(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .with_context(|| format!("Invalid number in transform file: {tok}"))
        })
        .collect()
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
