use crate::core::ParamFormat;
use crate::error::Result;
use indexmap::IndexMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Render one parameter directive in the simulator's syntax.
pub fn format_param_line(format: ParamFormat, name: &str, value: f64) -> String {
    match format {
        ParamFormat::SimulatorNative => format!(".param {} = {}", name, value),
        ParamFormat::ScriptedSweep => format!("ocnxlSweepVar(\"{}\" \"{}\")", name, value),
    }
}

/// Render the whole parameter file, one directive per line in declared order.
pub fn render_params(format: ParamFormat, params: &IndexMap<String, f64>) -> String {
    let mut out = String::new();
    for (name, &value) in params {
        out.push_str(&format_param_line(format, name, value));
        out.push('\n');
    }
    out
}

/// Write the parameter file into `dir` under the format's fixed name.
pub fn write_params(
    dir: &Path,
    format: ParamFormat,
    params: &IndexMap<String, f64>,
) -> Result<PathBuf> {
    let path = dir.join(format.file_name());
    let mut file = fs::File::create(&path)?;
    file.write_all(render_params(format, params).as_bytes())?;

    tracing::debug!(
        "Wrote {} parameters to {} ({} format)",
        params.len(),
        path.display(),
        format
    );
    Ok(path)
}
