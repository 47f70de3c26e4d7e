//! Per-sample trace dump for external plotting.

use std::io::Write;

use crate::error::Result;
use crate::pipeline::PipelineOutput;
use crate::series::TimeSeries;

/// Write `time_rel(sec),raw,filtered,cf,triggered` rows.
///
/// `triggered` is 1 for samples inside a trigger window (onset through
/// offset) and 0 elsewhere.
pub fn write_traces<W: Write>(
    writer: &mut W,
    series: &TimeSeries,
    output: &PipelineOutput,
) -> Result<()> {
    let mut triggered = vec![false; series.len()];
    for window in &output.windows {
        for flag in &mut triggered[window.onset_index..=window.offset_index] {
            *flag = true;
        }
    }

    writeln!(writer, "time_rel(sec),raw,filtered,cf,triggered")?;
    for i in 0..series.len() {
        writeln!(
            writer,
            "{},{:e},{:e},{},{}",
            series.times()[i],
            series.amplitudes()[i],
            output.filtered[i],
            output.characteristic[i],
            u8::from(triggered[i])
        )?;
    }
    Ok(())
}
