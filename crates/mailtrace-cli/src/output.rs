//! JSON rendering for resolution results and reports.

use mailtrace_core::ResolutionResult;
use mailtrace_engine::{AdapterStatus, ResolutionReport};
use serde_json::{json, Value};

pub(crate) fn result_json(result: &ResolutionResult) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(result)?)
}

pub(crate) fn report_json(report: &ResolutionReport) -> Value {
    let adapters: Vec<Value> = report
        .outcomes
        .iter()
        .map(|o| {
            let records = match o.status {
                AdapterStatus::Found(n) => n,
                _ => 0,
            };
            json!({
                "adapter": o.adapter,
                "rank": o.rank,
                "status": o.status.as_str(),
                "records": records,
                "elapsed_ms": u64::try_from(o.elapsed.as_millis()).unwrap_or(u64::MAX),
            })
        })
        .collect();

    json!({
        "result": report.result,
        "adapters": adapters,
        "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
    })
}

pub(crate) fn print_json(value: &Value, compact: bool) -> anyhow::Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}
