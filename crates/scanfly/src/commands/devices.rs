//! `list` and `options` command handlers.

use serde::Serialize;
use tabled::Tabled;

use scanfly_core::{
    Constraint, CoreError, DeviceInfo, OptionValue, Registry, NUM_OPTIONS,
};

use crate::cli::{GlobalOpts, OptionsArgs};
use crate::error::CliError;
use crate::output::{print_output, render_list};

// ── list ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "VENDOR")]
    vendor: String,
    #[tabled(rename = "MODEL")]
    model: String,
    #[tabled(rename = "TYPE")]
    device_type: String,
}

fn device_row(info: &DeviceInfo) -> DeviceRow {
    DeviceRow {
        name: info.name.clone(),
        vendor: info.vendor.clone(),
        model: info.model.clone(),
        device_type: info.device_type.to_owned(),
    }
}

pub async fn handle_list(registry: &Registry, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = registry.list_devices().await;
    let out = render_list(&global.output, &devices, device_row, |d| d.name.clone());
    print_output(&out, global.quiet);
    Ok(())
}

// ── options ──────────────────────────────────────────────────────────

/// One option slot, as serialized for `--output json`.
#[derive(Serialize)]
struct OptionEntry {
    index: usize,
    name: &'static str,
    title: &'static str,
    value: Option<OptionValue>,
    constraint: Constraint,
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TITLE")]
    title: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "CONSTRAINT")]
    constraint: String,
}

fn option_row(entry: &OptionEntry) -> OptionRow {
    OptionRow {
        index: entry.index,
        name: entry.name.to_owned(),
        title: entry.title.to_owned(),
        value: entry.value.as_ref().map_or_else(|| "-".into(), fmt_value),
        constraint: fmt_constraint(&entry.constraint),
    }
}

fn fmt_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Int(v) => v.to_string(),
        OptionValue::Fixed(v) => format!("{v:.1}"),
        OptionValue::String(v) => v.clone(),
    }
}

fn fmt_constraint(constraint: &Constraint) -> String {
    match constraint {
        Constraint::None => "-".into(),
        Constraint::WordList(values) => values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|"),
        Constraint::IntRange { min, max } => format!("{min}..{max}"),
        Constraint::FixedRange(range) => format!("{:.1}..{:.1}", range.min, range.max),
        Constraint::StringList(values) => values.join("|"),
    }
}

pub async fn handle_options(
    args: &OptionsArgs,
    registry: &Registry,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Make sure the table has settled before the name lookup.
    registry.list_devices().await;

    let handle = registry.open(&args.name).map_err(|err| match err {
        CoreError::DeviceNotFound { name } => CliError::NotFound { name },
        other => CliError::Core(other),
    })?;

    let mut entries = Vec::with_capacity(NUM_OPTIONS);
    for index in 0..NUM_OPTIONS {
        let Some(descriptor) = handle.option_descriptor(index) else {
            break;
        };
        entries.push(OptionEntry {
            index,
            name: descriptor.name,
            title: descriptor.title,
            value: handle.get_option(index).ok(),
            constraint: descriptor.constraint.clone(),
        });
    }

    let out = render_list(&global.output, &entries, option_row, |e| {
        if e.name.is_empty() {
            e.index.to_string()
        } else {
            e.name.to_owned()
        }
    });
    print_output(&out, global.quiet);

    registry.close(handle);
    Ok(())
}
