// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serialises a [`Model`] as exchange text, one entity per line in label
//! order.
use std::io::Write;

use graft_core::{EntityId, EntityLabel, Model, ModelError, Value};

use crate::error::StepError;
use crate::header::HeaderInfo;

/// Writes `model` to `out`.
pub fn write_model<W: Write>(
    model: &Model,
    header: &HeaderInfo,
    mut out: W,
) -> Result<(), StepError> {
    out.write_all(to_string(model, header)?.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Renders `model` as a complete exchange file.
pub fn to_string(model: &Model, header: &HeaderInfo) -> Result<String, StepError> {
    let mut text = String::new();
    text.push_str("ISO-10303-21;\nHEADER;\n");
    push_header(&mut text, model, header);
    text.push_str("ENDSEC;\nDATA;\n");
    for (id, _) in model.iter() {
        text.push_str(&entity_line(model, id)?);
        text.push('\n');
    }
    text.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
    Ok(text)
}

/// Renders one entity as `#<label>=<TYPE>(<fields>);`.
pub fn entity_line(model: &Model, id: EntityId) -> Result<String, StepError> {
    let record = model.entity(id)?;
    let mut line = format!("{}={}(", record.label(), record.type_name());
    for (index, value) in record.values().iter().enumerate() {
        if index > 0 {
            line.push(',');
        }
        push_value(&mut line, model, record.label(), value)?;
    }
    line.push_str(");");
    Ok(line)
}

/// Formats a real so that it always carries a decimal point (`0.`, `1.5`,
/// `1.E-05`).
pub fn format_real(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        let scientific = format!("{value:E}");
        let Some((mantissa, exponent)) = scientific.split_once('E') else {
            return scientific;
        };
        let mantissa = if mantissa.contains('.') {
            mantissa.to_owned()
        } else {
            format!("{mantissa}.")
        };
        let (sign, digits) = exponent
            .strip_prefix('-')
            .map_or(("", exponent), |digits| ("-", digits));
        format!("{mantissa}E{sign}{digits:0>2}")
    } else if value.fract() == 0.0 {
        format!("{value:.0}.")
    } else {
        format!("{value}")
    }
}

fn push_text(out: &mut String, text: &str) {
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
}

fn push_list<'v>(out: &mut String, items: impl IntoIterator<Item = &'v str>) {
    out.push('(');
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        push_text(out, item);
    }
    out.push(')');
}

fn push_header(out: &mut String, model: &Model, header: &HeaderInfo) {
    out.push_str("FILE_DESCRIPTION(");
    push_list(out, header.description.iter().map(String::as_str));
    out.push(',');
    push_text(out, &header.implementation_level);
    out.push_str(");\nFILE_NAME(");
    push_text(out, &header.file_name);
    out.push(',');
    push_text(out, &header.time_stamp);
    out.push(',');
    push_list(out, header.author.iter().map(String::as_str));
    out.push(',');
    push_list(out, header.organization.iter().map(String::as_str));
    out.push(',');
    push_text(out, &header.preprocessor_version);
    out.push(',');
    push_text(out, &header.originating_system);
    out.push(',');
    push_text(out, &header.authorization);
    out.push_str(");\nFILE_SCHEMA(");
    if header.schema.is_empty() {
        push_list(out, [model.schema().name()]);
    } else {
        push_list(out, header.schema.iter().map(String::as_str));
    }
    out.push_str(");\n");
}

fn push_value(
    out: &mut String,
    model: &Model,
    owner: EntityLabel,
    value: &Value,
) -> Result<(), StepError> {
    match value {
        Value::Unset => out.push('$'),
        Value::Derived => out.push('*'),
        Value::Integer(v) => out.push_str(&v.to_string()),
        Value::Real(v) => {
            if !v.is_finite() {
                return Err(StepError::NonFiniteReal { label: owner });
            }
            out.push_str(&format_real(*v));
        }
        Value::Text(text) => push_text(out, text),
        Value::Logical(Some(true)) => out.push_str(".T."),
        Value::Logical(Some(false)) => out.push_str(".F."),
        Value::Logical(None) => out.push_str(".U."),
        Value::Enum(item) => {
            out.push('.');
            out.push_str(item);
            out.push('.');
        }
        Value::Binary(hex) => {
            out.push('"');
            out.push_str(hex);
            out.push('"');
        }
        Value::Ref(id) => {
            let label = model
                .label_of(*id)
                .ok_or(ModelError::UnknownEntity(*id))?;
            out.push_str(&label.to_string());
        }
        Value::List(items) => {
            out.push('(');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                push_value(out, model, owner, item)?;
            }
            out.push(')');
        }
        Value::Typed { type_name, value } => {
            out.push_str(type_name.as_str());
            out.push('(');
            push_value(out, model, owner, value)?;
            out.push(')');
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reals_always_carry_a_decimal_point() {
        assert_eq!(format_real(0.0), "0.");
        assert_eq!(format_real(200.0), "200.");
        assert_eq!(format_real(-1.0), "-1.");
        assert_eq!(format_real(1.5), "1.5");
        assert_eq!(format_real(0.001), "0.001");
        assert_eq!(format_real(1.0e-5), "1.E-05");
        assert_eq!(format_real(-2.5e-7), "-2.5E-07");
        assert_eq!(format_real(1.5e20), "1.5E20");
    }
}
