// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use synthbench::{ExtraFields, SummaryValue};

/// Parses a `key=value` summary field. Values that read as a boolean,
/// integer, or float keep that type; anything else is a string.
pub fn parse_extra_field(text: &str) -> anyhow::Result<(String, SummaryValue)> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| anyhow!("summary field must be key=value; got {:?}", text))?;
    if key.is_empty() {
        return Err(anyhow!("summary field key is empty in {:?}", text));
    }
    let value = if let Ok(b) = value.parse::<bool>() {
        SummaryValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        SummaryValue::Int(i)
    } else if let Ok(x) = value.parse::<f64>() {
        SummaryValue::Float(x)
    } else {
        SummaryValue::Str(value.to_string())
    };
    Ok((key.to_string(), value))
}

/// Collects every `--extra key=value` given to the subcommand.
pub fn extra_fields_from_matches(matches: &ArgMatches) -> anyhow::Result<ExtraFields> {
    let mut fields = ExtraFields::new();
    for text in matches.get_many::<String>("extra").into_iter().flatten() {
        let (key, value) = parse_extra_field(text)?;
        if fields.insert(key.clone(), value).is_some() {
            return Err(anyhow!("summary field `{}` given more than once", key));
        }
    }
    Ok(fields)
}

pub fn parse_u32_flag(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<u32>> {
    matches
        .get_one::<String>(name)
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("--{} must be a non-negative integer; got {:?}", name, s))
        })
        .transpose()
}
