// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Declarative decoding of control paragraphs.

A field table lists the fields a consumer cares about, how many values each holds and
how multiple values are delimited. [decode_paragraph()] walks a [ControlParagraph] against
such a table and hands back split values tagged with a consumer chosen slot. The decoder
knows nothing about the types it feeds, so adding a field is a one line table change.
*/

use crate::{
    control::ControlParagraph,
    error::{DebianError, Result},
};

/// How many values a field carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// Exactly one value. The field is required.
    One,
    /// At most one value.
    Optional,
    /// Zero or more values.
    Many,
}

/// How values within a field are separated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delimiter {
    /// The value is taken whole.
    None,
    /// `,` separated.
    Comma,
    /// Separated by runs of whitespace.
    Whitespace,
    /// One value per line.
    Newline,
}

/// Describes a single field in a field table.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec<S> {
    /// Field name. Matched case insensitively.
    pub name: &'static str,
    pub cardinality: Cardinality,
    pub delimiter: Delimiter,
    /// Consumer defined destination of the value.
    pub slot: S,
}

impl<S> FieldSpec<S> {
    pub const fn new(
        name: &'static str,
        cardinality: Cardinality,
        delimiter: Delimiter,
        slot: S,
    ) -> Self {
        Self {
            name,
            cardinality,
            delimiter,
            slot,
        }
    }
}

/// A decoded field value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue<'p> {
    /// An undelimited value.
    Single(&'p str),
    /// A delimited value, split, trimmed, empty entries removed.
    List(Vec<&'p str>),
}

impl<'p> FieldValue<'p> {
    /// Obtain the value as a single string.
    ///
    /// Lists yield their first entry.
    pub fn as_single(&self) -> Option<&'p str> {
        match self {
            Self::Single(v) => Some(v),
            Self::List(values) => values.first().copied(),
        }
    }

    /// Obtain the value as a list of strings.
    pub fn into_list(self) -> Vec<&'p str> {
        match self {
            Self::Single(v) => vec![v],
            Self::List(values) => values,
        }
    }
}

fn split<'p>(value: &'p str, delimiter: Delimiter) -> FieldValue<'p> {
    match delimiter {
        Delimiter::None => FieldValue::Single(value.trim()),
        Delimiter::Comma => FieldValue::List(
            value
                .split(',')
                .map(|x| x.trim())
                .filter(|x| !x.is_empty())
                .collect(),
        ),
        Delimiter::Whitespace => FieldValue::List(value.split_ascii_whitespace().collect()),
        Delimiter::Newline => FieldValue::List(
            value
                .lines()
                .map(|x| x.trim())
                .filter(|x| !x.is_empty())
                .collect(),
        ),
    }
}

/// Decode a paragraph according to a field table.
///
/// Values are returned in table order. Fields absent from the paragraph are omitted unless
/// they are [Cardinality::One], which is an error. [Cardinality::One] fields without a
/// delimiter must also fit on a single line. Fields not named by the table are ignored.
pub fn decode_paragraph<'p, S: Copy>(
    paragraph: &'p ControlParagraph<'_>,
    table: &[FieldSpec<S>],
) -> Result<Vec<(S, FieldValue<'p>)>> {
    let mut values = Vec::with_capacity(table.len());

    for spec in table {
        let value = match (paragraph.field_str(spec.name), spec.cardinality) {
            (Some(value), _) => value,
            (None, Cardinality::One) => {
                return Err(DebianError::ControlRequiredFieldMissing(
                    spec.name.to_string(),
                ))
            }
            (None, _) => continue,
        };

        if spec.cardinality == Cardinality::One
            && spec.delimiter == Delimiter::None
            && value.trim().contains('\n')
        {
            return Err(DebianError::ControlSimpleValueNoMultiline(
                spec.name.to_string(),
            ));
        }

        values.push((spec.slot, split(value, spec.delimiter)));
    }

    Ok(values)
}
