// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Defines primitives in control files.

See <https://www.debian.org/doc/debian-policy/ch-controlfields.html>
for the canonical source of truth for how control files work.

A control file is a series of paragraphs separated by blank lines. Each paragraph holds
`Name: value` fields. A value continues onto following lines that start with a space or
a tab. Lines starting with `#` are comments.
*/

use {
    crate::error::{DebianError, Result},
    std::{
        borrow::Cow,
        fmt::{Display, Formatter},
        io::{BufRead, Write},
    },
};

/// A `Name: value` pair in a control paragraph.
///
/// Values of multiline fields retain their continuation lines verbatim, including the
/// leading whitespace marking them as continuations. A value starting on the line after
/// the name starts with a newline.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlField<'a> {
    name: Cow<'a, str>,
    value: Cow<'a, str>,
}

impl<'a> ControlField<'a> {
    pub fn new(name: Cow<'a, str>, value: Cow<'a, str>) -> Self {
        Self { name, value }
    }

    /// The field name, as it was written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw value.
    pub fn value_str(&self) -> &str {
        &self.value
    }

    /// Whitespace separated words of the value, across all lines.
    pub fn iter_words(&self) -> Box<(dyn Iterator<Item = &str> + '_)> {
        Box::new(self.value.split_ascii_whitespace())
    }

    /// Trimmed, non-empty lines of the value.
    pub fn iter_lines(&self) -> Box<(dyn Iterator<Item = &str> + '_)> {
        Box::new(non_empty(self.value.lines()))
    }

    /// Trimmed, non-empty `,` separated entries of the value.
    pub fn iter_comma_delimited(&self) -> Box<(dyn Iterator<Item = &str> + '_)> {
        Box::new(non_empty(self.value.split(',')))
    }

    /// Write the field, including its trailing newline.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", self)
    }
}

impl<'a> Display for ControlField<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.value.starts_with('\n') {
            write!(f, "{}:{}", self.name, self.value)
        } else {
            write!(f, "{}: {}", self.name, self.value)
        }
    }
}

fn non_empty<'s>(items: impl Iterator<Item = &'s str>) -> impl Iterator<Item = &'s str> {
    items.map(str::trim).filter(|x| !x.is_empty())
}

/// An ordered set of [ControlField].
///
/// Lookups ignore ASCII case. A name appears at most once: setting a field that is already
/// present replaces its value in place, keeping the original position and spelling of the
/// name.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlParagraph<'a> {
    fields: Vec<ControlField<'a>>,
}

impl<'a> ControlParagraph<'a> {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field, replacing any field with the same name.
    pub fn set_field(&mut self, field: ControlField<'a>) {
        match self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&field.name))
        {
            Some(existing) => existing.value = field.value,
            None => self.fields.push(field),
        }
    }

    /// Set a field from a name and value.
    pub fn set_field_from_string(&mut self, name: Cow<'a, str>, value: Cow<'a, str>) {
        self.set_field(ControlField::new(name, value));
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterate over fields in the order they were first set.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField<'a>> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Option<&ControlField<'a>> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// The raw value of a field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(ControlField::value_str)
    }

    /// The raw value of a field, which must be present.
    pub fn required_field_str(&self, name: &str) -> Result<&str> {
        self.field_str(name)
            .ok_or_else(|| DebianError::ControlRequiredFieldMissing(name.to_string()))
    }

    /// A `yes`/`no` field. Anything but `yes` is false.
    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.field_str(name).map(|v| v.trim() == "yes")
    }

    pub fn field_u64(&self, name: &str) -> Option<Result<u64>> {
        self.field_str(name)
            .map(|v| v.trim().parse::<u64>().map_err(DebianError::from))
    }

    pub fn iter_field_words(&self, name: &str) -> Option<Box<(dyn Iterator<Item = &str> + '_)>> {
        self.field(name).map(ControlField::iter_words)
    }

    pub fn iter_field_lines(&self, name: &str) -> Option<Box<(dyn Iterator<Item = &str> + '_)>> {
        self.field(name).map(ControlField::iter_lines)
    }

    pub fn iter_field_comma_delimited(
        &self,
        name: &str,
    ) -> Option<Box<(dyn Iterator<Item = &str> + '_)>> {
        self.field(name).map(ControlField::iter_comma_delimited)
    }

    /// Write every field. No blank line is written after the last field.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.fields.iter().try_for_each(|field| field.write(writer))
    }
}

impl<'a> Display for ControlParagraph<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for field in &self.fields {
            writeln!(f, "{}", field)?;
        }

        Ok(())
    }
}

enum Line<'l> {
    Blank,
    Comment,
    Continuation(&'l str),
    Field(&'l str),
}

impl<'l> Line<'l> {
    fn classify(line: &'l str) -> Self {
        if line.trim().is_empty() {
            Self::Blank
        } else if line.starts_with('#') {
            Self::Comment
        } else if line.starts_with(' ') || line.starts_with('\t') {
            Self::Continuation(line)
        } else {
            Self::Field(line)
        }
    }
}

/// Incremental control file parser.
///
/// Lines are fed one at a time with [Self::write_line()]. A paragraph is emitted once the
/// blank line terminating it is seen, or from [Self::finish()] at end of input.
#[derive(Clone, Debug, Default)]
pub struct ControlFileParser {
    paragraph: ControlParagraph<'static>,
    /// Text of the field being accumulated and the line number it started on.
    pending: Option<(String, usize)>,
    line_number: usize,
}

impl ControlFileParser {
    /// Feed a line, which may include its line terminator.
    pub fn write_line(&mut self, line: &str) -> Result<Option<ControlParagraph<'static>>> {
        self.line_number += 1;

        match Line::classify(line) {
            Line::Blank => {
                self.flush_pending()?;

                Ok(if self.paragraph.is_empty() {
                    None
                } else {
                    Some(std::mem::take(&mut self.paragraph))
                })
            }
            Line::Comment => Ok(None),
            Line::Continuation(text) => match &mut self.pending {
                Some((field, _)) => {
                    field.push_str(text);
                    Ok(None)
                }
                None => Err(DebianError::ControlParseError(format!(
                    "line {}: continuation line without a field: '{}'",
                    self.line_number,
                    text.trim_end()
                ))),
            },
            Line::Field(text) => {
                self.flush_pending()?;
                self.pending = Some((text.to_string(), self.line_number));

                Ok(None)
            }
        }
    }

    /// Finish parsing, returning the final paragraph if it was not terminated by a blank line.
    pub fn finish(mut self) -> Result<Option<ControlParagraph<'static>>> {
        self.flush_pending()?;

        Ok(Some(self.paragraph).filter(|p| !p.is_empty()))
    }

    fn flush_pending(&mut self) -> Result<()> {
        let (text, line_number) = match self.pending.take() {
            Some(pending) => pending,
            None => return Ok(()),
        };

        let malformed = |reason: &str| {
            DebianError::ControlParseError(format!(
                "line {}: {}: '{}'",
                line_number,
                reason,
                text.trim_end()
            ))
        };

        let (name, value) = text.split_once(':').ok_or_else(|| malformed("missing colon"))?;
        let name = name.trim_end();

        if name.is_empty() {
            return Err(malformed("empty field name"));
        }

        self.paragraph.set_field_from_string(
            Cow::Owned(name.to_string()),
            Cow::Owned(value.trim_start_matches([' ', '\t']).trim_end().to_string()),
        );

        Ok(())
    }
}

/// Reads [ControlParagraph] from a [BufRead], one per iteration.
pub struct ControlParagraphReader<R: BufRead> {
    reader: R,
    parser: Option<ControlFileParser>,
}

impl<R: BufRead> ControlParagraphReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: Some(ControlFileParser::default()),
        }
    }

    /// Consumes the instance, returning the original reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_paragraph(&mut self) -> Result<Option<ControlParagraph<'static>>> {
        let parser = match self.parser.as_mut() {
            Some(parser) => parser,
            None => return Ok(None),
        };

        let mut line = String::new();

        loop {
            line.clear();

            if self.reader.read_line(&mut line)? == 0 {
                return match self.parser.take() {
                    Some(parser) => parser.finish(),
                    None => Ok(None),
                };
            }

            if let Some(paragraph) = parser.write_line(&line)? {
                return Ok(Some(paragraph));
            }
        }
    }
}

impl<R: BufRead> Iterator for ControlParagraphReader<R> {
    type Item = Result<ControlParagraph<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_paragraph().transpose()
    }
}

/// A parsed control file: an ordered series of paragraphs.
#[derive(Clone, Debug, Default)]
pub struct ControlFile<'a> {
    paragraphs: Vec<ControlParagraph<'a>>,
}

impl<'a> ControlFile<'a> {
    pub fn parse_reader<R: BufRead>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            paragraphs: ControlParagraphReader::new(reader).collect::<Result<Vec<_>>>()?,
        })
    }

    pub fn parse_str(s: &str) -> Result<Self> {
        Self::parse_reader(&mut s.as_bytes())
    }

    pub fn add_paragraph(&mut self, p: ControlParagraph<'a>) {
        self.paragraphs.push(p);
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &ControlParagraph<'a>> {
        self.paragraphs.iter()
    }

    pub fn into_paragraphs(self) -> impl Iterator<Item = ControlParagraph<'a>> {
        self.paragraphs.into_iter()
    }

    /// Serialize all paragraphs, separated by blank lines.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (i, p) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                writer.write_all(b"\n")?;
            }
            p.write(writer)?;
        }

        Ok(())
    }
}
