//! JSON text rendering policies: indentation and ASCII escaping.
//!
//! Rendering goes through one formatter that layers the two write-time
//! policies onto serde_json: an optional pretty-printer with a
//! caller-chosen indent width, and an optional escape pass that keeps the
//! output pure ASCII by emitting `\uXXXX` sequences (surrogate pairs for
//! astral characters, the JSON-standard encoding).

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;

use crate::error::AppError;

/// Renders a JSON value to bytes, honoring the indent and escape policies.
pub(crate) fn render(value: &Value, indent: Option<usize>, ensure_ascii: bool) -> Result<Vec<u8>, AppError> {
    let indent_str = indent.map(|width| " ".repeat(width));
    let formatter = PolicyFormatter {
        pretty: indent_str.as_deref().map(|s| PrettyFormatter::with_indent(s.as_bytes())),
        ensure_ascii,
    };

    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

struct PolicyFormatter<'a> {
    pretty: Option<PrettyFormatter<'a>>,
    ensure_ascii: bool,
}

// Structural methods delegate to the pretty formatter when an indent width
// was configured, and to compact defaults otherwise. Only string fragments
// get the extra escape treatment.
impl Formatter for PolicyFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.begin_array(writer),
            None => CompactFormatter.begin_array(writer),
        }
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.end_array(writer),
            None => CompactFormatter.end_array(writer),
        }
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.begin_array_value(writer, first),
            None => CompactFormatter.begin_array_value(writer, first),
        }
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.end_array_value(writer),
            None => CompactFormatter.end_array_value(writer),
        }
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.begin_object(writer),
            None => CompactFormatter.begin_object(writer),
        }
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.end_object(writer),
            None => CompactFormatter.end_object(writer),
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.begin_object_key(writer, first),
            None => CompactFormatter.begin_object_key(writer, first),
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.begin_object_value(writer),
            None => CompactFormatter.begin_object_value(writer),
        }
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        match &mut self.pretty {
            Some(pretty) => pretty.end_object_value(writer),
            None => CompactFormatter.end_object_value(writer),
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if !self.ensure_ascii {
            return writer.write_all(fragment.as_bytes());
        }

        // serde_json handles mandatory escapes (quotes, control chars)
        // separately, so fragments only ever need the non-ASCII pass.
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for &unit in c.encode_utf16(&mut units).iter() {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
