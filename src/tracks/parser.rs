use super::{
    SignedSource, TrackExpression, MAX_SOURCE_TRACKS, MAX_TRACK_ITEMS, MAX_TRACK_NAME_LEN,
};
use crate::error::{Result, StemError};

/// Parses a comma separated track list.
///
/// ```text
/// list := item (',' item)*
/// item := name ('=' ['+'|'-'] name (('+'|'-') name)*)?
/// name := [A-Za-z0-9_]{1,99}
/// ```
///
/// The whole string must match. An empty string yields an empty list.
pub fn parse_track_list(text: &str) -> Result<Vec<TrackExpression>> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut items = Vec::new();

    if text.is_empty() {
        return Ok(items);
    }

    loop {
        if items.len() >= MAX_TRACK_ITEMS {
            return Err(StemError::parse(
                cursor.pos,
                format!("more than {MAX_TRACK_ITEMS} tracks"),
            ));
        }

        let output_name = cursor.name()?;
        let mut item = TrackExpression::passthrough(output_name);

        match cursor.peek() {
            None => {
                items.push(item);
                break;
            }
            Some(',') => {
                cursor.bump();
                items.push(item);
                continue;
            }
            Some('=') => {
                cursor.bump();
                if cursor.at_end() {
                    return Err(StemError::parse(cursor.pos, "empty expression after '='"));
                }
                item.sources = cursor.sources()?;
                items.push(item);
                match cursor.peek() {
                    None => break,
                    // sources() stops only at the end or on a consumed ','
                    Some(_) => continue,
                }
            }
            Some(c) => {
                return Err(StemError::parse(
                    cursor.pos,
                    format!("unexpected character '{c}'"),
                ))
            }
        }
    }

    Ok(items)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn name(&mut self) -> Result<String> {
        let rest = &self.text[self.pos..];
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();

        if len == 0 {
            let reason = match self.peek() {
                None => "expected track name, found end of input".to_string(),
                Some(c) => format!("expected track name, found '{c}'"),
            };
            return Err(StemError::parse(self.pos, reason));
        }
        if len > MAX_TRACK_NAME_LEN {
            return Err(StemError::parse(
                self.pos,
                format!("track name longer than {MAX_TRACK_NAME_LEN} characters"),
            ));
        }

        self.pos += len;
        Ok(rest[..len].to_string())
    }

    /// Parses the right-hand side of `=`, consuming a trailing ',' if present.
    fn sources(&mut self) -> Result<Vec<SignedSource>> {
        let mut sources = Vec::new();

        loop {
            if sources.len() >= MAX_SOURCE_TRACKS {
                return Err(StemError::parse(
                    self.pos,
                    format!("more than {MAX_SOURCE_TRACKS} source tracks"),
                ));
            }

            let subtract = match self.peek() {
                Some('-') => {
                    self.bump();
                    true
                }
                Some('+') => {
                    self.bump();
                    false
                }
                _ => false,
            };
            if self.at_end() {
                return Err(StemError::parse(self.pos, "sign without a track name"));
            }

            let name = self.name()?;
            sources.push(SignedSource { name, subtract });

            match self.peek() {
                None => return Ok(sources),
                Some(',') => {
                    self.bump();
                    if self.at_end() {
                        return Err(StemError::parse(
                            self.pos,
                            "expected track name, found end of input",
                        ));
                    }
                    return Ok(sources);
                }
                Some('+') | Some('-') => continue,
                Some(c) => {
                    return Err(StemError::parse(
                        self.pos,
                        format!("unexpected character '{c}'"),
                    ))
                }
            }
        }
    }
}
