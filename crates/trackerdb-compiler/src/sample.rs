//! Example-string generation for regular expressions
//!
//! Walks the parsed HIR and writes the simplest string the expression
//! matches: the minimum number of repetitions, the first alternative, and a
//! URL-friendly member of every character class. Zero-width assertions
//! write nothing. The output is fully determined by the pattern.

use regex_syntax::hir::{Class, ClassBytes, ClassUnicode, Hir, HirKind, Literal};
use regex_syntax::Parser;

/// Class members tried first, in order.
const PREFERRED_CHARS: [char; 3] = ['a', '0', '-'];

/// Produce a string that `pattern` matches.
pub fn sample_match(pattern: &str) -> Result<String, regex_syntax::Error> {
    let hir = Parser::new().parse(pattern)?;
    let mut out = Vec::with_capacity(pattern.len());
    write_sample(&hir, &mut out);
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn write_sample(hir: &Hir, out: &mut Vec<u8>) {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(Literal(bytes)) => out.extend_from_slice(bytes),
        HirKind::Class(Class::Unicode(class)) => {
            if let Some(ch) = pick_char(class) {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
        }
        HirKind::Class(Class::Bytes(class)) => {
            if let Some(b) = pick_byte(class) {
                out.push(b);
            }
        }
        HirKind::Repetition(rep) => {
            for _ in 0..rep.min {
                write_sample(&rep.sub, out);
            }
        }
        HirKind::Capture(cap) => write_sample(&cap.sub, out),
        HirKind::Concat(subs) => {
            for sub in subs {
                write_sample(sub, out);
            }
        }
        HirKind::Alternation(subs) => {
            if let Some(first) = subs.first() {
                write_sample(first, out);
            }
        }
    }
}

fn pick_char(class: &ClassUnicode) -> Option<char> {
    let ranges = class.ranges();
    PREFERRED_CHARS
        .iter()
        .copied()
        .find(|&c| ranges.iter().any(|r| r.start() <= c && c <= r.end()))
        .or_else(|| ranges.iter().find(|r| r.end() > ' ').map(|r| r.start().max('!')))
        .or_else(|| ranges.first().map(|r| r.start()))
}

fn pick_byte(class: &ClassBytes) -> Option<u8> {
    let ranges = class.ranges();
    PREFERRED_CHARS
        .iter()
        .map(|&c| c as u8)
        .find(|&b| ranges.iter().any(|r| r.start() <= b && b <= r.end()))
        .or_else(|| ranges.iter().find(|r| r.end() > b' ').map(|r| r.start().max(b'!')))
        .or_else(|| ranges.first().map(|r| r.start()))
}
